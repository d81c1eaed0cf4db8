//! Interactive terminal chat loop
//!
//! Line-oriented front end over [`ChatController`]: submits each prompt,
//! blocks until the turn reaches a terminal status, and prints the final
//! answer plus any scheme names. Slash commands cover the session
//! directory, switching, and starting over. Rendering of scheme geometry
//! is out of scope here; only the names are shown.

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::chat::ChatController;
use crate::core::types::{AgentStatus, Message, SessionSummary};

pub async fn run(controller: ChatController, initial_message: Option<String>) -> Result<()> {
    let directory = controller
        .load_directory()
        .await
        .context("The session list could not be loaded; is the agent service running?")?;

    println!("{}", "atelier - building design assistant".bold());
    println!(
        "{} stored session(s). Commands: /sessions /switch <id> /new /quit",
        directory.len()
    );

    if let Some(message) = initial_message {
        submit_and_wait(&controller, &message).await;
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("{} ", "you>".green().bold());
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        match line.split_once(' ').map_or((line.as_str(), ""), |(a, b)| (a, b)) {
            ("/quit", _) | ("/exit", _) => break,
            ("/new", _) => {
                controller.new_conversation().await;
                println!("Started a new conversation.");
            }
            ("/sessions", _) => match controller.load_directory().await {
                Ok(sessions) => print_directory(&sessions),
                Err(err) => eprintln!("{}", err.to_string().red()),
            },
            ("/switch", id) if !id.trim().is_empty() => {
                match controller.switch_session(id.trim()).await {
                    Ok(()) => {
                        let state = controller.snapshot().await;
                        println!("Switched to session {}", id.trim().bold());
                        for turn in &state.history {
                            println!("{}", render_turn(turn));
                        }
                        if !state.schemes.is_empty() {
                            print_schemes(&controller).await;
                        }
                    }
                    Err(err) => eprintln!("{}", err.to_string().red()),
                }
            }
            ("/switch", _) => eprintln!("{}", "Usage: /switch <session-id>".red()),
            _ => submit_and_wait(&controller, &line).await,
        }
    }

    Ok(())
}

async fn submit_and_wait(controller: &ChatController, message: &str) {
    if let Err(err) = controller.submit_query(message).await {
        eprintln!("{}", err.to_string().red());
        return;
    }

    println!("{}", "working...".dimmed());
    controller.wait_until_idle().await;

    let state = controller.snapshot().await;
    match state.active_turn() {
        Some(Message::AgentInProgress {
            status: AgentStatus::Completed,
            final_answer,
            ..
        }) => {
            println!(
                "{} {}",
                "agent>".blue().bold(),
                final_answer.as_deref().unwrap_or("(no answer)")
            );
            print_schemes(controller).await;
        }
        Some(Message::AgentInProgress {
            status: AgentStatus::Error,
            final_answer,
            ..
        }) => {
            eprintln!(
                "{} {}",
                "agent error:".red().bold(),
                final_answer.as_deref().unwrap_or("unknown failure")
            );
        }
        _ => {}
    }
}

async fn print_schemes(controller: &ChatController) {
    let state = controller.snapshot().await;
    if state.schemes.is_empty() {
        return;
    }
    let names: Vec<&str> = state
        .schemes
        .iter()
        .map(|scheme| scheme.name.as_str())
        .collect();
    println!("{} {}", "schemes:".cyan(), names.join(", "));
}

fn print_directory(sessions: &[SessionSummary]) {
    if sessions.is_empty() {
        println!("No stored sessions yet.");
        return;
    }
    for session in sessions {
        println!(
            "{}  {}  {}",
            session.id.bold(),
            session.created_at.format("%Y-%m-%d %H:%M"),
            session.first_query
        );
    }
}

fn render_turn(turn: &Message) -> String {
    match turn {
        Message::Human { content } => format!("{} {}", "you>".green().bold(), content),
        Message::HistoricalAgent { content } => {
            format!("{} {}", "agent>".blue().bold(), content)
        }
        Message::AgentInProgress {
            status,
            final_answer,
            ..
        } => format!(
            "{} [{:?}] {}",
            "agent>".blue().bold(),
            status,
            final_answer.as_deref().unwrap_or("...")
        ),
    }
}
