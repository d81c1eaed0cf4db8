use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atelier_cli::chat::ChatController;
use atelier_cli::client::HttpAgentClient;
use atelier_cli::config::Config;
use atelier_cli::repl;

#[derive(Parser)]
#[command(name = "atelier")]
#[command(author, version, about = "Atelier - chat client for a building-design agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat with the design agent
    Chat {
        /// Initial message to send
        message: Option<String>,

        /// Agent service base URL (overrides config)
        #[arg(long)]
        server: Option<String>,
    },

    /// List stored sessions
    Sessions {
        /// Agent service base URL (overrides config)
        #[arg(long)]
        server: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "atelier_cli=debug"
    } else {
        "atelier_cli=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load().unwrap_or_default();

    match cli.command {
        Commands::Chat { message, server } => {
            if let Some(server) = server {
                config.server.base_url = server;
            }
            let backend = Arc::new(HttpAgentClient::new(
                &config.server.base_url,
                config.request_timeout(),
            )?);
            let controller = ChatController::new(backend, config.poll_interval());
            repl::run(controller, message).await
        }
        Commands::Sessions { server } => {
            if let Some(server) = server {
                config.server.base_url = server;
            }
            let backend = Arc::new(HttpAgentClient::new(
                &config.server.base_url,
                config.request_timeout(),
            )?);
            let controller = ChatController::new(backend, config.poll_interval());
            let sessions = controller.load_directory().await?;
            if sessions.is_empty() {
                println!("No stored sessions.");
            }
            for session in sessions {
                println!(
                    "{}  {}  {}",
                    session.id,
                    session.created_at.format("%Y-%m-%d %H:%M"),
                    session.first_query
                );
            }
            Ok(())
        }
    }
}
