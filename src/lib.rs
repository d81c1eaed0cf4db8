//! atelier: terminal chat client for a remote building-design agent
//!
//! This library provides:
//! - A session state machine that submits prompts, polls the agent's
//!   progress, and reconciles updates into an append-only history
//! - Session switching with safe cancellation of the previous session's
//!   polling
//! - A cached session directory kept consistent with session creation
//! - An HTTP backend client for the agent service, behind a trait so tests
//!   can script it

pub mod chat;
pub mod client;
pub mod config;
pub mod core;
pub mod repl;

pub use chat::{ChatController, ChatState};
pub use client::{AgentBackend, BackendError, HttpAgentClient};
pub use config::Config;
pub use core::ChatError;
