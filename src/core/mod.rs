//! Domain layer: conversation types, history reconciliation, and errors

pub mod errors;
pub mod history;
pub mod types;

pub use errors::ChatError;
pub use history::{history_from_turns, label_schemes, reconcile, History};
pub use types::{AgentStatus, ChatTurn, Message, Scheme, SessionStatus, SessionSummary};
