//! Domain error types
//!
//! These errors represent chat state machine failures, distinct from the
//! transport errors raised by the backend client. None of them is fatal:
//! every failure path returns the state machine to a known-good idle or
//! terminal state.

use thiserror::Error;

/// Errors surfaced by chat operations
#[derive(Debug, Error)]
pub enum ChatError {
    /// Submitted prompt was empty after trimming
    #[error("Cannot submit an empty prompt")]
    EmptyQuery,

    /// Another submit or switch is already in progress
    #[error("Another operation is in progress")]
    Busy,

    /// Query submission failed; the optimistic turn was marked as an error
    #[error("Submission failed: {0}")]
    Submission(String),

    /// A status poll failed; the in-progress turn was marked as an error
    #[error("Status poll failed: {0}")]
    Poll(String),

    /// Initial session directory fetch failed; blocking for the UI
    #[error("Failed to load the session list: {0}")]
    DirectoryLoad(String),

    /// Loading a stored session failed; the current view is unchanged
    #[error("Failed to load session {id}: {reason}")]
    SessionLoad { id: String, reason: String },
}
