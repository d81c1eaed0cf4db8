//! Core domain types shared across the chat client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status of an agent turn as reported by the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Running,
    Completed,
    Error,
}

impl AgentStatus {
    /// Terminal statuses end polling for the turn
    pub fn is_terminal(self) -> bool {
        matches!(self, AgentStatus::Completed | AgentStatus::Error)
    }
}

/// One conversation turn
///
/// The history holds at most one `AgentInProgress` turn at a time, and while
/// its status is `Running` it is always the last element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Text authored by the user
    Human { content: String },

    /// The live agent turn, updated by each successful poll until terminal
    AgentInProgress {
        /// Server-assigned session id; `None` until the first submission
        /// for a new conversation has been acknowledged
        session_id: Option<String>,
        status: AgentStatus,
        /// Open-ended map of tool/intermediate outputs
        results: Map<String, Value>,
        /// Present only once status leaves `Running`
        final_answer: Option<String>,
    },

    /// A previously completed agent turn loaded from server storage
    HistoricalAgent { content: String },
}

impl Message {
    pub fn human(content: impl Into<String>) -> Self {
        Message::Human {
            content: content.into(),
        }
    }

    /// Fresh optimistic placeholder for a just-submitted query
    pub fn agent_placeholder(session_id: Option<String>) -> Self {
        Message::AgentInProgress {
            session_id,
            status: AgentStatus::Running,
            results: Map::new(),
            final_answer: None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, Message::AgentInProgress { .. })
    }
}

/// A named geometric design artifact produced by the agent
///
/// The payload is opaque to the client; only the name is interpreted, and
/// entries arriving without one get a positional default label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scheme {
    pub name: String,
    pub payload: Value,
}

/// Directory entry for a stored session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub first_query: String,
    #[serde(default)]
    pub last_agent_response: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One stored turn as returned by a session-load fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// `"human"` or `"ai"` on the wire
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

/// Payload of a status poll or full session load
///
/// Intermediate polls may omit any of the optional fields; session-load
/// fetches carry the complete `chat_history` and `schemes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub status: AgentStatus,
    #[serde(default)]
    pub results: Map<String, Value>,
    #[serde(default)]
    pub final_answer: Option<String>,
    #[serde(default)]
    pub schemes: Option<Vec<Value>>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub chat_history: Option<Vec<ChatTurn>>,
}

impl SessionStatus {
    /// The answer text to show for this turn
    ///
    /// Failed turns report the server's error string when one is present;
    /// the service leaves `final_answer` null on failures.
    pub fn display_answer(&self) -> Option<String> {
        if self.status == AgentStatus::Error {
            self.error.clone().or_else(|| self.final_answer.clone())
        } else {
            self.final_answer.clone()
        }
    }
}
