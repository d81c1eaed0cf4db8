//! Chat state machine context
//!
//! All mutable client state lives in one [`ChatState`] value: the active
//! session id, the conversation history, the current scheme set, the
//! busy/polling flags, and the cached session directory. Every transition
//! is a synchronous method, so each one is atomic with respect to the
//! others once the caller holds the state lock.
//!
//! Flag semantics:
//! - `busy` is the input lock. It is set from the moment a query is
//!   submitted until the turn reaches a terminal status, and while a
//!   session switch is loading. New submissions are rejected while it is
//!   set.
//! - `polling` marks that an interval poller is armed for `session_id`.
//!   A switch is allowed while `busy` is held only by an in-progress turn
//!   (`polling` set); it disarms polling before doing anything else so the
//!   old session's timer can never fire again.

use std::sync::Arc;

use crate::core::history::{self, History};
use crate::core::types::{AgentStatus, Message, Scheme, SessionStatus, SessionSummary};
use crate::core::ChatError;

#[derive(Debug, Clone, Default)]
pub struct ChatState {
    /// Server-assigned id of the active session; `None` means a new
    /// conversation that has not been submitted yet
    pub session_id: Option<String>,
    /// Ordered conversation turns for the current session view
    pub history: History,
    /// Visualization artifacts from the latest poll that carried any
    pub schemes: Vec<Scheme>,
    /// Input lock; see module docs
    pub busy: bool,
    /// Whether an interval poller is armed for `session_id`
    pub polling: bool,
    /// Cached session directory, replaced wholesale on every sync
    pub directory: Vec<SessionSummary>,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when a switch must be rejected: a submit or another switch is
    /// mid-flight. An armed poller alone does not block switching.
    pub fn switch_blocked(&self) -> bool {
        self.busy && !self.polling
    }

    /// The trailing in-progress agent turn, if any
    pub fn active_turn(&self) -> Option<&Message> {
        self.history
            .last()
            .map(|turn| turn.as_ref())
            .filter(|turn| turn.is_in_progress())
    }

    /// Optimistically record a submitted query.
    ///
    /// Appends a human turn and a running placeholder. When no session id
    /// exists yet this is a brand-new conversation: the whole history is
    /// replaced with exactly those two turns and the scheme set is cleared,
    /// so stale turns from an earlier view cannot resurface.
    pub fn begin_submission(&mut self, text: &str) -> Result<(), ChatError> {
        if self.busy {
            return Err(ChatError::Busy);
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ChatError::EmptyQuery);
        }

        let human = Arc::new(Message::human(trimmed));
        let placeholder = Arc::new(Message::agent_placeholder(self.session_id.clone()));

        if self.session_id.is_none() {
            self.history = vec![human, placeholder];
            self.schemes.clear();
        } else {
            self.history.push(human);
            self.history.push(placeholder);
        }

        self.busy = true;
        Ok(())
    }

    /// Record the session id returned by a successful submission and arm
    /// polling. Returns true when this was the first id for the
    /// conversation, which is the trigger for a directory refresh.
    pub fn record_session(&mut self, session_id: &str) -> bool {
        let first = self.session_id.is_none();
        self.session_id = Some(session_id.to_string());

        // Stamp the optimistic placeholder so poll results can be matched
        // against it.
        if let Some(last) = self.history.last() {
            if let Message::AgentInProgress {
                status,
                results,
                final_answer,
                ..
            } = last.as_ref()
            {
                let stamped = Message::AgentInProgress {
                    session_id: Some(session_id.to_string()),
                    status: *status,
                    results: results.clone(),
                    final_answer: final_answer.clone(),
                };
                let index = self.history.len() - 1;
                self.history[index] = Arc::new(stamped);
            }
        }

        self.polling = true;
        first
    }

    /// Terminate the trailing in-progress turn with an error message and
    /// return the state machine to idle. Used for submission failures and
    /// poll transport failures alike.
    pub fn fail_active_turn(&mut self, message: &str) {
        if let Some(last) = self.history.last() {
            if let Message::AgentInProgress {
                session_id,
                results,
                ..
            } = last.as_ref()
            {
                let failed = Message::AgentInProgress {
                    session_id: session_id.clone(),
                    status: AgentStatus::Error,
                    results: results.clone(),
                    final_answer: Some(message.to_string()),
                };
                let index = self.history.len() - 1;
                self.history[index] = Arc::new(failed);
            }
        }
        self.polling = false;
        self.busy = false;
    }

    /// Apply a resolved poll to the state.
    ///
    /// The stale-poll guard lives here: the result is dropped unless
    /// polling is still armed and the polled session id still equals the
    /// active one, so a poll that resolves after a switch or reset cannot
    /// touch the new view. Returns the applied status, or `None` when the
    /// result was discarded.
    pub fn apply_poll(&mut self, session_id: &str, poll: &SessionStatus) -> Option<AgentStatus> {
        if !self.polling || self.session_id.as_deref() != Some(session_id) {
            tracing::debug!("Discarding stale poll result for session {}", session_id);
            return None;
        }

        if let Some(next) = history::reconcile(&self.history, session_id, poll) {
            self.history = next;
        }
        if let Some(raw) = &poll.schemes {
            self.schemes = history::label_schemes(raw);
        }

        if poll.status.is_terminal() {
            self.polling = false;
            self.busy = false;
        }
        Some(poll.status)
    }

    /// Replace the view with a stored session's history and schemes
    pub fn install_loaded_session(&mut self, session_id: &str, loaded: &SessionStatus) {
        self.session_id = Some(session_id.to_string());
        self.history = history::history_from_turns(loaded.chat_history.as_deref().unwrap_or(&[]));
        self.schemes = history::label_schemes(loaded.schemes.as_deref().unwrap_or(&[]));
    }

    /// Reset to a blank conversation. The cached directory is kept; it
    /// describes the server, not the current view.
    pub fn reset_conversation(&mut self) {
        self.session_id = None;
        self.history.clear();
        self.schemes.clear();
        self.busy = false;
        self.polling = false;
    }
}
