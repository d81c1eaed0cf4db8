//! Top-level session state machine
//!
//! [`ChatController`] owns the shared [`ChatState`], the backend handle,
//! and the currently armed poller. It serializes submit/switch through the
//! state's busy flag and guarantees that switching away from a session
//! disarms its poller before anything else happens.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::client::AgentBackend;
use crate::core::types::SessionSummary;
use crate::core::ChatError;

use super::directory;
use super::poller::{self, PollHandle};
use super::state::ChatState;

pub struct ChatController {
    backend: Arc<dyn AgentBackend>,
    state: Arc<Mutex<ChatState>>,
    poll_interval: Duration,
    poll_handle: Mutex<Option<PollHandle>>,
}

impl ChatController {
    pub fn new(backend: Arc<dyn AgentBackend>, poll_interval: Duration) -> Self {
        Self {
            backend,
            state: Arc::new(Mutex::new(ChatState::new())),
            poll_interval,
            poll_handle: Mutex::new(None),
        }
    }

    /// Snapshot of the current state for rendering. History clones are
    /// cheap; the turns themselves are shared.
    pub async fn snapshot(&self) -> ChatState {
        self.state.lock().await.clone()
    }

    pub async fn is_busy(&self) -> bool {
        self.state.lock().await.busy
    }

    /// Initial directory load. Failure here is blocking for the UI.
    pub async fn load_directory(&self) -> Result<Vec<SessionSummary>, ChatError> {
        directory::load_initial(self.backend.as_ref(), &self.state).await
    }

    /// Submit a prompt for the current conversation.
    ///
    /// Optimistically appends the human turn and a running placeholder
    /// (replacing the whole history when this is a brand-new conversation),
    /// sends the query, then arms the poller. A brand-new session id also
    /// triggers a background directory refresh. On submission failure the
    /// placeholder is converted to a terminal error turn and no polling
    /// starts; the user may simply resubmit.
    pub async fn submit_query(&self, text: &str) -> Result<(), ChatError> {
        let session_id = {
            let mut state = self.state.lock().await;
            state.begin_submission(text)?;
            state.session_id.clone()
        };

        match self
            .backend
            .submit_query(text.trim(), session_id.as_deref())
            .await
        {
            Ok(returned_id) => {
                let first = {
                    let mut state = self.state.lock().await;
                    state.record_session(&returned_id)
                };
                if first {
                    directory::refresh_after_create(
                        Arc::clone(&self.backend),
                        Arc::clone(&self.state),
                    );
                }

                let handle = poller::spawn(
                    Arc::clone(&self.state),
                    Arc::clone(&self.backend),
                    returned_id,
                    self.poll_interval,
                );
                // Replacing the slot drops (and thereby aborts) any
                // finished or superseded poller.
                *self.poll_handle.lock().await = Some(handle);
                Ok(())
            }
            Err(err) => {
                let err = ChatError::Submission(err.to_string());
                self.state.lock().await.fail_active_turn(&err.to_string());
                Err(err)
            }
        }
    }

    /// Switch the view to a stored session.
    ///
    /// Rejected while a submit or another switch is mid-flight. An armed
    /// poller does not block the switch: it is disarmed first, so the old
    /// session's timer cannot fire again, and any poll already in flight is
    /// discarded by the state guard when it resolves. The busy flag is
    /// released on every exit path; a load failure surfaces as an error
    /// without touching the current view.
    pub async fn switch_session(&self, target_id: &str) -> Result<(), ChatError> {
        {
            let mut state = self.state.lock().await;
            if state.switch_blocked() {
                return Err(ChatError::Busy);
            }
            state.polling = false;
            state.busy = true;
        }
        self.stop_polling().await;

        let result = self.backend.fetch_status(target_id).await;

        let mut state = self.state.lock().await;
        state.busy = false;
        match result {
            Ok(loaded) => {
                state.install_loaded_session(target_id, &loaded);
                Ok(())
            }
            Err(err) => Err(ChatError::SessionLoad {
                id: target_id.to_string(),
                reason: err.to_string(),
            }),
        }
    }

    /// Reset to a blank conversation. Never fails and has no network
    /// effect.
    pub async fn new_conversation(&self) {
        {
            let mut state = self.state.lock().await;
            state.reset_conversation();
        }
        self.stop_polling().await;
    }

    /// Wait for the active turn to finish (or fail). Intended for
    /// line-oriented front ends that block between prompts.
    pub async fn wait_until_idle(&self) {
        let nap = (self.poll_interval / 4).max(Duration::from_millis(10));
        loop {
            if !self.state.lock().await.busy {
                return;
            }
            tokio::time::sleep(nap).await;
        }
    }

    async fn stop_polling(&self) {
        if let Some(handle) = self.poll_handle.lock().await.take() {
            handle.stop();
        }
    }
}
