//! Interval polling for an in-progress agent turn
//!
//! One poller exists per armed session. The task fetches the session
//! status once per interval and applies it through
//! [`ChatState::apply_poll`], which owns the stale-result guard. The loop
//! ends on its own when the turn reaches a terminal status, when a poll
//! fails, or when the state guard reports the session was switched away;
//! [`PollHandle::stop`] aborts it from outside. A dropped handle also
//! aborts, so a poller cannot outlive the controller that armed it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::client::AgentBackend;
use crate::core::ChatError;

use super::state::ChatState;

/// Handle to a running poll task
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stop the poll task. Idempotent; safe to call at any point.
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Arm a poller for `session_id`.
///
/// The first fetch happens one full interval after arming. A slow
/// round-trip delays the next tick instead of letting ticks stack up
/// behind it.
pub fn spawn(
    state: Arc<Mutex<ChatState>>,
    backend: Arc<dyn AgentBackend>,
    session_id: String,
    interval: Duration,
) -> PollHandle {
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a fresh interval resolves immediately; consume
        // it so polls are spaced one interval apart from arming.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match backend.fetch_status(&session_id).await {
                Ok(poll) => {
                    let mut state = state.lock().await;
                    match state.apply_poll(&session_id, &poll) {
                        Some(status) if status.is_terminal() => {
                            tracing::debug!(
                                "Session {} reached terminal status {:?}",
                                session_id,
                                status
                            );
                            break;
                        }
                        Some(_) => {}
                        // Switched away or disarmed while the fetch was in
                        // flight; the result was discarded.
                        None => break,
                    }
                }
                Err(err) => {
                    let err = ChatError::Poll(err.to_string());
                    tracing::warn!("Poll for session {} failed: {}", session_id, err);
                    let mut state = state.lock().await;
                    if state.polling && state.session_id.as_deref() == Some(session_id.as_str()) {
                        state.fail_active_turn(&err.to_string());
                    }
                    break;
                }
            }
        }
    });

    PollHandle { task }
}
