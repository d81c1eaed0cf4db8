//! Session directory sync
//!
//! The cached directory is only ever replaced wholesale with the server's
//! current list; there is no delta protocol. Two triggers exist: the
//! initial load, whose failure blocks the UI, and the refresh after a
//! submission created a brand-new session, whose failure is only logged.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::client::AgentBackend;
use crate::core::types::SessionSummary;
use crate::core::ChatError;

use super::state::ChatState;

/// Fetch the full directory and replace the cache. Blocking: without a
/// known-good directory the session list cannot be shown at all.
pub async fn load_initial(
    backend: &dyn AgentBackend,
    state: &Mutex<ChatState>,
) -> Result<Vec<SessionSummary>, ChatError> {
    let sessions = backend
        .list_sessions()
        .await
        .map_err(|err| ChatError::DirectoryLoad(err.to_string()))?;
    let mut state = state.lock().await;
    state.directory = sessions.clone();
    Ok(sessions)
}

/// Refresh the directory after a submission produced a new session id.
///
/// Runs in the background; a failure leaves the cache momentarily stale
/// but the new session itself stays fully usable.
pub fn refresh_after_create(backend: Arc<dyn AgentBackend>, state: Arc<Mutex<ChatState>>) {
    tokio::spawn(async move {
        match backend.list_sessions().await {
            Ok(sessions) => {
                let mut state = state.lock().await;
                state.directory = sessions;
            }
            Err(err) => {
                tracing::warn!("Session directory refresh failed: {}", err);
            }
        }
    });
}
