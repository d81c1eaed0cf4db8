//! HTTP client for the remote agent service
//!
//! The service exposes three endpoints:
//! - `POST /query` submits a prompt (optionally continuing a session) and
//!   returns the session id; the agent keeps working in the background.
//! - `GET /session/{id}` reports the session's current status; the same
//!   endpoint returns the full stored history and schemes, which is what a
//!   session switch loads.
//! - `GET /sessions` lists stored session summaries.
//!
//! [`AgentBackend`] is the seam between the state machine and the wire:
//! tests inject scripted implementations instead of spinning up a server.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{SessionStatus, SessionSummary};

/// Transport-level failures talking to the agent service
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },
}

/// Remote agent service interface
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Fetch the full session directory
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, BackendError>;

    /// Submit a prompt, returning the (possibly newly assigned) session id
    async fn submit_query(
        &self,
        query: &str,
        session_id: Option<&str>,
    ) -> Result<String, BackendError>;

    /// Fetch the current status of a session
    ///
    /// Used both for interval polling and for full session loads; the
    /// server includes `chat_history` and complete `schemes` in either case
    /// once they exist.
    async fn fetch_status(&self, session_id: &str) -> Result<SessionStatus, BackendError>;
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    session_id: String,
}

/// reqwest-backed implementation of [`AgentBackend`]
pub struct HttpAgentClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAgentClient {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(BackendError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl AgentBackend for HttpAgentClient {
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, BackendError> {
        let url = format!("{}/sessions", self.base_url);
        let response = Self::check(self.http.get(&url).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn submit_query(
        &self,
        query: &str,
        session_id: Option<&str>,
    ) -> Result<String, BackendError> {
        let url = format!("{}/query", self.base_url);
        let body = QueryRequest { query, session_id };
        let response = Self::check(self.http.post(&url).json(&body).send().await?).await?;
        let parsed: QueryResponse = response.json().await?;
        tracing::debug!("Query accepted for session {}", parsed.session_id);
        Ok(parsed.session_id)
    }

    async fn fetch_status(&self, session_id: &str) -> Result<SessionStatus, BackendError> {
        let url = format!("{}/session/{}", self.base_url, session_id);
        let response = Self::check(self.http.get(&url).send().await?).await?;
        Ok(response.json().await?)
    }
}
