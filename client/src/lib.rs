//! Client for the remote analysis service.
//!
//! The service executes one opaque command string and answers with the
//! result lines:
//!
//! ```text
//! POST /analyze            {"command": "<raw input>"}
//! 200 OK                   {"results": ["line", "line", ...]}
//! ```
//!
//! The console never interprets the command or the lines. Exactly one
//! request is sent per submission; there are no retries.
//!
//! [`AnalysisService`] is the seam the engine talks to, so tests can swap in
//! a scripted service without a network.

use std::time::Duration;

use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use reqwest::redirect::Policy;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub use reqwest::StatusCode;
pub use url;

/// Default endpoint of a locally running analysis service.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/analyze";

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Error bodies are only logged; reading stops once this much is buffered.
const MAX_ERROR_BODY_BYTES: usize = 4 * 1024;

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    command: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    results: Vec<String>,
}

#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// The service answered with a non-2xx status.
    #[error("network or server response error (HTTP {status})")]
    Status { status: StatusCode, body: String },
    /// The request never produced a response (connect, timeout, IO).
    #[error("{0}")]
    Transport(#[source] reqwest::Error),
    /// 2xx response whose body is not `{"results": [string, ...]}`.
    #[error("malformed response body: {0}")]
    MalformedBody(String),
}

/// Something that can run a command and return its result lines.
pub trait AnalysisService: Send + Sync {
    fn analyze(&self, command: String) -> BoxFuture<'static, Result<Vec<String>, AnalyzeError>>;
}

/// HTTP implementation of [`AnalysisService`].
#[derive(Debug, Clone)]
pub struct AnalyzeClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl AnalyzeClient {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(timeout)
            .redirect(Policy::none())
            .build()?;
        Ok(Self { http, endpoint })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send `command` verbatim and collect the result lines.
    pub async fn send(&self, command: &str) -> Result<Vec<String>, AnalyzeError> {
        tracing::debug!(endpoint = %self.endpoint, bytes = command.len(), "Submitting command");

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&AnalyzeRequest { command })
            .send()
            .await
            .map_err(AnalyzeError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(response).await;
            tracing::warn!(%status, body = %body, "Analysis service returned an error status");
            return Err(AnalyzeError::Status { status, body });
        }

        let bytes = response.bytes().await.map_err(AnalyzeError::Transport)?;
        parse_results(&bytes)
    }
}

impl AnalysisService for AnalyzeClient {
    fn analyze(&self, command: String) -> BoxFuture<'static, Result<Vec<String>, AnalyzeError>> {
        let client = self.clone();
        Box::pin(async move { client.send(&command).await })
    }
}

fn parse_results(bytes: &[u8]) -> Result<Vec<String>, AnalyzeError> {
    match serde_json::from_slice::<AnalyzeResponse>(bytes) {
        Ok(parsed) => {
            tracing::debug!(lines = parsed.results.len(), "Analysis completed");
            Ok(parsed.results)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Analysis service returned a malformed body");
            Err(AnalyzeError::MalformedBody(e.to_string()))
        }
    }
}

async fn read_error_body(response: reqwest::Response) -> String {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}
