use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{config::OpenClawConfig, payload::AlertmanagerPayload, Error, Result};

/// Total attempts per payload, including the first one.
const MAX_ATTEMPTS: u32 = 3;

/// Upper bound on each individual HTTP attempt, independent of backoff.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How much of a non-2xx response body is read for the log record.
const ERROR_BODY_LIMIT: usize = 512;

/// Anything the delivery queue can hand payloads to.
///
/// `OpenClawClient` is the production implementation; tests substitute a
/// recording double.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(
        &self,
        shutdown: &CancellationToken,
        payload: &AlertmanagerPayload,
    ) -> Result<()>;
}

/// Sends alert prompts to an OpenClaw instance.
///
/// Holds only immutable configuration and a connection-pooling HTTP client,
/// so it is safe to share across tasks without locking.
pub struct OpenClawClient {
    base_url: String,
    token: String,
    model: String,
    http: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl OpenClawClient {
    pub fn new(config: &OpenClawConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            model: config.model.clone(),
            http,
        })
    }
}

/// Renders the structured prompt sent to OpenClaw for a webhook payload.
pub fn build_prompt(payload: &AlertmanagerPayload) -> Result<String> {
    let raw = serde_json::to_string_pretty(payload)?;

    Ok(format!(
        "You received the following Grafana Alertmanager webhook payload:\n\
         \n\
         ```json\n{raw}\n```\n\
         \n\
         Investigate the alert(s) above. Try to identify the root cause and resolve the issue if possible.\n\
         If you cannot resolve it, provide a detailed diagnosis and suggest remediation steps.\n\
         Report your findings and the current status (resolved, in-progress, or needs-manual-intervention)."
    ))
}

#[async_trait]
impl Forwarder for OpenClawClient {
    /// Sends the payload to OpenClaw with up to 3 attempts and exponential
    /// backoff (1s, 2s). Both the backoff sleep and the in-flight request
    /// abort promptly when `shutdown` fires.
    async fn forward(
        &self,
        shutdown: &CancellationToken,
        payload: &AlertmanagerPayload,
    ) -> Result<()> {
        let prompt = build_prompt(payload)?;
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            stream: false,
        };
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut last_err: Option<Error> = None;
        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                let backoff = Duration::from_secs(1u64 << (attempt - 2));
                info!(
                    attempt,
                    backoff_secs = backoff.as_secs(),
                    "retrying OpenClaw request"
                );
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => {
                        return Err(Error::Cancelled(
                            "shutdown during retry backoff".to_string(),
                        ));
                    }
                    _ = tokio::time::sleep(backoff) => {}
                }
            }

            let request = self
                .http
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.token))
                .json(&body)
                .send();

            let response = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    return Err(Error::Cancelled(
                        "shutdown during in-flight request".to_string(),
                    ));
                }
                response = request => response,
            };

            match response {
                Ok(response) if response.status().is_success() => {
                    // Drain the body so the connection can be reused.
                    let _ = response.bytes().await;
                    return Ok(());
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let snippet = read_error_snippet(response).await;
                    warn!(attempt, status, body = %snippet, "OpenClaw returned non-2xx response");
                    last_err = Some(Error::UpstreamStatus(status));
                }
                Err(err) => {
                    warn!(attempt, error = %err, "OpenClaw request error");
                    last_err = Some(Error::Http(err));
                }
            }
        }

        Err(match last_err {
            Some(source) => Error::RetriesExhausted {
                attempts: MAX_ATTEMPTS,
                source: Box::new(source),
            },
            None => Error::Internal("retry loop exited without an error".to_string()),
        })
    }
}

/// Reads at most `ERROR_BODY_LIMIT` bytes of an error response body for
/// diagnostic logging.
async fn read_error_snippet(mut response: reqwest::Response) -> String {
    let mut buf = Vec::with_capacity(ERROR_BODY_LIMIT);
    while buf.len() < ERROR_BODY_LIMIT {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(ERROR_BODY_LIMIT - buf.len());
                buf.extend_from_slice(&chunk[..take]);
                if take < chunk.len() {
                    break;
                }
            }
            Ok(None) | Err(_) => break,
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
