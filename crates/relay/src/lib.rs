pub mod config;
pub mod metrics;
pub mod openclaw;
pub mod payload;
pub mod queue;
pub mod server;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("OpenClaw returned status {0}")]
    UpstreamStatus(u16),
    #[error("Delivery cancelled: {0}")]
    Cancelled(String),
    #[error("OpenClaw request failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error came from a shutdown-triggered cancellation
    /// rather than an ordinary delivery failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
