//! Alert delivery for failed probes

pub mod slack;

pub use slack::{SlackAttachment, SlackPayload, SlackSink};

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("couldn't marshal message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed creating HTTP request: {0}")]
    Request(String),
    #[error("failed posting webhook: {0}")]
    Post(String),
    #[error("non-ok response returned from webhook (status {status}): {body}")]
    NonOkResponse { status: u16, body: String },
    #[error("creating webhook HTTP client: {0}")]
    ClientBuild(String),
}

/// Destination for formatted failure notifications
#[async_trait::async_trait]
pub trait AlertSink: Send + Sync {
    async fn notify(&self, message: &str) -> Result<(), AlertError>;
}
