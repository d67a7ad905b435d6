use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single ask request.
#[derive(Debug, Error)]
pub enum AskError {
    #[error("invalid ask endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("could not decode answer: {0}")]
    Decode(#[from] serde_json::Error),
}

impl AskError {
    /// Request failures are shown to the user as the fallback answer.
    /// A success body that fails to decode is not: it only reaches the log.
    pub fn is_request_failure(&self) -> bool {
        !matches!(self, AskError::Decode(_))
    }
}

/// Fault raised while handling a submit, before any request was issued.
#[derive(Debug, Error)]
pub enum HandlerFault {
    #[error("no async runtime available to issue the request: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    #[error("event loop is no longer receiving responses")]
    EventLoopClosed,
}
