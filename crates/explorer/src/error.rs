use cswatch_common::rate_limit;
use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the explorer.
#[derive(Debug, Clone, Error)]
pub enum ExplorerError {
    /// Connection error, retry might help
    #[error("could not connect: {0}")]
    Connection(String),

    /// Timeout error, retry might help
    #[error("timeout")]
    Timeout,

    /// The call didn't settle within the provider deadline.
    #[error("no response within {0} ms")]
    DeadlineExceeded(u64),

    /// Explorer answered with a non-success status.
    #[error("obtained failure status({0}): {1}")]
    Status(u16, String),

    /// Error decoding the response body.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Error building the request, not retryable
    #[error("could not build request: {0}")]
    ReqBuilder(String),

    /// General request error, retry might help
    #[error("request failed: {0}")]
    Request(String),

    #[error("{0}")]
    Other(String),
}

impl ExplorerError {
    /// Whether the explorer is telling us to slow down.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::Status(code, _) if *code == StatusCode::TOO_MANY_REQUESTS.as_u16() => true,
            other => rate_limit::is_rate_limited(&other.to_string()),
        }
    }
}

impl From<reqwest::Error> for ExplorerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::ReqBuilder(err.to_string())
        } else if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_status() {
            match err.status() {
                Some(code) => Self::Status(code.as_u16(), err.to_string()),
                None => Self::Other(err.to_string()),
            }
        } else if err.is_decode() || err.is_body() {
            Self::MalformedResponse(err.to_string())
        } else if err.is_request() {
            Self::Request(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}

/// Failure of an activity scan.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("explorer: {0}")]
    Explorer(#[from] ExplorerError),

    #[error("malformed transfers page {page}: {reason}")]
    MalformedPage { page: u32, reason: String },

    #[error("scan failed after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ScanError>,
    },

    #[error("scan cancelled by shutdown")]
    Cancelled,
}
