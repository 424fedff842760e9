//! Error types for profile queries.

use thiserror::Error;

/// Errors that can occur when querying the profiling backend.
#[derive(Debug, Error)]
pub enum QueryError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Backend answered with a non-success status code.
    #[error("Backend returned status {0}")]
    Status(u16),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Backend reported an application-level error in its envelope.
    #[error("Backend error: {0}")]
    Api(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The query task panicked or was aborted before answering.
    #[error("Query task failed: {0}")]
    Task(String),

    /// Reading a local fixture failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            QueryError::Timeout
        } else if err.is_connect() {
            QueryError::Connection(err.to_string())
        } else if err.is_decode() {
            QueryError::Parse(err.to_string())
        } else {
            QueryError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::Parse(err.to_string())
    }
}
