//! Error types for the todo API client.
//!
//! # Design
//! `Transport` and `HttpError` together are what the UI treats as a network
//! failure. `HttpError` keeps the server's `error` message when the body had
//! the `{"error": ...}` shape, so create failures can show it verbatim.

/// Errors produced while building requests, executing them, or parsing
/// responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required draft field was empty; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// The host could not complete the round-trip at all.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server answered with an unexpected status.
    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("no error message"))]
    HttpError { status: u16, message: Option<String> },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

impl ApiError {
    /// The server-provided message, if the failure carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::HttpError { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}
