//! Error types for the mailing-list API client.
//!
//! # Design
//! Every non-2xx response lands in `HttpError` with the raw status code and
//! body. Not-found is not a separate variant; `ApiError::is_not_found`
//! answers that question for callers that care.

use thiserror::Error;

/// Errors returned by `ListsApi` and `ListsClient`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response (connection, DNS, timeout).
    #[error("transport failed: {0}")]
    TransportError(String),

    /// The server returned a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// A request field (e.g. subscriber vars) could not be serialized.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    #[error("invalid configuration: {0}")]
    ConfigError(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
