//! Error types for the Graph API client.
//!
//! # Design
//! `Api` covers both ways the service reports failure: an `error` envelope
//! in the body, and a bare `false` returned to a verb call. The two are not
//! distinguished further because the service does not distinguish them
//! either. Transport failures are carried through untouched.

use thiserror::Error;

use crate::signed_request::SignedRequestError;

/// Errors returned by `GraphApi` operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The service rejected the call. `kind` and `code` are copied from the
    /// error envelope when it carries them.
    #[error("{message}")]
    Api {
        message: String,
        kind: Option<String>,
        code: Option<i64>,
    },

    /// `search` was called with a type outside `SearchType::ALL`.
    #[error("Unsupported type \"{kind}\". Supported types are {supported}")]
    UnsupportedSearchType { kind: String, supported: String },

    /// The signed request could not be verified or decoded.
    #[error("invalid signed request: {0}")]
    SignedRequest(#[from] SignedRequestError),

    /// Base URL and path did not form a valid URL.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The transport failed before a response body was read.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl GraphError {
    /// An API error with only a message, as raised for a `false` response.
    pub fn api(message: impl Into<String>) -> Self {
        GraphError::Api {
            message: message.into(),
            kind: None,
            code: None,
        }
    }

    pub fn is_api_error(&self) -> bool {
        matches!(self, GraphError::Api { .. })
    }

    /// Caller-input errors raised before any request is built.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, GraphError::UnsupportedSearchType { .. })
    }
}

/// Result type alias for Graph API operations.
pub type Result<T> = std::result::Result<T, GraphError>;
