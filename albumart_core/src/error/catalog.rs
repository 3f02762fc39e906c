//! Remote catalog error types

use thiserror::Error;

/// Errors raised while talking to the remote music catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Token exchange did not yield an access token
    #[error("Authentication failed: {reason}")]
    Auth { reason: String },

    /// Search endpoint answered with a non-success status
    #[error("Search request failed with status {status}: {body}")]
    Search { status: u16, body: String },

    /// Request could not be sent or the response could not be read
    #[error("Network error: {message}")]
    Network { message: String },

    /// Response body was not the JSON document we expected
    #[error("Malformed catalog response: {message}")]
    MalformedResponse { message: String },
}

impl CatalogError {
    /// Create an authentication error
    pub fn auth(reason: impl Into<String>) -> Self {
        Self::Auth {
            reason: reason.into(),
        }
    }

    /// Create a search error carrying the HTTP status and raw body
    pub fn search(status: u16, body: impl Into<String>) -> Self {
        Self::Search {
            status,
            body: body.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Check if this error is transient and a later attempt might succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Search { status, .. } => matches!(status, 429 | 500..=504),
            Self::Auth { .. } | Self::MalformedResponse { .. } => false,
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::malformed(err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }
}
