//! Error types for the Jellyfin client.

use finseer_core::CoreError;
use thiserror::Error;

/// Errors that can occur when talking to a Jellyfin server.
#[derive(Error, Debug)]
pub enum ServerClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Authentication required but no token available
    #[error("Authentication required")]
    AuthRequired,

    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Invalid server URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse server response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Requested entity does not exist on the server
    #[error("Not found: {0}")]
    NotFound(String),

    /// Item has nothing the client can play
    #[error("No playable source for item {0}")]
    NoPlayableSource(String),

    /// Server is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),
}

impl ServerClientError {
    /// Map a transport failure, separating unreachable servers from other errors
    pub(crate) fn from_send(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Self::ServerUnreachable(e.to_string())
        } else {
            Self::Request(e)
        }
    }
}

impl From<url::ParseError> for ServerClientError {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e.to_string())
    }
}

impl From<ServerClientError> for CoreError {
    fn from(e: ServerClientError) -> Self {
        match e {
            ServerClientError::NotFound(id) => CoreError::not_found("Item", id),
            ServerClientError::NoPlayableSource(id) => CoreError::NoStream(id),
            ServerClientError::ServerUnreachable(msg) => CoreError::network(msg),
            ServerClientError::Request(e) => CoreError::network(e.to_string()),
            ServerClientError::InvalidUrl(msg) => CoreError::invalid_input(msg),
            other => CoreError::Other(other.to_string()),
        }
    }
}

/// Result type for server client operations.
pub type Result<T> = std::result::Result<T, ServerClientError>;
