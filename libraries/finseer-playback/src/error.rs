//! Error types for playback coordination

use crate::adaptive::AdaptiveError;
use finseer_core::{CoreError, MediaType, PlayerKind};
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No registered backend can play the item's media type
    #[error("No player registered for {media_type} (kind: {kind:?})")]
    NoBackend {
        media_type: MediaType,
        kind: Option<PlayerKind>,
    },

    /// A live backend is already registered under this kind
    #[error("A {0} player is already registered")]
    PlayerAlreadyRegistered(PlayerKind),

    /// Queue index out of range
    #[error("Index {index} out of bounds for queue of {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Playback rate must be finite and positive
    #[error("Invalid playback rate: {0}")]
    InvalidPlaybackRate(f64),

    /// Stream resolution failed
    #[error("Stream resolution failed: {0}")]
    Stream(#[from] CoreError),

    /// The native play call rejected
    #[error("Native playback rejected: {0}")]
    NativePlay(String),

    /// Fatal adaptive-session error after local recovery was exhausted
    #[error("Adaptive stream failed: {0}")]
    Adaptive(#[from] AdaptiveError),

    /// Neither an adaptive engine nor native manifest support is available
    #[error("Unsupported delivery: {0}")]
    UnsupportedDelivery(String),

    /// A destructive stop superseded an in-flight load
    #[error("Playback cancelled")]
    Cancelled,

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl PlaybackError {
    /// Returns true if the caller may simply retry later
    ///
    /// Routing errors are recoverable because a backend may mount moments
    /// after the first attempt.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PlaybackError::NoBackend { .. }
                | PlaybackError::Cancelled
                | PlaybackError::NativePlay(_)
        )
    }

    /// Short code for logs and error indicators
    pub fn error_code(&self) -> &'static str {
        match self {
            PlaybackError::NoBackend { .. } => "NO_BACKEND",
            PlaybackError::PlayerAlreadyRegistered(_) => "DUPLICATE_PLAYER",
            PlaybackError::IndexOutOfBounds { .. } => "INDEX_OUT_OF_BOUNDS",
            PlaybackError::InvalidPlaybackRate(_) => "INVALID_RATE",
            PlaybackError::Stream(_) => "STREAM_RESOLUTION",
            PlaybackError::NativePlay(_) => "NATIVE_PLAY",
            PlaybackError::Adaptive(_) => "ADAPTIVE_FATAL",
            PlaybackError::UnsupportedDelivery(_) => "UNSUPPORTED_DELIVERY",
            PlaybackError::Cancelled => "CANCELLED",
            PlaybackError::InvalidOperation(_) => "INVALID_OPERATION",
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
