//! Adaptive-stream (HLS) sessions and error recovery
//!
//! An [`AdaptiveEngine`] creates one [`AdaptiveSession`] per play attempt.
//! The session is attached to a media element, fetches the manifest and
//! feeds the element. Errors it reports are classified into network, media
//! and other; the first two get a bounded number of local retries tracked
//! by [`RecoveryBudget`] before they escalate to the manager.

#[cfg(feature = "hls")]
pub mod hls;

use crate::backend::MediaElement;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// MIME type a native element reports for built-in HLS support
pub const NATIVE_HLS_MIME: &str = "application/vnd.apple.mpegurl";

/// Adaptive session error, classified by recovery strategy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdaptiveError {
    /// Manifest or segment fetch failed; recovered by reloading
    #[error("network error: {0}")]
    Network(String),

    /// Decoding or buffer error; recovered by re-attaching the media
    #[error("media error: {0}")]
    Media(String),

    /// Anything else; never recovered locally
    #[error("{0}")]
    Other(String),
}

impl AdaptiveError {
    pub fn kind(&self) -> AdaptiveErrorKind {
        match self {
            Self::Network(_) => AdaptiveErrorKind::Network,
            Self::Media(_) => AdaptiveErrorKind::Media,
            Self::Other(_) => AdaptiveErrorKind::Other,
        }
    }

    /// Whether a local recovery strategy exists for this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdaptiveErrorKind {
    Network,
    Media,
    Other,
}

/// Manifest details reported once a session has parsed it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestInfo {
    /// Total length in seconds, if the playlist is finite
    pub duration: Option<f64>,

    /// Number of variant streams (1 for a plain media playlist)
    pub variants: usize,

    pub is_live: bool,
}

/// Factory for adaptive sessions
pub trait AdaptiveEngine: Send + Sync {
    /// Whether the engine can run in this environment
    fn is_supported(&self) -> bool;

    /// Create a session attached to `element`
    fn create_session(&self, element: Arc<dyn MediaElement>) -> Box<dyn AdaptiveSession>;
}

/// One adaptive-stream session
///
/// Owned exclusively by the backend that created it. After
/// [`destroy`](AdaptiveSession::destroy) the session must not touch the
/// element again.
#[async_trait]
pub trait AdaptiveSession: Send {
    /// Load and parse the manifest at `url`
    async fn load_source(&mut self, url: &Url) -> Result<ManifestInfo, AdaptiveError>;

    /// Restart loading after a network error
    async fn start_load(&mut self) -> Result<ManifestInfo, AdaptiveError>;

    /// Re-attach the media after a decode error
    async fn recover_media_error(&mut self) -> Result<ManifestInfo, AdaptiveError>;

    /// Release all resources
    fn destroy(&mut self);
}

/// Retry limits for adaptive recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Reloads allowed after network errors (default: 1)
    pub max_network_retries: u32,

    /// Media re-attaches allowed after decode errors (default: 1)
    pub max_media_retries: u32,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_network_retries: 1,
            max_media_retries: 1,
        }
    }
}

/// What to do about a fatal session error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Call [`AdaptiveSession::start_load`]
    Reload,

    /// Call [`AdaptiveSession::recover_media_error`]
    RecoverMedia,

    /// Tear down and report to the manager
    Escalate,
}

/// Remaining retries for one session
#[derive(Debug, Clone)]
pub struct RecoveryBudget {
    network_left: u32,
    media_left: u32,
}

impl RecoveryBudget {
    pub fn new(config: RecoveryConfig) -> Self {
        Self {
            network_left: config.max_network_retries,
            media_left: config.max_media_retries,
        }
    }

    /// Decide how to handle `error`, spending one retry if one is left
    pub fn decide(&mut self, error: &AdaptiveError) -> RecoveryAction {
        match error {
            AdaptiveError::Network(_) if self.network_left > 0 => {
                self.network_left -= 1;
                RecoveryAction::Reload
            }
            AdaptiveError::Media(_) if self.media_left > 0 => {
                self.media_left -= 1;
                RecoveryAction::RecoverMedia
            }
            _ => RecoveryAction::Escalate,
        }
    }

    pub fn network_left(&self) -> u32 {
        self.network_left
    }

    pub fn media_left(&self) -> u32 {
        self.media_left
    }
}
