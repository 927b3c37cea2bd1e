//! Resolved delivery information for one play attempt

use super::ids::MediaSourceId;
use super::media_item::PlayMethod;
use serde::{Deserialize, Serialize};
use url::Url;

/// How a stream reaches the native media element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryMode {
    /// Manifest-based segmented delivery (HLS)
    Adaptive,
    /// One static URL played directly
    Progressive,
}

/// A concrete play URL plus how it should be delivered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub url: Url,

    /// Explicit adaptive signal from the media source
    pub adaptive: bool,

    pub play_method: PlayMethod,

    pub media_source_id: Option<MediaSourceId>,
}

impl StreamInfo {
    /// Progressive stream with no media source attached
    pub fn progressive(url: Url) -> Self {
        Self {
            url,
            adaptive: false,
            play_method: PlayMethod::DirectPlay,
            media_source_id: None,
        }
    }

    /// Adaptive when explicitly flagged or when the URL names a `.m3u8` manifest
    pub fn delivery_mode(&self) -> DeliveryMode {
        if self.adaptive || is_manifest_url(&self.url) {
            DeliveryMode::Adaptive
        } else {
            DeliveryMode::Progressive
        }
    }
}

/// `.m3u8` path suffix check (query string ignored)
pub fn is_manifest_url(url: &Url) -> bool {
    url.path().to_ascii_lowercase().ends_with(".m3u8")
}
