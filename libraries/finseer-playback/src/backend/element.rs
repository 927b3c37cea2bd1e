//! Native media element boundary
//!
//! The smallest surface a platform media element has to expose for a
//! backend to drive it. Positions are in seconds and volume is the native
//! 0.0..=1.0 amplitude; backends convert at their edges.

use crate::types::BufferedRange;
use async_trait::async_trait;
use url::Url;

/// Platform media element (video or audio)
#[async_trait]
pub trait MediaElement: Send + Sync {
    /// Set or clear the source URL
    fn set_src(&self, url: Option<&Url>);

    /// Reset the element and re-read its source
    fn load(&self);

    /// Start playback
    ///
    /// # Errors
    /// Returns the platform's rejection reason, e.g. an autoplay policy or
    /// an undecodable source.
    async fn play(&self) -> Result<(), String>;

    fn pause(&self);

    fn current_time(&self) -> f64;
    fn set_current_time(&self, seconds: f64);

    /// Length in seconds, `None` while unknown
    fn duration(&self) -> Option<f64>;

    fn buffered(&self) -> Option<BufferedRange>;

    fn volume(&self) -> f64;
    fn set_volume(&self, volume: f64);

    fn muted(&self) -> bool;
    fn set_muted(&self, muted: bool);

    fn playback_rate(&self) -> f64;
    fn set_playback_rate(&self, rate: f64);

    /// Whether the element can play `mime` natively
    fn can_play_type(&self, mime: &str) -> bool;
}
