//! Player backends
//!
//! A backend wraps one native media element and exposes a uniform control
//! surface to the [`PlaybackManager`](crate::PlaybackManager). The manager
//! routes each item to the backend registered for its [`PlayerKind`] and
//! never touches native elements itself.

mod element;
mod html;

pub use element::MediaElement;
pub use html::{HtmlMediaBackend, SelectedStreams};

use crate::adaptive::AdaptiveError;
use crate::error::Result;
use crate::events::{EventSender, MediaElementEvent};
use crate::types::{Generation, PlayOptions, PlaybackStart};
use async_trait::async_trait;
use finseer_core::{MediaItem, MediaType, PlayerKind, Ticks};

/// Uniform player backend contract
#[async_trait]
pub trait PlayerBackend: Send + Sync {
    /// Player family this backend serves
    fn kind(&self) -> PlayerKind;

    /// Name for logs
    fn name(&self) -> &str;

    fn can_play_media_type(&self, media_type: MediaType) -> bool;

    /// Install the channel state changes are reported on
    async fn bind_events(&self, sender: EventSender);

    /// Tear down any previous media, resolve a stream for `item` and start it
    ///
    /// Events produced for this item carry `generation`.
    ///
    /// # Errors
    /// Fails if no stream can be resolved, the native element rejects
    /// playback, or an adaptive session fails past its retry budget.
    /// Returns [`PlaybackError::Cancelled`](crate::PlaybackError::Cancelled)
    /// if a destructive `stop` arrived while loading.
    async fn play(
        &self,
        item: &MediaItem,
        options: &PlayOptions,
        generation: Generation,
    ) -> Result<PlaybackStart>;

    async fn pause(&self);

    /// Resume playback
    ///
    /// # Errors
    /// Returns the native rejection if the element refuses to resume.
    async fn unpause(&self) -> Result<()>;

    /// Stop playback; `destroy` also releases the source and any session
    async fn stop(&self, destroy: bool);

    /// Seek to `position`; out-of-range targets are clamped
    async fn seek(&self, position: Ticks);

    /// Perceptual volume, 0-100
    fn set_volume(&self, percent: u8);
    fn volume(&self) -> u8;

    fn set_mute(&self, muted: bool);
    fn is_muted(&self) -> bool;

    fn set_playback_rate(&self, rate: f64);
    fn playback_rate(&self) -> f64;

    async fn set_audio_stream_index(&self, index: i32);
    async fn set_subtitle_stream_index(&self, index: i32);

    /// Feed a native element notification
    async fn handle_media_event(&self, event: MediaElementEvent);

    /// Feed an error raised by the adaptive session
    ///
    /// Non-fatal errors are left to the session. Fatal ones are retried
    /// within the recovery budget, then reported to the manager.
    async fn handle_adaptive_error(&self, error: AdaptiveError, fatal: bool);

    /// Release everything; the backend is not used afterwards
    async fn destroy(&self);
}
