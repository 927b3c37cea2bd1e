//! Core types for playback coordination

use crate::adaptive::RecoveryConfig;
use finseer_core::{DeliveryMode, MediaItem, MediaSourceId, PlayMethod, Ticks};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Monotonic counter identifying one play attempt
///
/// Backend events carry the generation they were produced under; the
/// manager drops anything that does not match its current generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub const INITIAL: Self = Self(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Buffered region of the current media, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BufferedRange {
    pub start: f64,
    pub end: f64,
}

/// Observable playback state
///
/// Published to subscribers after every change. Invariants held by
/// [`PlaybackState::apply`]:
/// - `volume` is within 0..=100
/// - `current_time` is within `[0, duration]` once the duration is known
/// - `is_ended` implies `paused`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub paused: bool,
    pub muted: bool,

    /// Perceptual volume, 0-100
    pub volume: u8,

    pub playback_rate: f64,

    /// Position in seconds
    pub current_time: f64,

    /// Length in seconds; 0 while unknown
    pub duration: f64,

    pub buffered: Option<BufferedRange>,
    pub is_buffering: bool,
    pub is_ended: bool,

    pub current_item: Option<Arc<MediaItem>>,
    pub current_media_source: Option<MediaSourceId>,
    pub play_method: Option<PlayMethod>,

    /// Message of the most recent failure, cleared by the next successful play
    pub last_error: Option<String>,
}

impl PlaybackState {
    /// Idle state seeded from config
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            paused: false,
            muted: config.muted,
            volume: config.volume.min(100),
            playback_rate: config.playback_rate,
            current_time: 0.0,
            duration: 0.0,
            buffered: None,
            is_buffering: false,
            is_ended: false,
            current_item: None,
            current_media_source: None,
            play_method: None,
            last_error: None,
        }
    }

    /// Merge a partial update, then re-establish the invariants
    pub fn apply(&mut self, update: StateUpdate) {
        let StateUpdate {
            paused,
            muted,
            volume,
            playback_rate,
            current_time,
            duration,
            buffered,
            is_buffering,
            is_ended,
            current_item,
            current_media_source,
            play_method,
            last_error,
        } = update;

        if let Some(v) = paused {
            self.paused = v;
        }
        if let Some(v) = muted {
            self.muted = v;
        }
        if let Some(v) = volume {
            self.volume = v.min(100);
        }
        if let Some(v) = playback_rate.filter(|r| r.is_finite() && *r > 0.0) {
            self.playback_rate = v;
        }
        if let Some(v) = duration.filter(|d| d.is_finite()) {
            self.duration = v.max(0.0);
        }
        if let Some(v) = current_time.filter(|t| t.is_finite()) {
            self.current_time = v;
        }
        if let Some(v) = buffered {
            self.buffered = v;
        }
        if let Some(v) = is_buffering {
            self.is_buffering = v;
        }
        if let Some(v) = is_ended {
            self.is_ended = v;
        }
        if let Some(v) = current_item {
            self.current_item = v;
        }
        if let Some(v) = current_media_source {
            self.current_media_source = v;
        }
        if let Some(v) = play_method {
            self.play_method = v;
        }
        if let Some(v) = last_error {
            self.last_error = v;
        }

        self.current_time = self.current_time.max(0.0);
        if self.duration > 0.0 {
            self.current_time = self.current_time.min(self.duration);
        }
        if self.is_ended {
            self.paused = true;
        }
    }

    /// Derived lifecycle phase
    pub fn phase(&self) -> PlaybackPhase {
        if self.current_item.is_none() {
            PlaybackPhase::Idle
        } else if self.is_ended {
            PlaybackPhase::Ended
        } else if !self.paused && self.duration <= 0.0 && self.current_time <= 0.0 {
            PlaybackPhase::Loading
        } else if self.paused {
            PlaybackPhase::Paused
        } else {
            PlaybackPhase::Playing
        }
    }

    /// Current position in ticks
    pub fn position(&self) -> Ticks {
        Ticks::from_seconds(self.current_time)
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(&PlaybackConfig::default())
    }
}

/// Lifecycle phase derived from [`PlaybackState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackPhase {
    /// Nothing loaded
    Idle,

    /// Item set, backend still loading
    Loading,

    Playing,
    Paused,

    /// Reached the end of the item
    Ended,
}

/// Partial state update
///
/// Only fields set to `Some` are applied. Nullable fields use a nested
/// `Option` so they can be cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub paused: Option<bool>,
    pub muted: Option<bool>,
    pub volume: Option<u8>,
    pub playback_rate: Option<f64>,
    pub current_time: Option<f64>,
    pub duration: Option<f64>,
    pub buffered: Option<Option<BufferedRange>>,
    pub is_buffering: Option<bool>,
    pub is_ended: Option<bool>,
    pub current_item: Option<Option<Arc<MediaItem>>>,
    pub current_media_source: Option<Option<MediaSourceId>>,
    pub play_method: Option<Option<PlayMethod>>,
    pub last_error: Option<Option<String>>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn paused(mut self, paused: bool) -> Self {
        self.paused = Some(paused);
        self
    }

    #[must_use]
    pub fn muted(mut self, muted: bool) -> Self {
        self.muted = Some(muted);
        self
    }

    #[must_use]
    pub fn volume(mut self, volume: u8) -> Self {
        self.volume = Some(volume);
        self
    }

    #[must_use]
    pub fn playback_rate(mut self, rate: f64) -> Self {
        self.playback_rate = Some(rate);
        self
    }

    #[must_use]
    pub fn current_time(mut self, seconds: f64) -> Self {
        self.current_time = Some(seconds);
        self
    }

    #[must_use]
    pub fn duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    #[must_use]
    pub fn buffered(mut self, range: Option<BufferedRange>) -> Self {
        self.buffered = Some(range);
        self
    }

    #[must_use]
    pub fn is_buffering(mut self, buffering: bool) -> Self {
        self.is_buffering = Some(buffering);
        self
    }

    #[must_use]
    pub fn is_ended(mut self, ended: bool) -> Self {
        self.is_ended = Some(ended);
        self
    }

    #[must_use]
    pub fn current_item(mut self, item: Option<Arc<MediaItem>>) -> Self {
        self.current_item = Some(item);
        self
    }

    #[must_use]
    pub fn current_media_source(mut self, id: Option<MediaSourceId>) -> Self {
        self.current_media_source = Some(id);
        self
    }

    #[must_use]
    pub fn play_method(mut self, method: Option<PlayMethod>) -> Self {
        self.play_method = Some(method);
        self
    }

    #[must_use]
    pub fn last_error(mut self, message: Option<String>) -> Self {
        self.last_error = Some(message);
        self
    }
}

/// Options for one play request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayOptions {
    /// Start position; `None` starts from the beginning
    pub start_position_ticks: Option<Ticks>,

    /// Media source to play; `None` lets the resolver choose
    pub media_source_id: Option<MediaSourceId>,

    pub audio_stream_index: Option<i32>,
    pub subtitle_stream_index: Option<i32>,

    /// Explicit play URL, bypassing stream resolution
    pub url: Option<Url>,
}

impl PlayOptions {
    /// Play from the beginning
    pub fn from_start() -> Self {
        Self {
            start_position_ticks: Some(Ticks::ZERO),
            ..Self::default()
        }
    }

    /// Play from the item's saved resume position
    pub fn resume(item: &MediaItem) -> Self {
        Self {
            start_position_ticks: Some(item.resume_position()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_start_position(mut self, ticks: Ticks) -> Self {
        self.start_position_ticks = Some(ticks);
        self
    }

    #[must_use]
    pub fn with_media_source(mut self, id: MediaSourceId) -> Self {
        self.media_source_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Effective start position
    pub fn start_position(&self) -> Ticks {
        self.start_position_ticks.unwrap_or(Ticks::ZERO)
    }
}

/// What a backend reports once native playback has started
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackStart {
    pub url: Url,
    pub delivery: DeliveryMode,
    pub play_method: PlayMethod,
    pub media_source_id: Option<MediaSourceId>,
}

/// Configuration for the playback manager
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Initial volume (0-100, default: 100)
    pub volume: u8,

    /// Initial mute state (default: false)
    pub muted: bool,

    /// Initial playback rate (default: 1.0)
    pub playback_rate: f64,

    /// When set, `previous()` past this many seconds restarts the current
    /// item instead of stepping back (default: off)
    pub previous_restart_threshold: Option<f64>,

    /// Local retry budget for adaptive sessions
    pub recovery: RecoveryConfig,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 100,
            muted: false,
            playback_rate: 1.0,
            previous_restart_threshold: None,
            recovery: RecoveryConfig::default(),
        }
    }
}
