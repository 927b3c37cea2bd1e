//! Finseer - Playback Coordination
//!
//! Platform-agnostic playback coordination for the Finseer media client.
//!
//! This crate provides:
//! - A play queue with pure next/previous lookups
//! - A playback manager that routes items to player backends by family
//! - Backend switching with stale-event protection (generation counter)
//! - A media-element backend for video and audio
//! - Adaptive-stream (HLS) sessions with bounded local error recovery
//! - Perceptual (cubic) volume mapping
//!
//! # Architecture
//!
//! The manager never touches a native media element. It talks to
//! [`PlayerBackend`]s registered per [`PlayerKind`](finseer_core::PlayerKind),
//! and backends talk to platform elements through the [`MediaElement`]
//! trait. Backends report state changes over an event channel; the manager
//! reconciles them into [`PlaybackState`] and publishes snapshots on a
//! watch channel.
//!
//! # Example: Basic Playback
//!
//! ```rust,no_run
//! use finseer_core::{MediaItem, MediaType, PlayerKind};
//! use finseer_playback::{
//!     HtmlMediaBackend, MediaElement, PlayOptions, PlaybackConfig, PlaybackManager,
//! };
//! use std::sync::Arc;
//!
//! # async fn run(element: Arc<dyn MediaElement>, url: url::Url) -> finseer_playback::Result<()> {
//! let mut manager = PlaybackManager::new(PlaybackConfig::default());
//!
//! // The UI owns the backend; the manager only holds a weak reference
//! let video = Arc::new(HtmlMediaBackend::video(element));
//! manager.register_player(PlayerKind::Video, &video).await?;
//!
//! let item = MediaItem::new("abc", "Pilot", MediaType::Episode);
//! manager
//!     .play_item(item, PlayOptions::from_start().with_url(url))
//!     .await?;
//!
//! manager.set_volume(80);
//! manager.pause().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Example: Observing State
//!
//! ```rust
//! use finseer_playback::{PlaybackManager, PlaybackPhase};
//!
//! let manager = PlaybackManager::default();
//! let state = manager.subscribe();
//!
//! assert_eq!(state.borrow().volume, 100);
//! assert_eq!(manager.phase(), PlaybackPhase::Idle);
//! ```

#![forbid(unsafe_code)]

pub mod adaptive;
pub mod backend;
mod error;
pub mod events;
mod manager;
mod queue;
mod registry;
pub mod types;
pub mod volume;

// Public API
pub use adaptive::{
    AdaptiveEngine, AdaptiveError, AdaptiveSession, ManifestInfo, RecoveryBudget, RecoveryConfig,
};
pub use backend::{HtmlMediaBackend, MediaElement, PlayerBackend, SelectedStreams};
pub use error::{PlaybackError, Result};
pub use events::{BackendEvent, BackendEventKind, EventSender, MediaElementEvent};
pub use manager::PlaybackManager;
pub use queue::{NextItemInfo, PlayQueue};
pub use registry::PlayerRegistry;
pub use types::{
    BufferedRange, Generation, PlayOptions, PlaybackConfig, PlaybackPhase, PlaybackStart,
    PlaybackState, StateUpdate,
};

#[cfg(feature = "hls")]
pub use adaptive::hls::{HlsEngine, HlsSession};
