//! Backend-to-manager events
//!
//! Backends translate native element notifications into [`BackendEvent`]s
//! and push them into the manager's channel. Every event is stamped with
//! the generation the backend was started under so the manager can drop
//! notifications from superseded play attempts.

use crate::types::{BufferedRange, Generation};
use finseer_core::PlayerKind;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;

/// Native media element notifications
///
/// Mirrors the events a platform media element fires. Fed into a backend by
/// whatever hosts the element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MediaElementEvent {
    TimeUpdate,
    DurationChange,
    Play,
    Playing,
    Pause,
    Ended,
    Waiting,
    Progress,
    VolumeChange,
    RateChange,
    Error { message: String },
}

/// State change reported by a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BackendEventKind {
    /// Position changed (seconds)
    TimeUpdate { seconds: f64 },

    /// Duration became known or changed (seconds)
    DurationChange { seconds: f64 },

    /// Playback started or resumed
    Playing,

    /// Playback paused
    Paused,

    /// Reached the end of the media
    Ended,

    /// Stalled waiting for data
    Buffering,

    /// Buffered range changed
    Progress { buffered: Option<BufferedRange> },

    /// Volume or mute changed on the element
    VolumeChange { volume: u8, muted: bool },

    /// Playback rate changed on the element
    RateChange { rate: f64 },

    /// Unrecoverable playback error
    Error { message: String },
}

/// Event tagged with its origin and generation
#[derive(Debug, Clone, PartialEq)]
pub struct BackendEvent {
    pub kind: PlayerKind,
    pub generation: Generation,
    pub event: BackendEventKind,
}

/// Sending half handed to a backend when it is registered
#[derive(Debug, Clone)]
pub struct EventSender {
    kind: PlayerKind,
    tx: mpsc::UnboundedSender<BackendEvent>,
}

impl EventSender {
    pub fn new(kind: PlayerKind, tx: mpsc::UnboundedSender<BackendEvent>) -> Self {
        Self { kind, tx }
    }

    pub fn kind(&self) -> PlayerKind {
        self.kind
    }

    /// Send an event; returns false once the manager is gone
    pub fn send(&self, generation: Generation, event: BackendEventKind) -> bool {
        trace!(kind = %self.kind, %generation, ?event, "Backend event");
        self.tx
            .send(BackendEvent {
                kind: self.kind,
                generation,
                event,
            })
            .is_ok()
    }
}

/// Create an event channel
pub fn channel() -> (
    mpsc::UnboundedSender<BackendEvent>,
    mpsc::UnboundedReceiver<BackendEvent>,
) {
    mpsc::unbounded_channel()
}
