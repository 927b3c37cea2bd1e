//! Player backend registry
//!
//! One slot per [`PlayerKind`]. Slots hold weak references: the UI layer
//! owns its backends and the registry never keeps one alive. A slot whose
//! backend has been dropped reads as empty.

use crate::backend::PlayerBackend;
use crate::error::{PlaybackError, Result};
use finseer_core::{MediaItem, PlayerKind};
use std::sync::{Arc, Weak};
use tracing::debug;

#[derive(Default)]
pub struct PlayerRegistry {
    slots: [Option<Weak<dyn PlayerBackend>>; 2],
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `backend` under `kind`
    ///
    /// Registering the same backend twice is a no-op.
    ///
    /// # Errors
    /// Returns [`PlaybackError::PlayerAlreadyRegistered`] if a different live
    /// backend already holds the slot.
    pub fn register(&mut self, kind: PlayerKind, backend: &Arc<dyn PlayerBackend>) -> Result<()> {
        if let Some(existing) = self.get(kind) {
            if Arc::ptr_eq(&existing, backend) {
                return Ok(());
            }
            return Err(PlaybackError::PlayerAlreadyRegistered(kind));
        }

        debug!(%kind, name = backend.name(), "Registered player");
        self.slots[kind.index()] = Some(Arc::downgrade(backend));
        Ok(())
    }

    /// Clear the slot; returns true if a live backend was removed
    pub fn unregister(&mut self, kind: PlayerKind) -> bool {
        let was_live = self.get(kind).is_some();
        self.slots[kind.index()] = None;
        was_live
    }

    /// Live backend for `kind`
    pub fn get(&self, kind: PlayerKind) -> Option<Arc<dyn PlayerBackend>> {
        self.slots[kind.index()].as_ref().and_then(Weak::upgrade)
    }

    pub fn is_registered(&self, kind: PlayerKind) -> bool {
        self.get(kind).is_some()
    }

    /// Backend able to play `item`
    ///
    /// # Errors
    /// Returns [`PlaybackError::NoBackend`] if the item's type maps to no
    /// player family or that family has no live backend.
    pub fn resolve(&self, item: &MediaItem) -> Result<Arc<dyn PlayerBackend>> {
        let kind = item.player_kind();
        kind.and_then(|k| self.get(k))
            .ok_or(PlaybackError::NoBackend {
                media_type: item.media_type,
                kind,
            })
    }
}

impl std::fmt::Debug for PlayerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerRegistry")
            .field("video", &self.is_registered(PlayerKind::Video))
            .field("audio", &self.is_registered(PlayerKind::Audio))
            .finish()
    }
}
