//! Collaborator traits consumed by the playback core

use crate::error::Result;
use crate::types::{MediaItem, MediaSourceId, StreamInfo};
use async_trait::async_trait;

/// Streaming resolution
///
/// Given an item, decides the delivery mode and produces a play URL.
/// Implemented against the media server; the playback core only consumes it.
#[async_trait]
pub trait StreamResolver: Send + Sync {
    /// Resolve a play URL for `item`
    ///
    /// `media_source_id` selects one of the item's sources; `None` lets the
    /// resolver pick.
    ///
    /// # Errors
    /// Returns an error if the item has no deliverable stream or the server
    /// could not be reached.
    async fn resolve(
        &self,
        item: &MediaItem,
        media_source_id: Option<&MediaSourceId>,
    ) -> Result<StreamInfo>;
}
