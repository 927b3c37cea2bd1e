//! Play queue
//!
//! An ordered list of items plus the index of the one currently playing.
//! Lookups for the next item are pure; only the manager moves the index,
//! and only after a backend has accepted the item.

use crate::error::{PlaybackError, Result};
use finseer_core::MediaItem;
use std::sync::Arc;

/// The item that `next()` would play
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NextItemInfo<'a> {
    pub index: usize,
    pub item: &'a Arc<MediaItem>,
}

/// Ordered play queue
///
/// Structure:
/// ```text
/// items:  [ A ] [ B ] [ C ]
/// index:          ^
///                 current (B)
/// ```
///
/// `index` is `None` until an item has started, and always points inside
/// `items` when set.
#[derive(Debug, Clone, Default)]
pub struct PlayQueue {
    items: Vec<Arc<MediaItem>>,
    index: Option<usize>,
}

impl PlayQueue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the playlist
    ///
    /// Resets the index; the caller sets it once playback is confirmed.
    pub fn set_playlist(&mut self, items: Vec<Arc<MediaItem>>) {
        self.items = items;
        self.index = None;
    }

    /// Append items after the current playlist
    pub fn append(&mut self, items: impl IntoIterator<Item = Arc<MediaItem>>) {
        self.items.extend(items);
    }

    /// Mark `index` as the current item
    ///
    /// # Errors
    /// Returns [`PlaybackError::IndexOutOfBounds`] if `index` is past the end.
    pub fn set_playlist_index(&mut self, index: usize) -> Result<()> {
        if index >= self.items.len() {
            return Err(PlaybackError::IndexOutOfBounds {
                index,
                len: self.items.len(),
            });
        }
        self.index = Some(index);
        Ok(())
    }

    /// Currently playing item
    pub fn current_item(&self) -> Option<&Arc<MediaItem>> {
        self.index.and_then(|i| self.items.get(i))
    }

    /// Index of the currently playing item
    pub fn current_playlist_index(&self) -> Option<usize> {
        self.index
    }

    /// Item after the current one, without moving the index
    ///
    /// With no current item the first item is next.
    pub fn next_item_info(&self) -> Option<NextItemInfo<'_>> {
        let index = self.index.map_or(0, |i| i + 1);
        self.items
            .get(index)
            .map(|item| NextItemInfo { index, item })
    }

    /// Index before the current one, `None` at the start
    pub fn previous_index(&self) -> Option<usize> {
        self.index.and_then(|i| i.checked_sub(1))
    }

    /// Item at `index`
    pub fn get(&self, index: usize) -> Option<&Arc<MediaItem>> {
        self.items.get(index)
    }

    /// All items in play order
    pub fn items(&self) -> &[Arc<MediaItem>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop all items and the index
    pub fn clear(&mut self) {
        self.items.clear();
        self.index = None;
    }
}
