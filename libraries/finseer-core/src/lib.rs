//! Finseer Core
//!
//! Domain types and collaborator traits shared by the Finseer crates.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `MediaItem`, `MediaSourceInfo`, ids, `Ticks`
//! - **Collaborator Traits**: `StreamResolver`, `PreferenceStore`
//! - **Error Handling**: `CoreError` and `Result`
//!
//! # Example
//!
//! ```rust
//! use finseer_core::types::{MediaItem, MediaType, PlayerKind, Ticks};
//!
//! let item = MediaItem::new("abc", "Pilot", MediaType::Episode);
//! assert_eq!(item.player_kind(), Some(PlayerKind::Video));
//! assert_eq!(Ticks::new(300_000_000).as_seconds(), 30.0);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod preferences;
pub mod traits;
pub mod types;

pub use error::{CoreError, Result};
pub use preferences::{PreferenceBackends, PreferenceStore, RuntimeContext};
pub use traits::StreamResolver;

pub use types::{
    DeliveryMode, ItemId, MediaItem, MediaSourceId, MediaSourceInfo, MediaType, PlayMethod,
    PlayerKind, StreamInfo, Ticks, UserId, TICKS_PER_SECOND,
};
