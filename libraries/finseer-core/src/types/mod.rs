mod ids;
mod media_item;
mod stream;
mod ticks;

pub use ids::{ItemId, MediaSourceId, UserId};
pub use media_item::{
    MediaItem, MediaSourceInfo, MediaType, PlayMethod, PlayerKind, UserItemData,
};
pub use stream::{is_manifest_url, DeliveryMode, StreamInfo};
pub use ticks::{Ticks, TICKS_PER_SECOND};
