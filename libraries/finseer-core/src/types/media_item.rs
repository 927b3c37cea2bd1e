//! Media server item types
//!
//! Field names follow the server's PascalCase JSON so items fetched over
//! HTTP deserialize directly.

use super::ids::{ItemId, MediaSourceId};
use super::ticks::Ticks;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Media-type classification reported by the server
///
/// The server reports both a coarse `MediaType` (Video, Audio, ...) and a
/// finer item `Type` (Movie, Episode, ...). Both vocabularies land here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    Video,
    Movie,
    Episode,
    TvChannel,
    MusicVideo,
    Trailer,
    Audio,
    Music,
    AudioBook,
    Photo,
    Book,
    #[default]
    #[serde(other)]
    Unknown,
}

impl MediaType {
    /// Player family able to render this media type, if any
    pub fn player_kind(self) -> Option<PlayerKind> {
        match self {
            Self::Video
            | Self::Movie
            | Self::Episode
            | Self::TvChannel
            | Self::MusicVideo
            | Self::Trailer => Some(PlayerKind::Video),
            Self::Audio | Self::Music | Self::AudioBook => Some(PlayerKind::Audio),
            Self::Photo | Self::Book | Self::Unknown => None,
        }
    }

    /// Server spelling of the type
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "Video",
            Self::Movie => "Movie",
            Self::Episode => "Episode",
            Self::TvChannel => "TvChannel",
            Self::MusicVideo => "MusicVideo",
            Self::Trailer => "Trailer",
            Self::Audio => "Audio",
            Self::Music => "Music",
            Self::AudioBook => "AudioBook",
            Self::Photo => "Photo",
            Self::Book => "Book",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of player backend families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerKind {
    Video,
    Audio,
}

impl PlayerKind {
    /// All kinds, in registry order
    pub const ALL: [PlayerKind; 2] = [PlayerKind::Video, PlayerKind::Audio];

    /// Stable slot index for fixed-size tables
    pub const fn index(self) -> usize {
        match self {
            Self::Video => 0,
            Self::Audio => 1,
        }
    }
}

impl fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => f.write_str("Video"),
            Self::Audio => f.write_str("Audio"),
        }
    }
}

/// How the server delivers a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayMethod {
    DirectPlay,
    Transcode,
    DirectStream,
}

/// Per-user item data (resume position)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserItemData {
    #[serde(default)]
    pub playback_position_ticks: Ticks,

    #[serde(default)]
    pub played: bool,
}

/// A deliverable source of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MediaSourceInfo {
    pub id: MediaSourceId,

    #[serde(default)]
    pub container: Option<String>,

    #[serde(default)]
    pub supports_direct_play: bool,

    #[serde(default)]
    pub supports_direct_stream: bool,

    #[serde(default)]
    pub supports_transcoding: bool,

    /// Server-issued, server-relative transcoding URL
    #[serde(default)]
    pub transcoding_url: Option<String>,

    /// "hls" when the transcoding URL is an adaptive manifest
    #[serde(default)]
    pub transcoding_sub_protocol: Option<String>,
}

impl MediaSourceInfo {
    /// Explicit adaptive-manifest signal from the server
    pub fn is_adaptive(&self) -> bool {
        self.transcoding_sub_protocol
            .as_deref()
            .is_some_and(|p| p.eq_ignore_ascii_case("hls"))
    }
}

/// A playable item as reported by the media server
///
/// The playback core only reads the id, type and sources; it never
/// mutates an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MediaItem {
    pub id: ItemId,

    #[serde(default)]
    pub name: String,

    /// Coarse media type (`MediaType` in server JSON)
    #[serde(default)]
    pub media_type: MediaType,

    /// Item type (`Type` in server JSON)
    #[serde(rename = "Type", default)]
    pub item_type: Option<MediaType>,

    #[serde(default)]
    pub run_time_ticks: Option<Ticks>,

    #[serde(default)]
    pub user_data: Option<UserItemData>,

    #[serde(default)]
    pub media_sources: Vec<MediaSourceInfo>,
}

impl MediaItem {
    /// Create a bare item with no sources
    pub fn new(id: impl Into<String>, name: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            id: ItemId::new(id),
            name: name.into(),
            media_type,
            item_type: None,
            run_time_ticks: None,
            user_data: None,
            media_sources: Vec::new(),
        }
    }

    /// Player family for this item
    ///
    /// The coarse media type wins; the item type is consulted when the coarse
    /// type is not playable.
    pub fn player_kind(&self) -> Option<PlayerKind> {
        self.media_type
            .player_kind()
            .or_else(|| self.item_type.and_then(MediaType::player_kind))
    }

    /// Saved resume position
    pub fn resume_position(&self) -> Ticks {
        self.user_data
            .as_ref()
            .map(|d| d.playback_position_ticks)
            .unwrap_or(Ticks::ZERO)
    }

    /// Look up a media source by id, or the first one when `id` is `None`
    pub fn media_source(&self, id: Option<&MediaSourceId>) -> Option<&MediaSourceInfo> {
        match id {
            Some(id) => self.media_sources.iter().find(|s| &s.id == id),
            None => self.media_sources.first(),
        }
    }
}
