//! Item lookup and stream URL resolution.

use crate::error::{Result, ServerClientError};
use crate::types::PlaybackInfoResponse;
use finseer_core::{
    ItemId, MediaItem, MediaSourceId, MediaSourceInfo, PlayMethod, PlayerKind, StreamInfo,
};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

/// Progressive URL for an item of the given family
///
/// `base_url` must already be normalized (no trailing slash).
pub fn progressive_url(base_url: &str, kind: PlayerKind, item_id: &ItemId) -> Result<Url> {
    let family = match kind {
        PlayerKind::Video => "Videos",
        PlayerKind::Audio => "Audio",
    };
    Ok(Url::parse(&format!(
        "{}/{}/{}/stream?static=true",
        base_url, family, item_id
    ))?)
}

/// Pick the delivery for one media source
///
/// A source the server will not direct-play but offers a transcoding URL
/// for is streamed through that URL; everything else is a static stream.
pub fn stream_for_source(
    base_url: &str,
    kind: PlayerKind,
    item_id: &ItemId,
    source: Option<&MediaSourceInfo>,
) -> Result<StreamInfo> {
    let media_source_id = source.map(|s| s.id.clone());

    if let Some(source) = source.filter(|s| !s.supports_direct_play) {
        if let Some(path) = source.transcoding_url.as_deref() {
            let url = Url::parse(&format!("{}{}", base_url, path))?;
            return Ok(StreamInfo {
                url,
                adaptive: source.is_adaptive(),
                play_method: PlayMethod::Transcode,
                media_source_id,
            });
        }
    }

    Ok(StreamInfo {
        url: progressive_url(base_url, kind, item_id)?,
        adaptive: false,
        play_method: PlayMethod::DirectPlay,
        media_source_id,
    })
}

/// Client for item and playback-info requests.
pub struct StreamingClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    authorization: &'a str,
    user_id: Option<&'a str>,
}

impl<'a> StreamingClient<'a> {
    pub(crate) fn new(
        http: &'a Client,
        base_url: &'a str,
        authorization: &'a str,
        user_id: Option<&'a str>,
    ) -> Self {
        Self {
            http,
            base_url,
            authorization,
            user_id,
        }
    }

    /// Fetch a single item.
    pub async fn get_item(&self, item_id: &ItemId) -> Result<MediaItem> {
        let url = format!("{}/Items/{}", self.base_url, item_id);
        debug!(url = %url, item_id = %item_id, "Fetching item");
        self.get_json(&url, item_id).await
    }

    /// Fetch the media sources the server offers for an item.
    pub async fn playback_info(&self, item_id: &ItemId) -> Result<PlaybackInfoResponse> {
        let url = format!("{}/Items/{}/PlaybackInfo", self.base_url, item_id);
        debug!(url = %url, item_id = %item_id, "Fetching playback info");

        let info: PlaybackInfoResponse = self.get_json(&url, item_id).await?;
        if let Some(code) = &info.error_code {
            warn!(item_id = %item_id, error_code = %code, "Server refused playback");
            return Err(ServerClientError::NoPlayableSource(item_id.to_string()));
        }
        Ok(info)
    }

    /// Resolve the play URL for `item`
    ///
    /// Uses the item's own media sources when present and asks the server
    /// for playback info otherwise.
    pub async fn resolve_stream(
        &self,
        item: &MediaItem,
        media_source_id: Option<&MediaSourceId>,
    ) -> Result<StreamInfo> {
        let kind = item
            .player_kind()
            .ok_or_else(|| ServerClientError::NoPlayableSource(item.id.to_string()))?;

        let fetched;
        let sources = if item.media_sources.is_empty() {
            fetched = self.playback_info(&item.id).await?.media_sources;
            &fetched
        } else {
            &item.media_sources
        };

        let source = match media_source_id {
            Some(id) => Some(
                sources
                    .iter()
                    .find(|s| &s.id == id)
                    .ok_or_else(|| ServerClientError::NotFound(id.to_string()))?,
            ),
            None => sources.first(),
        };

        let stream = stream_for_source(self.base_url, kind, &item.id, source)?;
        debug!(
            item_id = %item.id,
            play_method = ?stream.play_method,
            delivery = ?stream.delivery_mode(),
            "Resolved stream"
        );
        Ok(stream)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, item_id: &ItemId) -> Result<T> {
        let mut request = self.http.get(url).header(AUTHORIZATION, self.authorization);
        if let Some(user_id) = self.user_id {
            request = request.query(&[("userId", user_id)]);
        }

        let response = request.send().await.map_err(ServerClientError::from_send)?;
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| {
                ServerClientError::ParseError(format!("Failed to parse {}: {}", url, e))
            })
        } else if status.as_u16() == 401 {
            Err(ServerClientError::AuthRequired)
        } else if status.as_u16() == 404 {
            Err(ServerClientError::NotFound(item_id.to_string()))
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(ServerClientError::ServerError {
                status: status.as_u16(),
                message: error_text,
            })
        }
    }
}
