//! HLS session backed by an HTTP client and an m3u8 parser
//!
//! The session fetches and validates the manifest, follows a master
//! playlist to its first variant to learn the duration, then hands the
//! manifest URL to a media element that decodes HLS natively. Fetch
//! failures surface as [`AdaptiveError::Network`] so the backend can
//! reload; unparseable manifests are [`AdaptiveError::Other`].

use super::{AdaptiveEngine, AdaptiveError, AdaptiveSession, ManifestInfo};
use crate::backend::MediaElement;
use async_trait::async_trait;
use m3u8_rs::{MediaPlaylist, Playlist};
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Engine creating [`HlsSession`]s that share one HTTP client
#[derive(Debug, Clone, Default)]
pub struct HlsEngine {
    client: Client,
}

impl HlsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl AdaptiveEngine for HlsEngine {
    fn is_supported(&self) -> bool {
        true
    }

    fn create_session(&self, element: Arc<dyn MediaElement>) -> Box<dyn AdaptiveSession> {
        Box::new(HlsSession::new(self.client.clone(), element))
    }
}

/// One manifest session attached to a media element
pub struct HlsSession {
    client: Client,
    element: Arc<dyn MediaElement>,
    source: Option<Url>,
    manifest: Option<ManifestInfo>,
    attached: bool,
    destroyed: bool,
}

impl HlsSession {
    pub fn new(client: Client, element: Arc<dyn MediaElement>) -> Self {
        Self {
            client,
            element,
            source: None,
            manifest: None,
            attached: false,
            destroyed: false,
        }
    }

    /// Last parsed manifest
    pub fn manifest(&self) -> Option<&ManifestInfo> {
        self.manifest.as_ref()
    }

    async fn fetch_text(&self, url: &Url) -> Result<String, AdaptiveError> {
        debug!(%url, "Fetching HLS playlist");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AdaptiveError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdaptiveError::Network(format!(
                "HTTP {status} fetching {url}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AdaptiveError::Network(e.to_string()))
    }

    async fn fetch_manifest(&self, url: &Url) -> Result<ManifestInfo, AdaptiveError> {
        let content = self.fetch_text(url).await?;

        let parsed = m3u8_rs::parse_playlist_res(content.as_bytes())
            .map_err(|e| AdaptiveError::Other(format!("Failed to parse HLS manifest: {e:?}")))?;

        match parsed {
            Playlist::MediaPlaylist(media) => Ok(media_info(&media, 1)),
            Playlist::MasterPlaylist(master) => {
                let variants: Vec<_> = master.variants.iter().filter(|v| !v.is_i_frame).collect();
                let Some(first) = variants.first() else {
                    return Err(AdaptiveError::Other(
                        "Master playlist has no variants".to_string(),
                    ));
                };

                let variant_url = url.join(&first.uri).map_err(|e| {
                    AdaptiveError::Other(format!("Invalid variant URI '{}': {e}", first.uri))
                })?;

                let content = self.fetch_text(&variant_url).await?;
                let media = m3u8_rs::parse_media_playlist_res(content.as_bytes()).map_err(|e| {
                    AdaptiveError::Other(format!("Failed to parse HLS media playlist: {e:?}"))
                })?;

                Ok(media_info(&media, variants.len()))
            }
        }
    }

    /// Fetch the current source and (re)attach it to the element
    async fn load_current(&mut self) -> Result<ManifestInfo, AdaptiveError> {
        let url = self
            .source
            .clone()
            .ok_or_else(|| AdaptiveError::Other("No source loaded".to_string()))?;

        let info = self.fetch_manifest(&url).await?;

        if self.destroyed {
            return Err(AdaptiveError::Other("Session destroyed".to_string()));
        }

        self.attach(&url);
        debug!(%url, variants = info.variants, is_live = info.is_live, "HLS manifest parsed");
        self.manifest = Some(info.clone());
        Ok(info)
    }

    /// Point the element at `url`, keeping the position on re-attach
    fn attach(&mut self, url: &Url) {
        let position = self.attached.then(|| self.element.current_time());
        self.element.set_src(Some(url));
        if let Some(seconds) = position {
            self.element.set_current_time(seconds);
        }
        self.attached = true;
    }
}

#[async_trait]
impl AdaptiveSession for HlsSession {
    async fn load_source(&mut self, url: &Url) -> Result<ManifestInfo, AdaptiveError> {
        if self.destroyed {
            return Err(AdaptiveError::Other("Session destroyed".to_string()));
        }
        self.source = Some(url.clone());
        self.attached = false;
        self.load_current().await
    }

    async fn start_load(&mut self) -> Result<ManifestInfo, AdaptiveError> {
        warn!(source = ?self.source.as_ref().map(Url::as_str), "Reloading HLS manifest");
        self.load_current().await
    }

    async fn recover_media_error(&mut self) -> Result<ManifestInfo, AdaptiveError> {
        let (Some(url), Some(info)) = (self.source.clone(), self.manifest.clone()) else {
            return Err(AdaptiveError::Media("No manifest loaded".to_string()));
        };
        if self.destroyed {
            return Err(AdaptiveError::Other("Session destroyed".to_string()));
        }

        warn!(%url, "Re-attaching media after decode error");
        self.attach(&url);
        Ok(info)
    }

    fn destroy(&mut self) {
        self.destroyed = true;
        self.source = None;
        self.manifest = None;
    }
}

fn media_info(media: &MediaPlaylist, variants: usize) -> ManifestInfo {
    let duration = media
        .end_list
        .then(|| media.segments.iter().map(|s| f64::from(s.duration)).sum());

    ManifestInfo {
        duration,
        variants,
        is_live: !media.end_list,
    }
}
