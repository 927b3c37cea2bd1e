//! Media-element backed player
//!
//! Drives a [`MediaElement`] for either player family. Progressive streams
//! go straight to the element. Adaptive streams go through an
//! [`AdaptiveEngine`] session when one is available, fall back to native
//! manifest support, and fail with `UnsupportedDelivery` otherwise.
//!
//! Every play attempt takes a new load token. A `stop` or a newer `play`
//! invalidates it, and the superseded attempt returns
//! [`PlaybackError::Cancelled`] without touching the element again.

use super::{MediaElement, PlayerBackend};
use crate::adaptive::{
    AdaptiveEngine, AdaptiveError, AdaptiveSession, ManifestInfo, RecoveryAction, RecoveryBudget,
    RecoveryConfig, NATIVE_HLS_MIME,
};
use crate::error::{PlaybackError, Result};
use crate::events::{BackendEventKind, EventSender, MediaElementEvent};
use crate::types::{Generation, PlayOptions, PlaybackStart};
use crate::volume::{native_to_percent, percent_to_native};
use async_trait::async_trait;
use finseer_core::{
    CoreError, DeliveryMode, MediaItem, MediaType, PlayerKind, StreamInfo, StreamResolver, Ticks,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, trace, warn};
use url::Url;

/// Audio and subtitle stream selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectedStreams {
    pub audio: Option<i32>,
    pub subtitle: Option<i32>,
}

struct ActiveSession {
    session: Box<dyn AdaptiveSession>,
    budget: RecoveryBudget,
    /// Load token the session was attached under
    token: u64,
}

/// Player backend over a platform media element
pub struct HtmlMediaBackend {
    kind: PlayerKind,
    name: String,
    element: Arc<dyn MediaElement>,
    resolver: Option<Arc<dyn StreamResolver>>,
    adaptive: Option<Arc<dyn AdaptiveEngine>>,
    recovery: RecoveryConfig,

    events: Mutex<Option<EventSender>>,
    session: Mutex<Option<ActiveSession>>,
    streams: Mutex<SelectedStreams>,

    load_token: AtomicU64,
    generation: AtomicU64,

    /// Set once a source is on the element; native events are ignored otherwise
    loaded: AtomicBool,
}

impl HtmlMediaBackend {
    fn new(kind: PlayerKind, name: &str, element: Arc<dyn MediaElement>) -> Self {
        Self {
            kind,
            name: name.to_string(),
            element,
            resolver: None,
            adaptive: None,
            recovery: RecoveryConfig::default(),
            events: Mutex::new(None),
            session: Mutex::new(None),
            streams: Mutex::new(SelectedStreams::default()),
            load_token: AtomicU64::new(0),
            generation: AtomicU64::new(Generation::INITIAL.get()),
            loaded: AtomicBool::new(false),
        }
    }

    /// Backend for the video family
    pub fn video(element: Arc<dyn MediaElement>) -> Self {
        Self::new(PlayerKind::Video, "HtmlVideoPlayer", element)
    }

    /// Backend for the audio family
    pub fn audio(element: Arc<dyn MediaElement>) -> Self {
        Self::new(PlayerKind::Audio, "HtmlAudioPlayer", element)
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn StreamResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    #[must_use]
    pub fn with_adaptive(mut self, engine: Arc<dyn AdaptiveEngine>) -> Self {
        self.adaptive = Some(engine);
        self
    }

    #[must_use]
    pub fn with_recovery(mut self, recovery: RecoveryConfig) -> Self {
        self.recovery = recovery;
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn element(&self) -> &Arc<dyn MediaElement> {
        &self.element
    }

    /// Generation of the most recent play attempt
    pub fn generation(&self) -> Generation {
        Generation::new(self.generation.load(Ordering::SeqCst))
    }

    pub async fn selected_streams(&self) -> SelectedStreams {
        *self.streams.lock().await
    }

    /// Whether an adaptive session is currently attached
    pub async fn has_adaptive_session(&self) -> bool {
        self.session.lock().await.is_some()
    }

    fn is_cancelled(&self, token: u64) -> bool {
        self.load_token.load(Ordering::SeqCst) != token
    }

    fn invalidate_load(&self) {
        self.load_token.fetch_add(1, Ordering::SeqCst);
    }

    /// Drop the session attached by a superseded load, if it is still there
    async fn cancel_load(&self, token: u64) -> PlaybackError {
        let mut slot = self.session.lock().await;
        if slot.as_ref().is_some_and(|active| active.token == token) {
            if let Some(mut active) = slot.take() {
                debug!(player = %self.name, "Destroying session of cancelled load");
                active.session.destroy();
            }
        }
        PlaybackError::Cancelled
    }

    async fn emit(&self, event: BackendEventKind) {
        let sender = self.events.lock().await.clone();
        match sender {
            Some(sender) => {
                sender.send(self.generation(), event);
            }
            None => trace!(player = %self.name, ?event, "No event channel bound"),
        }
    }

    /// Destroy any session and clear the element
    async fn reset_media(&self) {
        self.loaded.store(false, Ordering::SeqCst);

        if let Some(mut active) = self.session.lock().await.take() {
            active.session.destroy();
        }

        self.element.pause();
        self.element.set_src(None);
        self.element.load();
    }

    async fn resolve_stream(&self, item: &MediaItem, options: &PlayOptions) -> Result<StreamInfo> {
        if let Some(url) = &options.url {
            let mut stream = StreamInfo::progressive(url.clone());
            stream.media_source_id.clone_from(&options.media_source_id);
            return Ok(stream);
        }

        let resolver = self.resolver.as_ref().ok_or_else(|| {
            CoreError::NoStream(format!("No stream resolver for item {}", item.id))
        })?;

        Ok(resolver
            .resolve(item, options.media_source_id.as_ref())
            .await?)
    }

    /// Retry `outcome` within `budget` until it succeeds or escalates
    async fn drive_recovery(
        &self,
        session: &mut dyn AdaptiveSession,
        budget: &mut RecoveryBudget,
        mut outcome: std::result::Result<ManifestInfo, AdaptiveError>,
        token: u64,
    ) -> Result<ManifestInfo> {
        loop {
            if self.is_cancelled(token) {
                return Err(PlaybackError::Cancelled);
            }

            let err = match outcome {
                Ok(info) => return Ok(info),
                Err(err) => err,
            };

            outcome = match budget.decide(&err) {
                RecoveryAction::Reload => {
                    warn!(player = %self.name, error = %err, "Fatal network error, reloading");
                    session.start_load().await
                }
                RecoveryAction::RecoverMedia => {
                    warn!(player = %self.name, error = %err, "Fatal media error, recovering");
                    session.recover_media_error().await
                }
                RecoveryAction::Escalate => return Err(PlaybackError::Adaptive(err)),
            };
        }
    }

    /// Put an adaptive stream on the element
    async fn load_adaptive(&self, url: &Url, token: u64) -> Result<()> {
        let engine = self.adaptive.as_ref().filter(|e| e.is_supported());

        let Some(engine) = engine else {
            if self.element.can_play_type(NATIVE_HLS_MIME) {
                debug!(player = %self.name, %url, "Using native HLS support");
                self.element.set_src(Some(url));
                return Ok(());
            }
            return Err(PlaybackError::UnsupportedDelivery(format!(
                "No adaptive engine or native HLS support for {url}"
            )));
        };

        let mut session = engine.create_session(Arc::clone(&self.element));
        let mut budget = RecoveryBudget::new(self.recovery);

        let first = session.load_source(url).await;
        match self
            .drive_recovery(session.as_mut(), &mut budget, first, token)
            .await
        {
            Ok(manifest) => {
                debug!(
                    player = %self.name,
                    variants = manifest.variants,
                    duration = ?manifest.duration,
                    is_live = manifest.is_live,
                    "Adaptive manifest ready"
                );
                let mut slot = self.session.lock().await;
                if self.is_cancelled(token) {
                    drop(slot);
                    session.destroy();
                    return Err(PlaybackError::Cancelled);
                }
                *slot = Some(ActiveSession {
                    session,
                    budget,
                    token,
                });
                Ok(())
            }
            Err(e) => {
                session.destroy();
                Err(e)
            }
        }
    }
}

#[async_trait]
impl PlayerBackend for HtmlMediaBackend {
    fn kind(&self) -> PlayerKind {
        self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn can_play_media_type(&self, media_type: MediaType) -> bool {
        media_type.player_kind() == Some(self.kind)
    }

    async fn bind_events(&self, sender: EventSender) {
        *self.events.lock().await = Some(sender);
    }

    async fn play(
        &self,
        item: &MediaItem,
        options: &PlayOptions,
        generation: Generation,
    ) -> Result<PlaybackStart> {
        let token = self.load_token.fetch_add(1, Ordering::SeqCst) + 1;
        self.generation.store(generation.get(), Ordering::SeqCst);
        self.reset_media().await;

        info!(player = %self.name, item = %item.id, %generation, "Starting playback");

        let stream = match self.resolve_stream(item, options).await {
            Ok(stream) => stream,
            Err(_) if self.is_cancelled(token) => return Err(PlaybackError::Cancelled),
            Err(e) => {
                warn!(player = %self.name, item = %item.id, error = %e, "Stream resolution failed");
                return Err(e);
            }
        };
        if self.is_cancelled(token) {
            return Err(PlaybackError::Cancelled);
        }

        {
            let mut streams = self.streams.lock().await;
            if let Some(index) = options.audio_stream_index {
                streams.audio = Some(index);
            }
            if let Some(index) = options.subtitle_stream_index {
                streams.subtitle = Some(index);
            }
        }

        let delivery = stream.delivery_mode();
        match delivery {
            DeliveryMode::Adaptive => {
                if let Err(e) = self.load_adaptive(&stream.url, token).await {
                    if !matches!(e, PlaybackError::Cancelled) {
                        error!(player = %self.name, url = %stream.url, error = %e, "Adaptive load failed");
                        self.reset_media().await;
                    }
                    return Err(e);
                }
            }
            DeliveryMode::Progressive => self.element.set_src(Some(&stream.url)),
        }

        if self.is_cancelled(token) {
            return Err(self.cancel_load(token).await);
        }

        self.element
            .set_current_time(options.start_position().as_seconds());
        self.loaded.store(true, Ordering::SeqCst);

        if let Err(reason) = self.element.play().await {
            if self.is_cancelled(token) {
                return Err(self.cancel_load(token).await);
            }
            warn!(player = %self.name, item = %item.id, %reason, "Native play rejected");
            self.reset_media().await;
            return Err(PlaybackError::NativePlay(reason));
        }

        if self.is_cancelled(token) {
            return Err(self.cancel_load(token).await);
        }

        debug!(player = %self.name, url = %stream.url, ?delivery, "Playback started");

        Ok(PlaybackStart {
            url: stream.url,
            delivery,
            play_method: stream.play_method,
            media_source_id: stream
                .media_source_id
                .or_else(|| options.media_source_id.clone()),
        })
    }

    async fn pause(&self) {
        self.element.pause();
    }

    async fn unpause(&self) -> Result<()> {
        self.element.play().await.map_err(|reason| {
            warn!(player = %self.name, %reason, "Resume rejected");
            PlaybackError::NativePlay(reason)
        })
    }

    async fn stop(&self, destroy: bool) {
        debug!(player = %self.name, destroy, "Stopping");
        self.invalidate_load();
        self.element.pause();
        if destroy {
            self.reset_media().await;
        }
    }

    async fn seek(&self, position: Ticks) {
        let mut seconds = position.as_seconds().max(0.0);
        if let Some(duration) = self.element.duration().filter(|d| d.is_finite() && *d > 0.0) {
            seconds = seconds.min(duration);
        }
        self.element.set_current_time(seconds);
    }

    fn set_volume(&self, percent: u8) {
        self.element.set_volume(percent_to_native(percent));
    }

    fn volume(&self) -> u8 {
        native_to_percent(self.element.volume())
    }

    fn set_mute(&self, muted: bool) {
        self.element.set_muted(muted);
    }

    fn is_muted(&self) -> bool {
        self.element.muted()
    }

    fn set_playback_rate(&self, rate: f64) {
        if rate.is_finite() && rate > 0.0 {
            self.element.set_playback_rate(rate);
        }
    }

    fn playback_rate(&self) -> f64 {
        self.element.playback_rate()
    }

    async fn set_audio_stream_index(&self, index: i32) {
        debug!(player = %self.name, index, "Audio stream selected");
        self.streams.lock().await.audio = Some(index);
    }

    async fn set_subtitle_stream_index(&self, index: i32) {
        debug!(player = %self.name, index, "Subtitle stream selected");
        self.streams.lock().await.subtitle = Some(index);
    }

    async fn handle_media_event(&self, event: MediaElementEvent) {
        if !self.loaded.load(Ordering::SeqCst) {
            trace!(player = %self.name, ?event, "Ignoring event with no source loaded");
            return;
        }

        let event = match event {
            MediaElementEvent::TimeUpdate => BackendEventKind::TimeUpdate {
                seconds: self.element.current_time(),
            },
            MediaElementEvent::DurationChange => match self.element.duration() {
                Some(seconds) if seconds.is_finite() => BackendEventKind::DurationChange { seconds },
                _ => return,
            },
            MediaElementEvent::Play | MediaElementEvent::Playing => BackendEventKind::Playing,
            MediaElementEvent::Pause => BackendEventKind::Paused,
            MediaElementEvent::Ended => BackendEventKind::Ended,
            MediaElementEvent::Waiting => BackendEventKind::Buffering,
            MediaElementEvent::Progress => BackendEventKind::Progress {
                buffered: self.element.buffered(),
            },
            MediaElementEvent::VolumeChange => BackendEventKind::VolumeChange {
                volume: self.volume(),
                muted: self.element.muted(),
            },
            MediaElementEvent::RateChange => BackendEventKind::RateChange {
                rate: self.element.playback_rate(),
            },
            MediaElementEvent::Error { message } => {
                error!(player = %self.name, %message, "Media element error");
                BackendEventKind::Error { message }
            }
        };

        self.emit(event).await;
    }

    async fn handle_adaptive_error(&self, error: AdaptiveError, fatal: bool) {
        if !fatal {
            debug!(player = %self.name, %error, "Non-fatal adaptive error");
            return;
        }

        let Some(mut active) = self.session.lock().await.take() else {
            debug!(player = %self.name, %error, "Adaptive error with no session");
            return;
        };

        let token = self.load_token.load(Ordering::SeqCst);
        let outcome = self
            .drive_recovery(active.session.as_mut(), &mut active.budget, Err(error), token)
            .await;

        match outcome {
            Ok(_) => {
                let mut slot = self.session.lock().await;
                if self.is_cancelled(token) || slot.is_some() {
                    drop(slot);
                    debug!(player = %self.name, "Recovered session was superseded");
                    active.session.destroy();
                } else {
                    info!(player = %self.name, "Adaptive stream recovered");
                    *slot = Some(active);
                }
            }
            Err(PlaybackError::Cancelled) => active.session.destroy(),
            Err(e) => {
                error!(player = %self.name, error = %e, "Adaptive stream failed");
                active.session.destroy();
                self.emit(BackendEventKind::Error {
                    message: e.to_string(),
                })
                .await;
                self.reset_media().await;
            }
        }
    }

    async fn destroy(&self) {
        self.stop(true).await;
        *self.events.lock().await = None;
    }
}

impl std::fmt::Debug for HtmlMediaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlMediaBackend")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("adaptive", &self.adaptive.is_some())
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}
