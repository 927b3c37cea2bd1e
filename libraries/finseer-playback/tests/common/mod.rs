//! Shared fakes for playback integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use finseer_core::{
    CoreError, MediaItem, MediaSourceId, MediaType, PlayMethod, PlayerKind, StreamInfo,
    StreamResolver,
};
use finseer_playback::{
    AdaptiveEngine, AdaptiveError, AdaptiveSession, BufferedRange, HtmlMediaBackend,
    ManifestInfo, MediaElement, PlaybackConfig, PlaybackManager,
};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, Once};
use tokio::sync::Notify;
use url::Url;

pub const BASE_URL: &str = "https://jf.example";

static INIT: Once = Once::new();

/// Route crate logs to the test writer (once per test binary)
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

// ============================================================================
// Media element
// ============================================================================

#[derive(Debug)]
pub struct ElementState {
    pub src: Option<Url>,
    pub src_history: Vec<Option<Url>>,
    pub current_time: f64,
    pub duration: Option<f64>,
    pub buffered: Option<BufferedRange>,
    pub volume: f64,
    pub muted: bool,
    pub playback_rate: f64,
    pub paused: bool,
    pub load_calls: usize,
    pub play_calls: usize,
    pub pause_calls: usize,
}

impl Default for ElementState {
    fn default() -> Self {
        Self {
            src: None,
            src_history: Vec::new(),
            current_time: 0.0,
            duration: None,
            buffered: None,
            volume: 1.0,
            muted: false,
            playback_rate: 1.0,
            paused: true,
            load_calls: 0,
            play_calls: 0,
            pause_calls: 0,
        }
    }
}

/// Ordered element calls shared between several fake elements
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Scriptable in-memory media element
#[derive(Default)]
pub struct FakeElement {
    pub state: Mutex<ElementState>,
    play_results: Mutex<VecDeque<Result<(), String>>>,
    play_gate: Mutex<Option<Arc<Notify>>>,
    native_hls: bool,
    journal: Option<(CallLog, &'static str)>,
}

impl FakeElement {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Element that appends `label:call` entries to a shared log
    pub fn journaled(log: CallLog, label: &'static str) -> Arc<Self> {
        Arc::new(Self {
            journal: Some((log, label)),
            ..Self::default()
        })
    }

    fn record(&self, call: &str) {
        if let Some((log, label)) = &self.journal {
            log.lock().unwrap().push(format!("{label}:{call}"));
        }
    }

    /// Element that reports built-in HLS support
    pub fn with_native_hls() -> Arc<Self> {
        Arc::new(Self {
            native_hls: true,
            ..Self::default()
        })
    }

    /// Queue the result of the next `play()` call
    pub fn push_play_result(&self, result: Result<(), String>) {
        self.play_results.lock().unwrap().push_back(result);
    }

    /// Make the next `play()` wait until the returned gate is notified
    pub fn gate_play(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.play_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn src(&self) -> Option<Url> {
        self.state.lock().unwrap().src.clone()
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    pub fn set_position(&self, seconds: f64) {
        self.state.lock().unwrap().current_time = seconds;
    }

    pub fn set_duration(&self, seconds: Option<f64>) {
        self.state.lock().unwrap().duration = seconds;
    }
}

#[async_trait]
impl MediaElement for FakeElement {
    fn set_src(&self, url: Option<&Url>) {
        self.record(if url.is_some() { "set_src" } else { "clear_src" });
        let mut state = self.state.lock().unwrap();
        state.src = url.cloned();
        state.src_history.push(url.cloned());
    }

    fn load(&self) {
        let mut state = self.state.lock().unwrap();
        state.load_calls += 1;
        state.current_time = 0.0;
        state.duration = None;
    }

    async fn play(&self) -> Result<(), String> {
        self.record("play");
        let gate = self.play_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let result = self
            .play_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()));

        let mut state = self.state.lock().unwrap();
        state.play_calls += 1;
        if result.is_ok() {
            state.paused = false;
        }
        result
    }

    fn pause(&self) {
        self.record("pause");
        let mut state = self.state.lock().unwrap();
        state.pause_calls += 1;
        state.paused = true;
    }

    fn current_time(&self) -> f64 {
        self.state.lock().unwrap().current_time
    }

    fn set_current_time(&self, seconds: f64) {
        self.state.lock().unwrap().current_time = seconds;
    }

    fn duration(&self) -> Option<f64> {
        self.state.lock().unwrap().duration
    }

    fn buffered(&self) -> Option<BufferedRange> {
        self.state.lock().unwrap().buffered
    }

    fn volume(&self) -> f64 {
        self.state.lock().unwrap().volume
    }

    fn set_volume(&self, volume: f64) {
        self.state.lock().unwrap().volume = volume;
    }

    fn muted(&self) -> bool {
        self.state.lock().unwrap().muted
    }

    fn set_muted(&self, muted: bool) {
        self.state.lock().unwrap().muted = muted;
    }

    fn playback_rate(&self) -> f64 {
        self.state.lock().unwrap().playback_rate
    }

    fn set_playback_rate(&self, rate: f64) {
        self.state.lock().unwrap().playback_rate = rate;
    }

    fn can_play_type(&self, mime: &str) -> bool {
        self.native_hls && mime == finseer_playback::adaptive::NATIVE_HLS_MIME
    }
}

// ============================================================================
// Stream resolver
// ============================================================================

/// Resolver producing server-style URLs
///
/// Items listed in `adaptive` resolve to an HLS manifest; items in `failing`
/// fail resolution.
#[derive(Default)]
pub struct FakeResolver {
    pub adaptive: Mutex<HashSet<String>>,
    pub failing: Mutex<HashSet<String>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn mark_adaptive(&self, id: &str) {
        self.adaptive.lock().unwrap().insert(id.to_string());
    }

    pub fn mark_failing(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl StreamResolver for FakeResolver {
    async fn resolve(
        &self,
        item: &MediaItem,
        media_source_id: Option<&MediaSourceId>,
    ) -> finseer_core::Result<StreamInfo> {
        let id = item.id.as_str().to_string();
        self.calls.lock().unwrap().push(id.clone());

        if self.failing.lock().unwrap().contains(&id) {
            return Err(CoreError::NoStream(id));
        }

        if self.adaptive.lock().unwrap().contains(&id) {
            let url = Url::parse(&format!("{BASE_URL}/videos/{id}/master.m3u8"))?;
            return Ok(StreamInfo {
                url,
                adaptive: true,
                play_method: PlayMethod::Transcode,
                media_source_id: media_source_id.cloned(),
            });
        }

        Ok(StreamInfo {
            url: stream_url(item),
            adaptive: false,
            play_method: PlayMethod::DirectPlay,
            media_source_id: media_source_id.cloned(),
        })
    }
}

/// Progressive URL for an item
pub fn stream_url(item: &MediaItem) -> Url {
    let family = match item.player_kind() {
        Some(PlayerKind::Audio) => "Audio",
        _ => "Videos",
    };
    Url::parse(&format!(
        "{BASE_URL}/{family}/{}/stream?static=true",
        item.id
    ))
    .unwrap()
}

// ============================================================================
// Adaptive engine
// ============================================================================

/// Adaptive engine whose sessions follow a shared script
///
/// Each `load_source`, `start_load` and `recover_media_error` pops the
/// next scripted outcome (success when the script is empty). Calls are
/// recorded in `log`.
pub struct FakeAdaptiveEngine {
    pub supported: bool,
    pub script: Arc<Mutex<VecDeque<Result<ManifestInfo, AdaptiveError>>>>,
    pub log: Arc<Mutex<Vec<&'static str>>>,
}

impl FakeAdaptiveEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            supported: true,
            script: Arc::default(),
            log: Arc::default(),
        })
    }

    pub fn unsupported() -> Arc<Self> {
        Arc::new(Self {
            supported: false,
            script: Arc::default(),
            log: Arc::default(),
        })
    }

    pub fn push(&self, outcome: Result<ManifestInfo, AdaptiveError>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.log.lock().unwrap().clone()
    }
}

impl AdaptiveEngine for FakeAdaptiveEngine {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn create_session(&self, element: Arc<dyn MediaElement>) -> Box<dyn AdaptiveSession> {
        self.log.lock().unwrap().push("create_session");
        Box::new(FakeAdaptiveSession {
            element,
            script: self.script.clone(),
            log: self.log.clone(),
        })
    }
}

struct FakeAdaptiveSession {
    element: Arc<dyn MediaElement>,
    script: Arc<Mutex<VecDeque<Result<ManifestInfo, AdaptiveError>>>>,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl FakeAdaptiveSession {
    fn next_outcome(&self, call: &'static str) -> Result<ManifestInfo, AdaptiveError> {
        self.log.lock().unwrap().push(call);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(vod_manifest()))
    }
}

#[async_trait]
impl AdaptiveSession for FakeAdaptiveSession {
    async fn load_source(&mut self, url: &Url) -> Result<ManifestInfo, AdaptiveError> {
        self.element.set_src(Some(url));
        self.next_outcome("load_source")
    }

    async fn start_load(&mut self) -> Result<ManifestInfo, AdaptiveError> {
        self.next_outcome("start_load")
    }

    async fn recover_media_error(&mut self) -> Result<ManifestInfo, AdaptiveError> {
        self.next_outcome("recover_media_error")
    }

    fn destroy(&mut self) {
        self.log.lock().unwrap().push("destroy");
    }
}

pub fn vod_manifest() -> ManifestInfo {
    ManifestInfo {
        duration: Some(60.0),
        variants: 1,
        is_live: false,
    }
}

// ============================================================================
// Items and fixtures
// ============================================================================

pub fn video_item(id: &str) -> Arc<MediaItem> {
    Arc::new(MediaItem::new(id, format!("Video {id}"), MediaType::Movie))
}

pub fn episode_item(id: &str) -> Arc<MediaItem> {
    Arc::new(MediaItem::new(id, format!("Episode {id}"), MediaType::Episode))
}

pub fn audio_item(id: &str) -> Arc<MediaItem> {
    Arc::new(MediaItem::new(id, format!("Track {id}"), MediaType::Audio))
}

/// Manager with a video and an audio backend registered
pub struct Fixture {
    pub manager: PlaybackManager,
    pub calls: CallLog,
    pub resolver: Arc<FakeResolver>,
    pub video_element: Arc<FakeElement>,
    pub video: Arc<HtmlMediaBackend>,
    pub audio_element: Arc<FakeElement>,
    pub audio: Arc<HtmlMediaBackend>,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_config(PlaybackConfig::default()).await
    }

    pub async fn with_config(config: PlaybackConfig) -> Self {
        init_logging();
        let resolver = FakeResolver::new();
        let calls = CallLog::default();
        let video_element = FakeElement::journaled(calls.clone(), "video");
        let audio_element = FakeElement::journaled(calls.clone(), "audio");

        let video = Arc::new(
            HtmlMediaBackend::video(video_element.clone()).with_resolver(resolver.clone()),
        );
        let audio = Arc::new(
            HtmlMediaBackend::audio(audio_element.clone()).with_resolver(resolver.clone()),
        );

        let mut manager = PlaybackManager::new(config);
        manager
            .register_player(PlayerKind::Video, &video)
            .await
            .unwrap();
        manager
            .register_player(PlayerKind::Audio, &audio)
            .await
            .unwrap();

        Self {
            manager,
            calls,
            resolver,
            video_element,
            video,
            audio_element,
            audio,
        }
    }
}
