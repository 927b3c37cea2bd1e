//! Playback manager - core orchestration
//!
//! Owns the observable state, the play queue and the backend registry.
//! Routes each item to the backend for its player family, switches
//! backends when the family changes, and reconciles backend events into
//! the published state.
//!
//! Every play attempt increments a generation counter. Backends stamp
//! their events with the generation they were started under, and events
//! from any other generation are dropped, so a superseded attempt can
//! never overwrite the state of the current one.

use crate::{
    backend::PlayerBackend,
    error::{PlaybackError, Result},
    events::{self, BackendEvent, BackendEventKind, EventSender},
    queue::PlayQueue,
    registry::PlayerRegistry,
    types::{
        Generation, PlayOptions, PlaybackConfig, PlaybackPhase, PlaybackState, StateUpdate,
    },
};
use finseer_core::{MediaItem, PlayerKind, Ticks};
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Backend currently holding the media
struct ActivePlayer {
    kind: PlayerKind,
    backend: Weak<dyn PlayerBackend>,
}

/// Playback manager
///
/// Single owner of [`PlaybackState`]. All mutation goes through `&mut self`
/// methods; observers read snapshots via [`subscribe`](Self::subscribe).
pub struct PlaybackManager {
    config: PlaybackConfig,
    state: PlaybackState,
    state_tx: watch::Sender<PlaybackState>,
    queue: PlayQueue,
    registry: PlayerRegistry,
    active: Option<ActivePlayer>,
    generation: Generation,
    events_tx: mpsc::UnboundedSender<BackendEvent>,
    events_rx: mpsc::UnboundedReceiver<BackendEvent>,
}

impl PlaybackManager {
    /// Create new playback manager
    pub fn new(config: PlaybackConfig) -> Self {
        let state = PlaybackState::new(&config);
        let (state_tx, _) = watch::channel(state.clone());
        let (events_tx, events_rx) = events::channel();

        Self {
            config,
            state,
            state_tx,
            queue: PlayQueue::new(),
            registry: PlayerRegistry::new(),
            active: None,
            generation: Generation::INITIAL,
            events_tx,
            events_rx,
        }
    }

    // ===== Registration =====

    /// Register a backend for `kind`
    ///
    /// The manager keeps only a weak reference; dropping the last `Arc`
    /// unregisters the backend implicitly.
    ///
    /// # Errors
    /// - [`PlaybackError::InvalidOperation`] if the backend serves another kind
    /// - [`PlaybackError::PlayerAlreadyRegistered`] if a different live
    ///   backend holds the slot
    pub async fn register_player<B>(&mut self, kind: PlayerKind, backend: &Arc<B>) -> Result<()>
    where
        B: PlayerBackend + 'static,
    {
        if backend.kind() != kind {
            return Err(PlaybackError::InvalidOperation(format!(
                "{} serves {}, not {kind}",
                backend.name(),
                backend.kind()
            )));
        }

        let backend: Arc<dyn PlayerBackend> = backend.clone();
        self.registry.register(kind, &backend)?;
        backend
            .bind_events(EventSender::new(kind, self.events_tx.clone()))
            .await;

        info!(%kind, name = backend.name(), "Player registered");
        Ok(())
    }

    /// Unregister the backend for `kind`
    ///
    /// If it was active, playback state returns to idle and late events from
    /// it are ignored. Returns true if a live backend was removed.
    pub fn unregister_player(&mut self, kind: PlayerKind) -> bool {
        let removed = self.registry.unregister(kind);

        if self.active.as_ref().is_some_and(|a| a.kind == kind) {
            info!(%kind, "Active player unregistered");
            self.active = None;
            self.generation = self.generation.next();
            self.update_state(Self::idle_update());
        }

        removed
    }

    pub fn is_registered(&self, kind: PlayerKind) -> bool {
        self.registry.is_registered(kind)
    }

    // ===== Playback Control =====

    /// Replace the queue with `items` and play the first one
    ///
    /// An empty list is a no-op. On failure the queue and the current item
    /// are left as they were, paused with `last_error` set. The backend is
    /// released, so transport calls are no-ops until the next play.
    ///
    /// # Errors
    /// Routing errors ([`PlaybackError::NoBackend`]) are returned before any
    /// state changes; backend failures after the state has been rolled back.
    pub async fn play<I, T>(&mut self, items: I, options: PlayOptions) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<Arc<MediaItem>>,
    {
        let items: Vec<Arc<MediaItem>> = items.into_iter().map(Into::into).collect();
        if items.is_empty() {
            debug!("play() called with no items");
            return Ok(());
        }

        let first = Arc::clone(&items[0]);
        self.start(first, 0, Some(items), options).await
    }

    /// Replace the queue with one item and play it
    ///
    /// # Errors
    /// See [`play`](Self::play).
    pub async fn play_item(
        &mut self,
        item: impl Into<Arc<MediaItem>>,
        options: PlayOptions,
    ) -> Result<()> {
        self.play([item.into()], options).await
    }

    /// Play the queue entry at `index` without replacing the queue
    ///
    /// # Errors
    /// [`PlaybackError::IndexOutOfBounds`] or any error from
    /// [`play`](Self::play).
    pub async fn play_index(&mut self, index: usize, options: PlayOptions) -> Result<()> {
        let item = self
            .queue
            .get(index)
            .cloned()
            .ok_or(PlaybackError::IndexOutOfBounds {
                index,
                len: self.queue.len(),
            })?;
        self.start(item, index, None, options).await
    }

    /// Pause the active backend
    ///
    /// No-op without an active backend.
    pub async fn pause(&mut self) {
        let Some(backend) = self.active_backend() else {
            return;
        };
        backend.pause().await;
        self.update_state(StateUpdate::new().paused(true));
    }

    /// Resume the active backend
    ///
    /// No-op without an active backend.
    ///
    /// # Errors
    /// Returns the native rejection; state is put back to paused.
    pub async fn unpause(&mut self) -> Result<()> {
        let Some(backend) = self.active_backend() else {
            return Ok(());
        };

        self.update_state(StateUpdate::new().paused(false).is_ended(false));
        if let Err(e) = backend.unpause().await {
            warn!(error = %e, "Resume failed");
            self.update_state(
                StateUpdate::new()
                    .paused(true)
                    .last_error(Some(e.to_string())),
            );
            return Err(e);
        }
        Ok(())
    }

    /// Toggle between paused and playing
    ///
    /// # Errors
    /// See [`unpause`](Self::unpause).
    pub async fn toggle_pause(&mut self) -> Result<()> {
        if self.state.paused {
            self.unpause().await
        } else {
            self.pause().await;
            Ok(())
        }
    }

    /// Stop playback and release the active backend
    ///
    /// The queue is kept.
    pub async fn stop(&mut self) {
        if let Some(backend) = self.active_backend() {
            backend.stop(true).await;
        }
        self.active = None;
        self.generation = self.generation.next();
        self.update_state(Self::idle_update());
        info!("Playback stopped");
    }

    /// Play the next queue entry, or stop at the end of the queue
    ///
    /// # Errors
    /// Any error from starting the next item.
    #[allow(clippy::should_implement_trait)]
    pub async fn next(&mut self) -> Result<()> {
        let Some(next) = self.queue.next_item_info() else {
            debug!("End of queue");
            self.stop().await;
            return Ok(());
        };

        let (index, item) = (next.index, Arc::clone(next.item));
        self.start(item, index, None, PlayOptions::from_start()).await
    }

    /// Play the previous queue entry
    ///
    /// A no-op at the start of the queue. With a configured
    /// `previous_restart_threshold`, restarts the current item instead when
    /// playback is past the threshold.
    ///
    /// # Errors
    /// Any error from starting the previous item.
    pub async fn previous(&mut self) -> Result<()> {
        if let Some(threshold) = self.config.previous_restart_threshold {
            if self.state.current_item.is_some() && self.state.current_time > threshold {
                self.seek(Ticks::ZERO).await;
                return Ok(());
            }
        }

        let Some(index) = self.queue.previous_index() else {
            debug!("Start of queue");
            return Ok(());
        };

        let Some(item) = self.queue.get(index).cloned() else {
            return Ok(());
        };
        self.start(item, index, None, PlayOptions::from_start()).await
    }

    // ===== Seek =====

    /// Seek the active backend
    ///
    /// The position is reflected in state right away; the backend's next
    /// time update reconciles it. No-op without an active backend.
    pub async fn seek(&mut self, position: Ticks) {
        if let Some(backend) = self.active_backend() {
            backend.seek(position).await;
            self.update_state(StateUpdate::new().current_time(position.as_seconds()));
        }
    }

    // ===== Volume & Rate =====

    /// Set volume (0-100, clamped)
    pub fn set_volume(&mut self, volume: u8) {
        let volume = volume.min(100);
        if let Some(backend) = self.active_backend() {
            backend.set_volume(volume);
        }
        self.update_state(StateUpdate::new().volume(volume));
    }

    pub fn volume(&self) -> u8 {
        self.state.volume
    }

    pub fn set_mute(&mut self, muted: bool) {
        if let Some(backend) = self.active_backend() {
            backend.set_mute(muted);
        }
        self.update_state(StateUpdate::new().muted(muted));
    }

    pub fn toggle_mute(&mut self) {
        self.set_mute(!self.state.muted);
    }

    pub fn is_muted(&self) -> bool {
        self.state.muted
    }

    /// Set playback rate
    ///
    /// # Errors
    /// [`PlaybackError::InvalidPlaybackRate`] unless `rate` is finite and positive.
    pub fn set_playback_rate(&mut self, rate: f64) -> Result<()> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(PlaybackError::InvalidPlaybackRate(rate));
        }
        if let Some(backend) = self.active_backend() {
            backend.set_playback_rate(rate);
        }
        self.update_state(StateUpdate::new().playback_rate(rate));
        Ok(())
    }

    // ===== Stream Selection =====

    /// Select an audio stream on the active backend
    pub async fn set_audio_stream_index(&mut self, index: i32) {
        if let Some(backend) = self.active_backend() {
            backend.set_audio_stream_index(index).await;
        }
    }

    /// Select a subtitle stream on the active backend
    pub async fn set_subtitle_stream_index(&mut self, index: i32) {
        if let Some(backend) = self.active_backend() {
            backend.set_subtitle_stream_index(index).await;
        }
    }

    // ===== State =====

    /// Current state snapshot
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.state.phase()
    }

    /// Receive a snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state_tx.subscribe()
    }

    /// Merge a partial update into the state and publish it
    pub fn report_state(&mut self, update: StateUpdate) {
        self.update_state(update);
    }

    pub fn queue(&self) -> &PlayQueue {
        &self.queue
    }

    pub fn current_item(&self) -> Option<&Arc<MediaItem>> {
        self.state.current_item.as_ref()
    }

    /// Generation of the most recent play attempt
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn active_player_kind(&self) -> Option<PlayerKind> {
        self.active_backend().map(|b| b.kind())
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    // ===== Backend Events =====

    /// Apply one backend event
    ///
    /// Events from another generation or from a backend that is not active
    /// are dropped. `Ended` advances the queue.
    ///
    /// # Errors
    /// Errors from advancing to the next item after `Ended`.
    pub async fn handle_event(&mut self, event: BackendEvent) -> Result<()> {
        let active_kind = self.active.as_ref().map(|a| a.kind);
        if event.generation != self.generation || active_kind != Some(event.kind) {
            debug!(
                kind = %event.kind,
                event_generation = %event.generation,
                current_generation = %self.generation,
                "Discarding stale backend event"
            );
            return Ok(());
        }

        match event.event {
            BackendEventKind::TimeUpdate { seconds } => {
                self.update_state(StateUpdate::new().current_time(seconds));
            }
            BackendEventKind::DurationChange { seconds } => {
                self.update_state(StateUpdate::new().duration(seconds));
            }
            BackendEventKind::Playing => {
                self.update_state(
                    StateUpdate::new()
                        .paused(false)
                        .is_buffering(false)
                        .is_ended(false),
                );
            }
            BackendEventKind::Paused => {
                self.update_state(StateUpdate::new().paused(true));
            }
            BackendEventKind::Buffering => {
                self.update_state(StateUpdate::new().is_buffering(true));
            }
            BackendEventKind::Progress { buffered } => {
                self.update_state(StateUpdate::new().buffered(buffered));
            }
            BackendEventKind::VolumeChange { volume, muted } => {
                self.update_state(StateUpdate::new().volume(volume).muted(muted));
            }
            BackendEventKind::RateChange { rate } => {
                self.update_state(StateUpdate::new().playback_rate(rate));
            }
            BackendEventKind::Error { message } => {
                error!(kind = %event.kind, %message, "Playback error");
                self.update_state(
                    StateUpdate::new()
                        .paused(true)
                        .is_buffering(false)
                        .last_error(Some(message)),
                );
            }
            BackendEventKind::Ended => {
                info!(kind = %event.kind, "Item ended");
                self.update_state(StateUpdate::new().is_ended(true).is_buffering(false));
                return self.next().await;
            }
        }

        Ok(())
    }

    /// Apply every event already queued; returns how many were processed
    ///
    /// Handling errors are logged and do not stop the drain.
    pub async fn pump_events(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            if let Err(e) = self.handle_event(event).await {
                warn!(error = %e, "Failed to handle backend event");
            }
            processed += 1;
        }
        processed
    }

    /// Wait for the next backend event and apply it
    ///
    /// # Errors
    /// See [`handle_event`](Self::handle_event).
    pub async fn process_next_event(&mut self) -> Result<()> {
        match self.events_rx.recv().await {
            Some(event) => self.handle_event(event).await,
            None => Ok(()),
        }
    }

    // ===== Internal =====

    fn active_backend(&self) -> Option<Arc<dyn PlayerBackend>> {
        self.active.as_ref().and_then(|a| a.backend.upgrade())
    }

    fn update_state(&mut self, update: StateUpdate) {
        self.state.apply(update);
        self.state_tx.send_replace(self.state.clone());
    }

    fn idle_update() -> StateUpdate {
        StateUpdate::new()
            .paused(false)
            .current_time(0.0)
            .duration(0.0)
            .buffered(None)
            .is_buffering(false)
            .is_ended(false)
            .current_item(None)
            .current_media_source(None)
            .play_method(None)
    }

    fn sync_settings(&self, backend: &dyn PlayerBackend) {
        backend.set_volume(self.state.volume);
        backend.set_mute(self.state.muted);
        backend.set_playback_rate(self.state.playback_rate);
    }

    /// Route `item` to its backend and start it
    ///
    /// `new_queue` replaces the queue on success; `index` becomes the
    /// current index on success either way.
    async fn start(
        &mut self,
        item: Arc<MediaItem>,
        index: usize,
        new_queue: Option<Vec<Arc<MediaItem>>>,
        options: PlayOptions,
    ) -> Result<()> {
        let backend = match self.registry.resolve(&item) {
            Ok(backend) => backend,
            Err(e) => {
                warn!(item = %item.id, media_type = %item.media_type, error = %e, "No player for item");
                return Err(e);
            }
        };

        let previous_backend = self.active_backend();
        let switched = match &previous_backend {
            Some(previous) if !Arc::ptr_eq(previous, &backend) => {
                info!(
                    from = previous.name(),
                    to = backend.name(),
                    "Switching player backend"
                );
                previous.stop(true).await;
                true
            }
            Some(_) => false,
            None => true,
        };

        self.generation = self.generation.next();
        let generation = self.generation;
        let snapshot = self.state.clone();

        self.active = Some(ActivePlayer {
            kind: backend.kind(),
            backend: Arc::downgrade(&backend),
        });
        self.sync_settings(backend.as_ref());
        self.update_state(
            StateUpdate::new()
                .current_item(Some(Arc::clone(&item)))
                .paused(false)
                .is_ended(false)
                .current_time(0.0)
                .duration(0.0)
                .buffered(None),
        );

        info!(
            item = %item.id,
            name = %item.name,
            player = backend.name(),
            %generation,
            "Starting item"
        );

        match backend.play(&item, &options, generation).await {
            Ok(started) => {
                if let Some(items) = new_queue {
                    self.queue.set_playlist(items);
                }
                self.queue.set_playlist_index(index)?;

                self.update_state(
                    StateUpdate::new()
                        .current_media_source(started.media_source_id)
                        .play_method(Some(started.play_method))
                        .last_error(None),
                );
                debug!(url = %started.url, delivery = ?started.delivery, "Backend accepted item");
                Ok(())
            }
            Err(e) => {
                error!(item = %item.id, player = backend.name(), error = %e, "Playback failed");

                // The backend has already dropped its media; only a newer
                // attempt on it (Cancelled) still owns the element.
                let released = switched || !matches!(e, PlaybackError::Cancelled);
                if released {
                    self.active = None;
                }

                self.state = snapshot;
                let mut update = StateUpdate::new()
                    .paused(true)
                    .is_buffering(false)
                    .last_error(Some(e.to_string()));
                if released {
                    update = update.current_time(0.0).duration(0.0).buffered(None);
                }
                self.update_state(update);
                Err(e)
            }
        }
    }
}

impl Default for PlaybackManager {
    fn default() -> Self {
        Self::new(PlaybackConfig::default())
    }
}

impl std::fmt::Debug for PlaybackManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackManager")
            .field("state", &self.state)
            .field("queue_len", &self.queue.len())
            .field("registry", &self.registry)
            .field("active", &self.active.as_ref().map(|a| a.kind))
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
