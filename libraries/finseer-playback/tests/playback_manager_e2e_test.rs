//! End-to-end tests for PlaybackManager
//!
//! Drives the manager against media-element backends over fake elements:
//! - Routing by media type
//! - Optimistic state updates and rollback on failure
//! - Backend event reconciliation
//! - Queue advance on end of media
//! - Volume, mute and rate control
//! - Registration rules

mod common;

use common::*;
use finseer_core::{MediaType, PlayMethod, PlayerKind, Ticks};
use finseer_playback::{
    HtmlMediaBackend, MediaElementEvent, PlayOptions, PlaybackConfig, PlaybackError,
    PlaybackManager, PlaybackPhase, PlayerBackend,
};
use std::sync::Arc;

// ============================================================================
// Routing
// ============================================================================

#[tokio::test]
async fn play_routes_video_family_to_video_backend() {
    let mut fx = Fixture::new().await;
    let item = episode_item("ep1");

    fx.manager
        .play_item(item.clone(), PlayOptions::default())
        .await
        .unwrap();

    assert_eq!(fx.manager.active_player_kind(), Some(PlayerKind::Video));
    assert_eq!(fx.video_element.src(), Some(stream_url(&item)));
    assert!(fx.audio_element.src().is_none());
    assert!(!fx.video_element.is_paused());

    let state = fx.manager.state();
    assert_eq!(state.current_item.as_deref(), Some(item.as_ref()));
    assert_eq!(state.play_method, Some(PlayMethod::DirectPlay));
    assert!(!state.paused);
    assert_eq!(fx.manager.queue().current_playlist_index(), Some(0));
}

#[tokio::test]
async fn play_routes_audio_to_audio_backend() {
    let mut fx = Fixture::new().await;
    let track = audio_item("t1");

    fx.manager
        .play_item(track.clone(), PlayOptions::default())
        .await
        .unwrap();

    assert_eq!(fx.manager.active_player_kind(), Some(PlayerKind::Audio));
    assert_eq!(
        fx.audio_element.src().unwrap().as_str(),
        "https://jf.example/Audio/t1/stream?static=true"
    );
}

#[tokio::test]
async fn play_without_backend_for_kind_leaves_state_untouched() {
    let element = FakeElement::new();
    let video = Arc::new(HtmlMediaBackend::video(element).with_resolver(FakeResolver::new()));
    let mut manager = PlaybackManager::default();
    manager
        .register_player(PlayerKind::Video, &video)
        .await
        .unwrap();

    let before = manager.state().clone();
    let err = manager
        .play_item(audio_item("t1"), PlayOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PlaybackError::NoBackend {
            media_type: MediaType::Audio,
            kind: Some(PlayerKind::Audio)
        }
    ));
    assert!(err.is_recoverable());
    assert_eq!(manager.state(), &before);
    assert!(manager.queue().is_empty());
    assert_eq!(manager.generation().get(), 0);
}

#[tokio::test]
async fn unplayable_media_type_is_a_routing_error() {
    let mut fx = Fixture::new().await;
    let photo = Arc::new(finseer_core::MediaItem::new("p", "Photo", MediaType::Photo));

    let err = fx
        .manager
        .play_item(photo, PlayOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PlaybackError::NoBackend { kind: None, .. }));
    assert_eq!(fx.manager.phase(), PlaybackPhase::Idle);
}

#[tokio::test]
async fn empty_play_is_a_no_op() {
    let mut fx = Fixture::new().await;
    let none: Vec<Arc<finseer_core::MediaItem>> = Vec::new();

    fx.manager.play(none, PlayOptions::default()).await.unwrap();

    assert_eq!(fx.manager.phase(), PlaybackPhase::Idle);
    assert!(fx.manager.active_player_kind().is_none());
}

// ============================================================================
// Start position and options
// ============================================================================

#[tokio::test]
async fn start_position_is_applied_in_seconds() {
    let mut fx = Fixture::new().await;

    fx.manager
        .play_item(
            video_item("m"),
            PlayOptions::default().with_start_position(Ticks::new(300_000_000)),
        )
        .await
        .unwrap();

    assert_eq!(fx.video_element.state.lock().unwrap().current_time, 30.0);
}

#[tokio::test]
async fn explicit_url_bypasses_resolution() {
    let mut fx = Fixture::new().await;
    let url = url::Url::parse("https://cdn.example/movie.mp4").unwrap();

    fx.manager
        .play_item(video_item("m"), PlayOptions::from_start().with_url(url.clone()))
        .await
        .unwrap();

    assert_eq!(fx.resolver.call_count(), 0);
    assert_eq!(fx.video_element.src(), Some(url));
}

#[tokio::test]
async fn media_source_is_reported_in_state() {
    let mut fx = Fixture::new().await;

    fx.manager
        .play_item(
            video_item("m"),
            PlayOptions::default().with_media_source(finseer_core::MediaSourceId::new("src1")),
        )
        .await
        .unwrap();

    assert_eq!(
        fx.manager
            .state()
            .current_media_source
            .as_ref()
            .map(|s| s.as_str()),
        Some("src1")
    );
}

// ============================================================================
// Failure rollback
// ============================================================================

#[tokio::test]
async fn native_play_rejection_restores_previous_state() {
    let mut fx = Fixture::new().await;
    let first = video_item("a");
    fx.manager
        .play(vec![first.clone(), video_item("b")], PlayOptions::default())
        .await
        .unwrap();

    fx.video_element
        .push_play_result(Err("NotAllowedError".to_string()));
    let err = fx.manager.next().await.unwrap_err();

    assert!(matches!(err, PlaybackError::NativePlay(_)));
    let state = fx.manager.state();
    assert_eq!(state.current_item.as_deref(), Some(first.as_ref()));
    assert!(state.paused);
    assert!(state.last_error.as_deref().unwrap().contains("NotAllowedError"));
    assert_eq!(fx.manager.queue().current_playlist_index(), Some(0));
}

#[tokio::test]
async fn failed_next_releases_backend_so_resume_is_a_no_op() {
    let mut fx = Fixture::new().await;
    fx.manager
        .play(vec![video_item("a"), video_item("b")], PlayOptions::default())
        .await
        .unwrap();
    fx.video_element.set_duration(Some(100.0));
    fx.video_element.set_position(20.0);
    fx.video.handle_media_event(MediaElementEvent::DurationChange).await;
    fx.video.handle_media_event(MediaElementEvent::TimeUpdate).await;
    fx.manager.pump_events().await;

    fx.video_element
        .push_play_result(Err("NotAllowedError".to_string()));
    assert!(fx.manager.next().await.is_err());

    assert!(fx.video_element.src().is_none());
    assert!(fx.manager.active_player_kind().is_none());
    let state = fx.manager.state();
    assert_eq!(state.current_item.as_ref().map(|i| i.id.as_str()), Some("a"));
    assert_eq!(state.current_time, 0.0);
    assert_eq!(state.duration, 0.0);
    assert_eq!(fx.manager.phase(), PlaybackPhase::Paused);

    let play_calls = fx.video_element.state.lock().unwrap().play_calls;
    fx.manager.unpause().await.unwrap();
    fx.manager.seek(Ticks::from_seconds(10.0)).await;

    assert_eq!(fx.manager.phase(), PlaybackPhase::Paused);
    assert!(fx.manager.state().paused);
    assert_eq!(fx.manager.state().current_time, 0.0);
    assert_eq!(fx.video_element.state.lock().unwrap().play_calls, play_calls);

    // A fresh play picks the backend up again
    fx.manager.play_index(1, PlayOptions::default()).await.unwrap();
    assert_eq!(fx.manager.active_player_kind(), Some(PlayerKind::Video));
}

#[tokio::test]
async fn failed_first_play_does_not_replace_queue() {
    let mut fx = Fixture::new().await;
    fx.resolver.mark_failing("bad");

    let err = fx
        .manager
        .play(vec![video_item("bad"), video_item("ok")], PlayOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PlaybackError::Stream(_)));
    assert!(fx.manager.queue().is_empty());
    assert!(fx.manager.state().current_item.is_none());
    assert!(fx.manager.state().last_error.is_some());
    assert!(fx.manager.active_player_kind().is_none());
}

#[tokio::test]
async fn successful_play_clears_last_error() {
    let mut fx = Fixture::new().await;
    fx.resolver.mark_failing("bad");

    let _ = fx
        .manager
        .play_item(video_item("bad"), PlayOptions::default())
        .await;
    assert!(fx.manager.state().last_error.is_some());

    fx.manager
        .play_item(video_item("good"), PlayOptions::default())
        .await
        .unwrap();
    assert!(fx.manager.state().last_error.is_none());
}

// ============================================================================
// Backend events
// ============================================================================

#[tokio::test]
async fn element_events_update_state() {
    let mut fx = Fixture::new().await;
    fx.manager
        .play_item(video_item("m"), PlayOptions::default())
        .await
        .unwrap();
    assert_eq!(fx.manager.phase(), PlaybackPhase::Loading);

    fx.video_element.set_duration(Some(120.0));
    fx.video_element.set_position(12.5);
    fx.video.handle_media_event(MediaElementEvent::DurationChange).await;
    fx.video.handle_media_event(MediaElementEvent::TimeUpdate).await;
    fx.video.handle_media_event(MediaElementEvent::Playing).await;

    assert_eq!(fx.manager.pump_events().await, 3);

    let state = fx.manager.state();
    assert_eq!(state.duration, 120.0);
    assert_eq!(state.current_time, 12.5);
    assert_eq!(fx.manager.phase(), PlaybackPhase::Playing);
}

#[tokio::test]
async fn waiting_and_playing_toggle_buffering() {
    let mut fx = Fixture::new().await;
    fx.manager
        .play_item(video_item("m"), PlayOptions::default())
        .await
        .unwrap();

    fx.video.handle_media_event(MediaElementEvent::Waiting).await;
    fx.manager.pump_events().await;
    assert!(fx.manager.state().is_buffering);

    fx.video.handle_media_event(MediaElementEvent::Playing).await;
    fx.manager.pump_events().await;
    assert!(!fx.manager.state().is_buffering);
}

#[tokio::test]
async fn element_error_marks_state() {
    let mut fx = Fixture::new().await;
    fx.manager
        .play_item(video_item("m"), PlayOptions::default())
        .await
        .unwrap();

    fx.video
        .handle_media_event(MediaElementEvent::Error {
            message: "MEDIA_ERR_DECODE".to_string(),
        })
        .await;
    fx.manager.pump_events().await;

    let state = fx.manager.state();
    assert!(state.paused);
    assert_eq!(state.last_error.as_deref(), Some("MEDIA_ERR_DECODE"));
}

#[tokio::test]
async fn ended_advances_to_next_item_from_start() {
    let mut fx = Fixture::new().await;
    let b = video_item("b");
    fx.manager
        .play(vec![video_item("a"), b.clone()], PlayOptions::default())
        .await
        .unwrap();

    fx.video_element.set_position(90.0);
    fx.video.handle_media_event(MediaElementEvent::Ended).await;
    fx.manager.pump_events().await;

    let state = fx.manager.state();
    assert_eq!(state.current_item.as_deref(), Some(b.as_ref()));
    assert!(!state.is_ended);
    assert_eq!(state.current_time, 0.0);
    assert_eq!(fx.manager.queue().current_playlist_index(), Some(1));
    assert_eq!(fx.video_element.src(), Some(stream_url(&b)));
    assert_eq!(fx.video_element.state.lock().unwrap().current_time, 0.0);
}

#[tokio::test]
async fn ended_on_last_item_goes_idle() {
    let mut fx = Fixture::new().await;
    fx.manager
        .play_item(video_item("only"), PlayOptions::default())
        .await
        .unwrap();

    fx.video.handle_media_event(MediaElementEvent::Ended).await;
    fx.manager.pump_events().await;

    assert_eq!(fx.manager.phase(), PlaybackPhase::Idle);
    assert!(fx.manager.active_player_kind().is_none());
    assert_eq!(fx.manager.queue().len(), 1);
    assert!(fx.video_element.src().is_none());
}

#[tokio::test]
async fn events_before_any_play_are_ignored() {
    let mut fx = Fixture::new().await;

    fx.video.handle_media_event(MediaElementEvent::Playing).await;
    assert_eq!(fx.manager.pump_events().await, 0);
    assert_eq!(fx.manager.phase(), PlaybackPhase::Idle);
}

// ============================================================================
// Transport
// ============================================================================

#[tokio::test]
async fn pause_and_unpause() {
    let mut fx = Fixture::new().await;
    fx.manager
        .play_item(video_item("m"), PlayOptions::default())
        .await
        .unwrap();

    fx.manager.pause().await;
    assert!(fx.manager.state().paused);
    assert!(fx.video_element.is_paused());

    fx.manager.unpause().await.unwrap();
    assert!(!fx.manager.state().paused);
    assert!(!fx.video_element.is_paused());
}

#[tokio::test]
async fn rejected_unpause_stays_paused() {
    let mut fx = Fixture::new().await;
    fx.manager
        .play_item(video_item("m"), PlayOptions::default())
        .await
        .unwrap();
    fx.manager.pause().await;

    fx.video_element
        .push_play_result(Err("NotAllowedError".to_string()));
    assert!(fx.manager.unpause().await.is_err());
    assert!(fx.manager.state().paused);
}

#[tokio::test]
async fn transport_without_active_backend_is_a_no_op() {
    let mut fx = Fixture::new().await;

    fx.manager.pause().await;
    fx.manager.unpause().await.unwrap();
    fx.manager.seek(Ticks::new(10)).await;

    assert_eq!(fx.manager.phase(), PlaybackPhase::Idle);
    assert!(!fx.manager.state().paused);
}

#[tokio::test]
async fn seek_is_clamped_by_backend() {
    let mut fx = Fixture::new().await;
    fx.manager
        .play_item(video_item("m"), PlayOptions::default())
        .await
        .unwrap();
    fx.video_element.set_duration(Some(100.0));

    fx.manager.seek(Ticks::from_seconds(40.0)).await;
    assert_eq!(fx.video_element.state.lock().unwrap().current_time, 40.0);

    fx.manager.seek(Ticks::from_seconds(500.0)).await;
    assert_eq!(fx.video_element.state.lock().unwrap().current_time, 100.0);

    fx.manager.seek(Ticks::new(-5)).await;
    assert_eq!(fx.video_element.state.lock().unwrap().current_time, 0.0);
}

#[tokio::test]
async fn stop_keeps_queue_and_releases_backend() {
    let mut fx = Fixture::new().await;
    fx.manager
        .play(vec![video_item("a"), video_item("b")], PlayOptions::default())
        .await
        .unwrap();
    let generation = fx.manager.generation();

    fx.manager.stop().await;

    assert_eq!(fx.manager.phase(), PlaybackPhase::Idle);
    assert!(fx.manager.active_player_kind().is_none());
    assert!(fx.video_element.src().is_none());
    assert_eq!(fx.manager.queue().len(), 2);
    assert!(fx.manager.generation() > generation);
}

// ============================================================================
// Volume and rate
// ============================================================================

#[tokio::test]
async fn volume_uses_cubic_curve_on_element() {
    let mut fx = Fixture::new().await;
    fx.manager
        .play_item(video_item("m"), PlayOptions::default())
        .await
        .unwrap();

    fx.manager.set_volume(50);

    assert_eq!(fx.manager.volume(), 50);
    let native = fx.video_element.state.lock().unwrap().volume;
    assert!((native - 0.125).abs() < 1e-12);
    assert_eq!(fx.video.volume(), 50);
}

#[tokio::test]
async fn settings_are_synced_to_newly_active_backend() {
    let mut fx = Fixture::new().await;
    fx.manager.set_volume(20);
    fx.manager.set_mute(true);
    fx.manager.set_playback_rate(1.5).unwrap();

    fx.manager
        .play_item(audio_item("t"), PlayOptions::default())
        .await
        .unwrap();

    let element = fx.audio_element.state.lock().unwrap();
    assert!((element.volume - 0.008).abs() < 1e-12);
    assert!(element.muted);
    assert_eq!(element.playback_rate, 1.5);
}

#[tokio::test]
async fn element_volume_change_is_reported_as_percent() {
    let mut fx = Fixture::new().await;
    fx.manager
        .play_item(video_item("m"), PlayOptions::default())
        .await
        .unwrap();

    fx.video_element.state.lock().unwrap().volume = 0.125;
    fx.video.handle_media_event(MediaElementEvent::VolumeChange).await;
    fx.manager.pump_events().await;

    assert_eq!(fx.manager.volume(), 50);
}

#[tokio::test]
async fn toggle_mute() {
    let mut fx = Fixture::new().await;
    assert!(!fx.manager.is_muted());

    fx.manager.toggle_mute();
    assert!(fx.manager.is_muted());

    fx.manager.toggle_mute();
    assert!(!fx.manager.is_muted());
}

#[tokio::test]
async fn invalid_playback_rate_is_rejected() {
    let mut fx = Fixture::new().await;

    for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let err = fx.manager.set_playback_rate(rate).unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidPlaybackRate(_)));
    }
    assert_eq!(fx.manager.state().playback_rate, 1.0);
}

// ============================================================================
// Subscription
// ============================================================================

#[tokio::test]
async fn subscribers_see_state_changes() {
    let mut fx = Fixture::new().await;
    let mut rx = fx.manager.subscribe();
    assert!(!rx.has_changed().unwrap());

    fx.manager
        .play_item(video_item("m"), PlayOptions::default())
        .await
        .unwrap();

    assert!(rx.has_changed().unwrap());
    let snapshot = rx.borrow_and_update().clone();
    assert_eq!(snapshot.current_item.unwrap().id.as_str(), "m");
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn second_backend_for_same_kind_is_rejected() {
    let mut fx = Fixture::new().await;
    let other = Arc::new(HtmlMediaBackend::video(FakeElement::new()));

    let err = fx
        .manager
        .register_player(PlayerKind::Video, &other)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PlaybackError::PlayerAlreadyRegistered(PlayerKind::Video)
    ));

    // Same backend again is fine
    let video = fx.video.clone();
    fx.manager
        .register_player(PlayerKind::Video, &video)
        .await
        .unwrap();
}

#[tokio::test]
async fn backend_kind_must_match_slot() {
    let mut manager = PlaybackManager::default();
    let audio = Arc::new(HtmlMediaBackend::audio(FakeElement::new()));

    let err = manager
        .register_player(PlayerKind::Video, &audio)
        .await
        .unwrap_err();
    assert!(matches!(err, PlaybackError::InvalidOperation(_)));
}

#[tokio::test]
async fn dropped_backend_reads_as_unregistered() {
    let mut manager = PlaybackManager::new(PlaybackConfig::default());
    {
        let video = Arc::new(HtmlMediaBackend::video(FakeElement::new()));
        manager
            .register_player(PlayerKind::Video, &video)
            .await
            .unwrap();
        assert!(manager.is_registered(PlayerKind::Video));
    }

    assert!(!manager.is_registered(PlayerKind::Video));
    let err = manager
        .play_item(video_item("m"), PlayOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PlaybackError::NoBackend { .. }));

    // The slot can be taken again
    let replacement = Arc::new(HtmlMediaBackend::video(FakeElement::new()));
    manager
        .register_player(PlayerKind::Video, &replacement)
        .await
        .unwrap();
}

#[tokio::test]
async fn unregistering_active_backend_goes_idle() {
    let mut fx = Fixture::new().await;
    fx.manager
        .play_item(video_item("m"), PlayOptions::default())
        .await
        .unwrap();

    assert!(fx.manager.unregister_player(PlayerKind::Video));
    assert_eq!(fx.manager.phase(), PlaybackPhase::Idle);
    assert!(fx.manager.active_player_kind().is_none());

    // Late events from the unmounted backend are dropped
    fx.video.handle_media_event(MediaElementEvent::Playing).await;
    fx.manager.pump_events().await;
    assert_eq!(fx.manager.phase(), PlaybackPhase::Idle);
}
