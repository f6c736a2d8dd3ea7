use parking_lot::Mutex;
use playkit_core::{
    LifecycleState, MediaDescriptor, PlayerConfig, PlayerError, PlayerEvent, RenderTarget,
    TrackKind, TrackSelectionOverride,
};
use playkit_engine::{
    EndFileReason, EngineCall, EngineEvent, FakeEngine, FakeTrack, LogLevel, PropertyValue,
};
use playkit_player::{Player, ENGINE_LOG_TARGET};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const DEADLINE: Duration = Duration::from_secs(5);

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < DEADLINE {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

struct Harness {
    fake: FakeEngine,
    player: Player,
    events: Arc<Mutex<Vec<PlayerEvent>>>,
    barrier_seq: AtomicU32,
}

impl Harness {
    fn new() -> Self {
        let fake = FakeEngine::new();
        let player = Player::new(Box::new(fake.clone()), PlayerConfig::default())
            .expect("Failed to create player");
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        player.add_listener(Arc::new(move |e: &PlayerEvent| sink.lock().push(e.clone())));
        assert!(wait_until(|| fake.observer().is_some()), "engine never initialized");

        Self {
            fake,
            player,
            events,
            barrier_seq: AtomicU32::new(1),
        }
    }

    /// Returns once the command queue and the state thread have drained
    /// everything submitted before this call.
    fn settle(&self) {
        let marker = self.barrier_seq.fetch_add(1, Ordering::Relaxed) as f64 / 1000.0;
        self.player
            .set_subtitle_delay(marker)
            .expect("Failed to queue barrier");
        assert!(
            wait_until(|| self.player.subtitle_delay() == marker),
            "player did not settle"
        );
    }

    fn events(&self) -> Vec<PlayerEvent> {
        self.events.lock().clone()
    }

    fn clear_events(&self) {
        self.events.lock().clear();
    }

    fn count(&self, name: &str) -> usize {
        self.events().iter().filter(|e| e.name() == name).count()
    }

    fn load_and_open(&self, start_ms: i64) {
        self.player
            .load_media(
                MediaDescriptor::new("ep1", "https://media.example/ep1.mkv"),
                start_ms,
            )
            .expect("Failed to queue load");
        assert!(wait_until(|| !self.fake.commands("loadfile").is_empty()));
        self.fake.emit_event(EngineEvent::FileLoaded);
        assert!(wait_until(|| self.count("rendered-first-frame") > 0));
    }

    fn surface_calls(&self) -> Vec<EngineCall> {
        self.fake
            .calls()
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    EngineCall::AttachRenderTarget(_) | EngineCall::DetachRenderTarget
                )
            })
            .collect()
    }
}

#[test]
fn test_load_with_offset_then_file_loaded() {
    let h = Harness::new();
    h.load_and_open(5_000);

    let load = &h.fake.commands("loadfile")[0];
    assert_eq!(load[1], "https://media.example/ep1.mkv");
    assert!(load.contains(&"start=5".to_string()));

    h.settle();
    assert!(!h.player.snapshot().is_loading_file);
    assert!(!h.player.is_loading());
    assert_eq!(h.player.playback_state(), LifecycleState::Ready);

    let names: Vec<&str> = h.events().iter().map(|e| e.name()).collect();
    let first_frame = names.iter().position(|n| *n == "rendered-first-frame").unwrap();
    assert_eq!(names[first_frame + 1], "media-item-transition");
    assert_eq!(
        h.player.current_media().map(|m| m.id.clone()),
        Some("ep1".to_string())
    );
}

#[test]
fn test_play_writes_pause_and_notifies_once() {
    let h = Harness::new();
    h.player.set_play_when_ready(true).unwrap();
    h.settle();

    assert_eq!(h.fake.writes_to("pause"), vec![PropertyValue::Flag(false)]);
    assert!(h.player.play_when_ready());
    assert_eq!(h.events(), vec![PlayerEvent::IsPlayingChanged(true)]);

    // Engine confirmation matches the optimistic update
    h.fake.emit_property("pause", PropertyValue::Flag(false));
    h.settle();
    assert_eq!(h.count("is-playing-changed"), 1);
}

#[test]
fn test_seek_is_reflected_immediately_and_confirmation_is_quiet() {
    let h = Harness::new();
    h.player.seek_to(30_000).unwrap();
    assert!(wait_until(|| h.player.current_position() == 30_000));
    assert_eq!(
        h.fake.writes_to("time-pos"),
        vec![PropertyValue::Double(30.0)]
    );

    h.fake.emit_property("time-pos", PropertyValue::Double(30.004));
    h.settle();
    assert_eq!(h.player.current_position(), 30_004);
    assert!(h.events().is_empty());
}

#[test]
fn test_natural_end_of_file_fires_one_ended() {
    let h = Harness::new();
    h.load_and_open(0);
    h.settle();
    h.clear_events();

    h.fake.emit_end_of_file(EndFileReason::Eof, 0);
    h.settle();

    assert_eq!(h.player.playback_state(), LifecycleState::Ended);
    assert_eq!(
        h.events(),
        vec![PlayerEvent::PlaybackStateChanged(LifecycleState::Ended)]
    );
}

#[test]
fn test_user_stop_end_of_file_is_silent() {
    let h = Harness::new();
    h.load_and_open(0);
    h.settle();
    h.clear_events();

    h.fake.emit_end_of_file(EndFileReason::Stop, 0);
    h.settle();
    assert!(h.events().is_empty());
}

#[test]
fn test_engine_error_keeps_native_code() {
    let h = Harness::new();
    h.load_and_open(0);
    h.settle();
    h.clear_events();

    h.fake.emit_end_of_file(EndFileReason::Error, -13);
    h.settle();

    assert_eq!(h.player.playback_state(), LifecycleState::Idle);
    let errors: Vec<i32> = h
        .events()
        .iter()
        .filter_map(|e| match e {
            PlayerEvent::Error(err) => Some(err.code),
            _ => None,
        })
        .collect();
    assert_eq!(errors, vec![-13]);
}

#[test]
fn test_failed_load_reports_error() {
    let h = Harness::new();
    h.fake.fail_on("command:loadfile");
    h.player
        .load_media(MediaDescriptor::new("bad", "file:///missing.mkv"), 0)
        .unwrap();
    assert!(wait_until(|| h.count("player-error") == 1));

    h.settle();
    assert!(!h.player.is_loading());
    assert!(h.player.current_media().is_none());
}

#[test]
fn test_switching_surfaces_detaches_first() {
    let h = Harness::new();
    h.player
        .attach_surface(Some(RenderTarget::new(0xA)))
        .unwrap();
    h.player
        .attach_surface(Some(RenderTarget::new(0xB)))
        .unwrap();
    h.player
        .attach_surface(Some(RenderTarget::new(0xB)))
        .unwrap();
    h.settle();

    assert_eq!(
        h.surface_calls(),
        vec![
            EngineCall::AttachRenderTarget(0xA),
            EngineCall::DetachRenderTarget,
            EngineCall::AttachRenderTarget(0xB),
        ]
    );

    h.player.attach_surface(None).unwrap();
    h.player.attach_surface(None).unwrap();
    h.settle();
    assert_eq!(h.surface_calls().len(), 4);
}

#[test]
fn test_no_engine_calls_after_release() {
    let h = Harness::new();
    h.player
        .attach_surface(Some(RenderTarget::new(1)))
        .unwrap();
    h.player.release();
    assert!(wait_until(|| h.fake.is_destroyed()));
    h.fake.clear_calls();

    assert!(matches!(h.player.play(), Err(PlayerError::Released)));
    assert!(matches!(h.player.seek_to(1), Err(PlayerError::Released)));
    assert!(matches!(h.player.set_speed(2.0), Err(PlayerError::Released)));
    assert!(matches!(h.player.stop(), Err(PlayerError::Released)));
    assert!(matches!(
        h.player
            .load_media(MediaDescriptor::new("x", "file:///x.mkv"), 0),
        Err(PlayerError::Released)
    ));
    assert!(matches!(
        h.player
            .apply_track_selection(&[TrackSelectionOverride::Disable(TrackKind::Audio)]),
        Err(PlayerError::Released)
    ));
    assert!(matches!(
        h.player.attach_surface(None),
        Err(PlayerError::Released)
    ));
    h.player.release();

    thread::sleep(Duration::from_millis(50));
    let Harness { fake, player, .. } = h;
    drop(player);
    assert!(fake.calls().is_empty());
}

#[test]
fn test_release_resets_snapshot() {
    let h = Harness::new();
    h.player.seek_to(10_000).unwrap();
    h.settle();
    h.player.release();

    assert_eq!(h.player.current_position(), playkit_core::TIME_UNSET);
    assert_eq!(h.player.playback_state(), LifecycleState::Idle);
}

#[test]
fn test_commands_reach_engine_in_order() {
    let h = Harness::new();
    h.player.play().unwrap();
    h.player.seek_to(1_000).unwrap();
    h.player.set_speed(1.5).unwrap();
    h.player.pause().unwrap();
    h.settle();

    let writes: Vec<(String, PropertyValue)> = h
        .fake
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            EngineCall::SetProperty(name, value) if name != "sub-delay" => Some((name, value)),
            _ => None,
        })
        .collect();
    assert_eq!(
        writes,
        vec![
            ("pause".to_string(), PropertyValue::Flag(false)),
            ("time-pos".to_string(), PropertyValue::Double(1.0)),
            ("speed".to_string(), PropertyValue::Double(1.5)),
            ("pause".to_string(), PropertyValue::Flag(true)),
        ]
    );
    assert_eq!(h.player.speed(), 1.5);
}

#[test]
fn test_each_trigger_rebuilds_tracks_once() {
    let h = Harness::new();
    h.fake.set_tracks(&[
        FakeTrack::new("video", 1).selected(),
        FakeTrack::new("audio", 1).lang("eng").selected(),
    ]);

    h.load_and_open(0);
    h.settle();
    assert_eq!(h.fake.reads_of("track-list/count"), 1);
    assert_eq!(h.count("tracks-changed"), 1);
    assert_eq!(h.player.current_tracks().len(), 2);

    h.fake.emit_event(EngineEvent::VideoReconfig);
    h.settle();
    assert_eq!(h.fake.reads_of("track-list/count"), 2);
    assert_eq!(h.count("tracks-changed"), 2);

    h.fake.emit_event(EngineEvent::PlaybackRestart);
    h.settle();
    assert_eq!(h.fake.reads_of("track-list/count"), 3);
    assert_eq!(h.count("tracks-changed"), 3);
}

#[test]
fn test_selecting_audio_writes_aid_once() {
    let h = Harness::new();
    h.fake.set_tracks(&[
        FakeTrack::new("video", 1).selected(),
        FakeTrack::new("audio", 1).lang("eng").selected(),
        FakeTrack::new("audio", 2).lang("jpn"),
    ]);
    h.load_and_open(0);
    h.settle();

    let japanese = h
        .player
        .current_tracks()
        .of_kind(TrackKind::Audio)
        .find(|g| g.native_id == 2)
        .cloned()
        .expect("audio track 2 missing");
    h.player
        .apply_track_selection(&[TrackSelectionOverride::Select(japanese)])
        .unwrap();
    h.settle();

    assert_eq!(h.fake.writes_to("aid"), vec![PropertyValue::Int(2)]);
}

#[test]
fn test_unknown_selection_is_ignored() {
    let h = Harness::new();
    h.load_and_open(0);
    h.settle();

    let mut ghost = playkit_core::TrackGroup {
        id: "4:0:9".to_string(),
        index: 4,
        kind: TrackKind::Audio,
        native_id: 9,
        language: None,
        codec_name: None,
        label: None,
        channel_count: None,
        is_default: false,
        is_forced: false,
        is_external: false,
        is_selected: false,
    };
    assert!(h
        .player
        .apply_track_selection(&[TrackSelectionOverride::Select(ghost.clone())])
        .is_ok());
    ghost.kind = TrackKind::Text;
    assert!(h
        .player
        .apply_track_selection(&[TrackSelectionOverride::Select(ghost)])
        .is_ok());
    h.settle();

    assert!(h.fake.writes_to("aid").is_empty());
    assert!(h.fake.writes_to("sid").is_empty());
}

#[test]
fn test_removed_listener_stops_receiving() {
    let h = Harness::new();
    let extra = Arc::new(Mutex::new(0usize));
    let sink = extra.clone();
    let id = h
        .player
        .add_listener(Arc::new(move |_: &PlayerEvent| *sink.lock() += 1));

    h.player.play().unwrap();
    h.settle();
    assert!(h.player.remove_listener(id));
    h.player.pause().unwrap();
    h.settle();

    assert_eq!(*extra.lock(), 1);
    assert_eq!(h.count("is-playing-changed"), 2);
}

#[test]
fn test_calls_from_many_threads() {
    let h = Arc::new(Harness::new());
    let workers: Vec<_> = (0..4)
        .map(|i| {
            let h = h.clone();
            thread::spawn(move || {
                for n in 0..25 {
                    h.player.seek_to((i * 100 + n) as i64).unwrap();
                    let _ = h.player.snapshot();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    h.settle();

    assert_eq!(h.fake.writes_to("time-pos").len(), 100);
}

/// Layer keeping (level, target) of every event it sees
#[derive(Clone, Default)]
struct LogTargets(Arc<Mutex<Vec<(tracing::Level, String)>>>);

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogTargets {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let meta = event.metadata();
        self.0.lock().push((*meta.level(), meta.target().to_string()));
    }
}

#[test]
fn test_engine_logs_requested_and_forwarded() {
    use tracing_subscriber::layer::SubscriberExt;

    let h = Harness::new();
    h.settle();
    assert!(h
        .fake
        .calls()
        .contains(&EngineCall::RequestLogMessages(LogLevel::Warn)));

    let captured = LogTargets::default();
    let subscriber = tracing_subscriber::registry().with(captured.clone());
    tracing::subscriber::with_default(subscriber, || {
        h.fake.emit_log("demux", LogLevel::Error, "truncated stream");
        h.fake.emit_log("vd", LogLevel::Verbose, "decoder opened");
    });

    let engine_lines: Vec<_> = captured
        .0
        .lock()
        .iter()
        .filter(|(_, target)| target == ENGINE_LOG_TARGET)
        .map(|(level, _)| *level)
        .collect();
    assert_eq!(engine_lines, vec![tracing::Level::ERROR, tracing::Level::DEBUG]);

    h.settle();
    assert_eq!(h.count("player-error"), 0);
}
