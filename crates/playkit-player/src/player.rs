//! Player facade
//!
//! Every method may be called from any thread. Mutating calls validate their
//! arguments, enqueue a [`Command`] and return without waiting for the engine.
//! Queries read the latest published snapshot and never block.

use crate::bridge::NativeEventBridge;
use crate::listeners::{ListenerId, ListenerRegistry, PlayerListener};
use crate::queue::CommandWorker;
use crate::snapshot;
use crate::tracks;
use arc_swap::ArcSwap;
use crossbeam_channel::{unbounded, Sender};
use once_cell::sync::Lazy;
use playkit_core::{
    Command, LifecycleState, LoadedMedia, MediaDescriptor, PlaybackState, PlayerConfig,
    PlayerError, RenderTarget, Result, TrackInventory, TrackSelectionOverride, VideoSize,
};
use playkit_engine::NativeEngine;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// What queries answer after release
static EMPTY: Lazy<Arc<PlaybackState>> = Lazy::new(|| Arc::new(PlaybackState::empty()));

/// Thread-safe player over a native engine
pub struct Player {
    commands: Sender<Command>,
    snapshot: Arc<ArcSwap<PlaybackState>>,
    listeners: Arc<ListenerRegistry>,
    released: Arc<AtomicBool>,
    command_thread: Option<JoinHandle<()>>,
    state_thread: Option<JoinHandle<()>>,
}

impl Player {
    /// Start the state and command threads and queue engine initialization.
    ///
    /// Initialization itself runs on the command thread; a failure there is
    /// reported to listeners as [`playkit_core::PlayerEvent::Error`].
    pub fn new(engine: Box<dyn NativeEngine>, config: PlayerConfig) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);

        let snapshot = Arc::new(ArcSwap::from_pointee(PlaybackState::empty()));
        let listeners = Arc::new(ListenerRegistry::new());
        let released = Arc::new(AtomicBool::new(false));

        let (state, state_thread) = snapshot::spawn(
            format!("{}-state", config.thread_name_prefix),
            snapshot.clone(),
            listeners.clone(),
        )?;

        let (commands, queue) = unbounded();
        let bridge = Arc::new(NativeEventBridge::new(
            state.clone(),
            commands.clone(),
            released.clone(),
        ));
        let worker = CommandWorker::new(engine, state.clone(), config.clone(), bridge);
        let command_thread = match worker.spawn(
            format!("{}-command", config.thread_name_prefix),
            queue,
        ) {
            Ok(handle) => handle,
            Err(e) => {
                state.shutdown();
                return Err(e.into());
            }
        };

        let player = Self {
            commands,
            snapshot,
            listeners,
            released,
            command_thread: Some(command_thread),
            state_thread: Some(state_thread),
        };
        player.submit(Command::Initialize)?;

        info!("Player created");
        Ok(player)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_released() {
            return Err(PlayerError::Released);
        }
        Ok(())
    }

    fn submit(&self, command: Command) -> Result<()> {
        self.ensure_live()?;
        debug!("Enqueue {}", command.name());
        self.commands
            .send(command)
            .map_err(|_| PlayerError::Released)
    }

    /// True once [`release`](Self::release) has been called
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Load `descriptor`, starting `start_offset_ms` into it
    pub fn load_media(&self, descriptor: MediaDescriptor, start_offset_ms: i64) -> Result<()> {
        self.ensure_live()?;
        if descriptor.uri.trim().is_empty() {
            return Err(PlayerError::InvalidArgument(format!(
                "media {} has no uri",
                descriptor.id
            )));
        }
        let media = Arc::new(LoadedMedia::new(descriptor, start_offset_ms));
        self.submit(Command::Load(media))
    }

    /// Play (`true`) or pause (`false`)
    pub fn set_play_when_ready(&self, play_when_ready: bool) -> Result<()> {
        self.submit(Command::SetPlayWhenReady(play_when_ready))
    }

    /// Shorthand for `set_play_when_ready(true)`
    pub fn play(&self) -> Result<()> {
        self.set_play_when_ready(true)
    }

    /// Shorthand for `set_play_when_ready(false)`
    pub fn pause(&self) -> Result<()> {
        self.set_play_when_ready(false)
    }

    /// Seek to `position_ms`; negative positions clamp to zero
    pub fn seek_to(&self, position_ms: i64) -> Result<()> {
        self.submit(Command::Seek(position_ms.max(0)))
    }

    /// Change the playback rate
    pub fn set_speed(&self, speed: f64) -> Result<()> {
        self.ensure_live()?;
        if !speed.is_finite() || speed <= 0.0 {
            return Err(PlayerError::InvalidArgument(format!(
                "speed must be positive, got {}",
                speed
            )));
        }
        self.submit(Command::SetSpeed(speed))
    }

    /// Shift subtitles by `seconds`
    pub fn set_subtitle_delay(&self, seconds: f64) -> Result<()> {
        self.ensure_live()?;
        if !seconds.is_finite() {
            return Err(PlayerError::InvalidArgument(format!(
                "subtitle delay must be finite, got {}",
                seconds
            )));
        }
        self.submit(Command::SetSubtitleDelay(seconds))
    }

    /// Apply selection overrides against the current inventory.
    ///
    /// Overrides that match no known track are logged and skipped.
    pub fn apply_track_selection(&self, overrides: &[TrackSelectionOverride]) -> Result<()> {
        self.ensure_live()?;
        let inventory = self.snapshot.load().tracks.clone();
        for selection in overrides {
            if let Some(command) = tracks::resolve_override(&inventory, selection) {
                self.submit(command)?;
            }
        }
        Ok(())
    }

    /// Attach a render target, or detach with `None`
    pub fn attach_surface(&self, target: Option<RenderTarget>) -> Result<()> {
        match target {
            Some(target) => self.submit(Command::AttachSurface(target)),
            None => self.submit(Command::DetachSurface),
        }
    }

    /// Stop playback and unload the current item
    pub fn stop(&self) -> Result<()> {
        self.submit(Command::Stop)
    }

    /// Tear everything down. Idempotent; later mutating calls fail with
    /// [`PlayerError::Released`].
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        if self.commands.send(Command::Destroy).is_err() {
            warn!("Command thread already gone at release");
        }
        info!("Player released");
    }

    /// Not supported by this engine
    pub fn set_volume(&self, _volume: f32) -> Result<()> {
        self.ensure_live()?;
        Err(PlayerError::Unsupported("set_volume"))
    }

    /// Not supported by this engine
    pub fn set_repeat_mode(&self, _repeat: bool) -> Result<()> {
        self.ensure_live()?;
        Err(PlayerError::Unsupported("set_repeat_mode"))
    }

    /// Not supported: there is no playlist
    pub fn seek_to_next(&self) -> Result<()> {
        self.ensure_live()?;
        Err(PlayerError::Unsupported("seek_to_next"))
    }

    /// Not supported: there is no playlist
    pub fn seek_to_previous(&self) -> Result<()> {
        self.ensure_live()?;
        Err(PlayerError::Unsupported("seek_to_previous"))
    }

    /// Latest snapshot; the empty one after release
    pub fn snapshot(&self) -> Arc<PlaybackState> {
        if self.is_released() {
            return EMPTY.clone();
        }
        self.snapshot.load_full()
    }

    /// Lifecycle state
    pub fn playback_state(&self) -> LifecycleState {
        self.snapshot().lifecycle
    }

    /// Position in ms, or `TIME_UNSET`
    pub fn current_position(&self) -> i64 {
        self.snapshot().position_ms
    }

    /// Buffered position in ms, or `TIME_UNSET`
    pub fn buffered_position(&self) -> i64 {
        self.snapshot().buffer_ms
    }

    /// Duration in ms, or `TIME_UNSET`
    pub fn duration(&self) -> i64 {
        self.snapshot().duration_ms
    }

    /// Displayed video size once known
    pub fn video_size(&self) -> Option<VideoSize> {
        self.snapshot().video_size
    }

    /// Loading a file or waiting for the cache
    pub fn is_loading(&self) -> bool {
        self.snapshot().is_loading()
    }

    /// Not paused
    pub fn is_playing(&self) -> bool {
        self.snapshot().is_playing()
    }

    /// Whether playback proceeds once ready
    pub fn play_when_ready(&self) -> bool {
        !self.snapshot().is_paused
    }

    /// Playback rate
    pub fn speed(&self) -> f64 {
        self.snapshot().speed
    }

    /// Subtitle delay in seconds
    pub fn subtitle_delay(&self) -> f64 {
        self.snapshot().subtitle_delay_seconds
    }

    /// Current track inventory
    pub fn current_tracks(&self) -> TrackInventory {
        self.snapshot().tracks.clone()
    }

    /// Descriptor of the loaded item
    pub fn current_media(&self) -> Option<Arc<MediaDescriptor>> {
        self.snapshot().media.as_ref().map(|m| m.descriptor.clone())
    }

    /// Register a listener; events arrive on the state thread
    pub fn add_listener(&self, listener: Arc<dyn PlayerListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Unregister a listener; false if it was not registered
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.release();

        let current = thread::current().id();
        for handle in [self.command_thread.take(), self.state_thread.take()]
            .into_iter()
            .flatten()
        {
            // Dropped from a listener: the thread cannot join itself
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                warn!("Player thread panicked during shutdown");
            }
        }
        self.listeners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playkit_engine::FakeEngine;

    fn player() -> (FakeEngine, Player) {
        let fake = FakeEngine::new();
        let player = Player::new(Box::new(fake.clone()), PlayerConfig::default()).unwrap();
        (fake, player)
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = PlayerConfig {
            video_output: String::new(),
            ..PlayerConfig::default()
        };
        assert!(matches!(
            Player::new(Box::new(FakeEngine::new()), config),
            Err(PlayerError::Config(_))
        ));
    }

    #[test]
    fn test_argument_validation() {
        let (_, player) = player();
        assert!(matches!(
            player.set_speed(0.0),
            Err(PlayerError::InvalidArgument(_))
        ));
        assert!(matches!(
            player.set_speed(f64::NAN),
            Err(PlayerError::InvalidArgument(_))
        ));
        assert!(matches!(
            player.set_subtitle_delay(f64::INFINITY),
            Err(PlayerError::InvalidArgument(_))
        ));
        assert!(matches!(
            player.load_media(MediaDescriptor::new("x", " "), 0),
            Err(PlayerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_unsupported_operations() {
        let (_, player) = player();
        assert!(matches!(
            player.set_volume(0.5),
            Err(PlayerError::Unsupported("set_volume"))
        ));
        assert!(matches!(
            player.seek_to_next(),
            Err(PlayerError::Unsupported(_))
        ));
    }

    #[test]
    fn test_release_is_idempotent_and_rejects_calls() {
        let (_, player) = player();
        player.release();
        player.release();

        assert!(matches!(player.play(), Err(PlayerError::Released)));
        assert!(matches!(player.seek_to(10), Err(PlayerError::Released)));
        assert!(matches!(
            player.attach_surface(None),
            Err(PlayerError::Released)
        ));
        assert!(matches!(player.set_volume(1.0), Err(PlayerError::Released)));
    }

    #[test]
    fn test_queries_after_release_are_empty() {
        let (_, player) = player();
        player.release();

        let state = player.snapshot();
        assert_eq!(state.lifecycle, LifecycleState::Idle);
        assert_eq!(player.current_position(), playkit_core::TIME_UNSET);
        assert!(player.current_tracks().is_empty());
        assert!(!player.is_playing());
        assert_eq!(player.speed(), 1.0);
    }

    #[test]
    fn test_drop_joins_threads() {
        let (fake, player) = player();
        drop(player);
        assert!(fake.is_destroyed());
    }
}
