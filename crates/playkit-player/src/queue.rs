//! Command thread
//!
//! The single worker that owns the native engine. Commands are applied strictly
//! in the order they were accepted. Handlers never unwind past the run loop:
//! failures are logged and, where the caller would otherwise never learn about
//! them, published as [`PlayerEvent::Error`].

use crate::bridge::OBSERVED_PROPERTIES;
use crate::snapshot::StateHandle;
use crate::surface::SurfaceManager;
use crate::tracks;
use crossbeam_channel::Receiver;
use playkit_core::{
    ms_to_seconds, Command, LifecycleState, LoadedMedia, PlaybackError, PlaybackState,
    PlayerConfig, PlayerEvent, RenderTarget, TrackValue,
};
use playkit_engine::{EngineObserver, LogLevel, NativeEngine, Result};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Worker state, moved onto the command thread
pub struct CommandWorker {
    engine: Box<dyn NativeEngine>,
    surface: SurfaceManager,
    state: StateHandle,
    config: Arc<PlayerConfig>,
    observer: Arc<dyn EngineObserver>,
    current_media: Option<Arc<LoadedMedia>>,
    destroyed: bool,
}

impl CommandWorker {
    /// Worker driving `engine`, registering `observer` on initialization
    pub fn new(
        engine: Box<dyn NativeEngine>,
        state: StateHandle,
        config: Arc<PlayerConfig>,
        observer: Arc<dyn EngineObserver>,
    ) -> Self {
        Self {
            engine,
            surface: SurfaceManager::new(config.video_output.clone()),
            state,
            config,
            observer,
            current_media: None,
            destroyed: false,
        }
    }

    /// Start the worker on a thread called `name`
    pub fn spawn(self, name: String, commands: Receiver<Command>) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(name)
            .spawn(move || self.run(commands))
    }

    fn run(mut self, commands: Receiver<Command>) {
        info!("Command thread started");

        while let Ok(command) = commands.recv() {
            let name = command.name();
            let terminal = command.is_terminal();

            match panic::catch_unwind(AssertUnwindSafe(|| self.handle(command))) {
                Ok(Ok(())) => debug!("Command {} applied", name),
                Ok(Err(e)) => warn!("Command {} failed: {}", name, e),
                Err(_) => error!("Command {} panicked", name),
            }

            if terminal {
                break;
            }
        }

        // Sender side dropped without a destroy
        if !self.destroyed {
            self.destroy();
        }

        info!("Command thread stopped");
    }

    fn handle(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Initialize => self.initialize(),
            Command::SetPlayWhenReady(play) => {
                self.engine.set_property_bool("pause", !play)?;
                self.state.update(move |s| PlaybackState {
                    is_paused: !play,
                    ..s.clone()
                });
                Ok(())
            }
            Command::Seek(position_ms) => {
                self.engine
                    .set_property_double("time-pos", ms_to_seconds(position_ms))?;
                self.state.update(move |s| PlaybackState {
                    position_ms,
                    lifecycle: match s.lifecycle {
                        LifecycleState::Ended => LifecycleState::Ready,
                        other => other,
                    },
                    ..s.clone()
                });
                Ok(())
            }
            Command::Load(media) => self.load(media),
            Command::Stop => {
                self.engine.command(&["stop"])?;
                self.current_media = None;
                self.state.update(|s| s.unloaded());
                Ok(())
            }
            Command::SetSpeed(speed) => {
                self.engine.set_property_double("speed", speed)?;
                self.state.update(move |s| PlaybackState { speed, ..s.clone() });
                Ok(())
            }
            Command::SetTrack { property, value } => {
                match value {
                    TrackValue::Id(id) => self.engine.set_property_int(property, id)?,
                    TrackValue::Disabled => self.engine.set_property_string(property, "no")?,
                }
                self.rebuild_tracks();
                Ok(())
            }
            Command::SetSubtitleDelay(seconds) => {
                self.engine.set_property_double("sub-delay", seconds)?;
                self.state.update(move |s| PlaybackState {
                    subtitle_delay_seconds: seconds,
                    ..s.clone()
                });
                Ok(())
            }
            Command::AttachSurface(target) => self.attach(target),
            Command::DetachSurface => self.surface.detach(self.engine.as_mut()),
            Command::FileLoaded => {
                self.file_loaded();
                Ok(())
            }
            Command::RefreshTracks => {
                self.rebuild_tracks();
                Ok(())
            }
            Command::Destroy => {
                self.destroy();
                Ok(())
            }
        }
    }

    fn initialize(&mut self) -> Result<()> {
        let result = self.try_initialize();
        if let Err(e) = &result {
            error!("Engine initialization failed: {}", e);
            self.state
                .emit(PlayerEvent::Error(PlaybackError::new(e.code(), e.to_string())));
        }
        result
    }

    fn try_initialize(&mut self) -> Result<()> {
        self.engine.create()?;
        for option in self.config.initial_options() {
            self.engine.set_option_string(&option.name, &option.value)?;
        }
        self.engine.initialize(self.observer.clone())?;

        let level = LogLevel::from_native(&self.config.log_level).unwrap_or(LogLevel::Warn);
        self.engine.request_log_messages(level)?;
        for (name, format) in OBSERVED_PROPERTIES {
            self.engine.observe_property(name, *format)?;
        }

        info!(
            "Engine initialized with {} options",
            self.config.initial_options().len()
        );
        Ok(())
    }

    fn load(&mut self, media: Arc<LoadedMedia>) -> Result<()> {
        let pending = media.clone();
        self.state.update(move |s| s.loading(pending));

        let uri = media.descriptor.uri.clone();
        let start = format!("start={}", ms_to_seconds(media.start_offset_ms));
        let mut args = vec!["loadfile", uri.as_str(), "replace"];
        if media.start_offset_ms > 0 {
            args.extend(["-1", start.as_str()]);
        }

        match self.engine.command(&args) {
            Ok(()) => {
                info!("Loading {}", media.descriptor.id);
                self.current_media = Some(media);
                Ok(())
            }
            Err(e) => {
                self.current_media = None;
                self.state.update(|s| s.unloaded());
                self.state
                    .emit(PlayerEvent::Error(PlaybackError::new(e.code(), e.to_string())));
                Err(e)
            }
        }
    }

    fn attach(&mut self, target: RenderTarget) -> Result<()> {
        self.surface.attach(self.engine.as_mut(), target)
    }

    fn file_loaded(&mut self) {
        let Some(media) = self.current_media.clone() else {
            debug!("File loaded without a current media item");
            self.rebuild_tracks();
            self.state.emit(PlayerEvent::RenderedFirstFrame);
            return;
        };

        for subtitle in &media.descriptor.external_subtitles {
            let title = subtitle.title.as_deref().unwrap_or("");
            let mut args = vec!["sub-add", subtitle.uri.as_str(), "auto", title];
            if let Some(language) = subtitle.language.as_deref() {
                args.push(language);
            }
            if let Err(e) = self.engine.command(&args) {
                warn!("Failed to add subtitle {}: {}", subtitle.uri, e);
            }
        }

        self.rebuild_tracks();
        self.state.emit(PlayerEvent::RenderedFirstFrame);
        self.state
            .emit(PlayerEvent::MediaItemTransition(media.descriptor.clone()));
    }

    fn rebuild_tracks(&mut self) {
        let inventory = tracks::build_inventory(self.engine.as_mut());
        let published = inventory.clone();
        self.state.update(move |s| PlaybackState {
            tracks: published,
            ..s.clone()
        });
        self.state.emit(PlayerEvent::TracksChanged(inventory));
    }

    fn destroy(&mut self) {
        if let Err(e) = self.surface.detach(self.engine.as_mut()) {
            warn!("Detaching surface during teardown failed: {}", e);
        }
        self.engine.remove_observer();
        self.engine.destroy();
        self.current_media = None;
        self.destroyed = true;

        self.state.reset();
        self.state.shutdown();
        info!("Engine destroyed");
    }
}
