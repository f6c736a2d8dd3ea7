//! Native event bridge
//!
//! Receives engine notifications on engine-owned threads. Each property is
//! routed to the one snapshot field it owns through a narrow update closure.
//! Anything that needs to call back into the engine (subtitle side-loading,
//! track introspection) is handed to the command thread instead.

use crate::snapshot::StateHandle;
use crossbeam_channel::Sender;
use playkit_core::{
    seconds_to_ms, Command, LifecycleState, PlaybackError, PlaybackState, PlayerEvent, TIME_UNSET,
};
use playkit_engine::{
    EndFileReason, EngineEvent, EngineObserver, LogLevel, PropertyFormat, PropertyValue,
};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Properties the bridge knows how to route, with their observation format
pub const OBSERVED_PROPERTIES: &[(&str, PropertyFormat)] = &[
    ("pause", PropertyFormat::Flag),
    ("paused-for-cache", PropertyFormat::Flag),
    ("time-pos", PropertyFormat::Double),
    ("duration", PropertyFormat::Double),
    ("demuxer-cache-time", PropertyFormat::Double),
    ("speed", PropertyFormat::Double),
    ("sub-delay", PropertyFormat::Double),
    ("dwidth", PropertyFormat::Int),
    ("dheight", PropertyFormat::Int),
];

/// Tracing target for lines emitted by the engine itself
pub const ENGINE_LOG_TARGET: &str = "playkit::engine";

/// Engine observer feeding the state actor and the command queue
pub struct NativeEventBridge {
    state: StateHandle,
    commands: Sender<Command>,
    released: Arc<AtomicBool>,
}

impl NativeEventBridge {
    /// Bridge that goes quiet once `released` is set
    pub fn new(state: StateHandle, commands: Sender<Command>, released: Arc<AtomicBool>) -> Self {
        Self {
            state,
            commands,
            released,
        }
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    fn enqueue(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("Command thread gone; dropping follow-up command");
        }
    }

    fn guarded(&self, what: &str, f: impl FnOnce()) {
        if self.is_released() {
            return;
        }
        if panic::catch_unwind(AssertUnwindSafe(f)).is_err() {
            error!("Native callback {} panicked", what);
        }
    }

    fn route_property(&self, name: &str, value: PropertyValue) {
        match name {
            "pause" => {
                if let Some(paused) = value.as_bool() {
                    self.state.update(move |s| PlaybackState {
                        is_paused: paused,
                        ..s.clone()
                    });
                }
            }
            "paused-for-cache" => {
                if let Some(buffering) = value.as_bool() {
                    self.state.update(move |s| PlaybackState {
                        is_buffering: buffering,
                        ..s.clone()
                    });
                }
            }
            "time-pos" => {
                if let Some(ms) = time_value(&value) {
                    self.state.update(move |s| PlaybackState {
                        position_ms: ms,
                        ..s.clone()
                    });
                }
            }
            "duration" => {
                if let Some(ms) = time_value(&value) {
                    self.state.update(move |s| PlaybackState {
                        duration_ms: ms,
                        ..s.clone()
                    });
                }
            }
            "demuxer-cache-time" => {
                if let Some(ms) = time_value(&value) {
                    self.state.update(move |s| PlaybackState {
                        buffer_ms: ms,
                        ..s.clone()
                    });
                }
            }
            "speed" => match value.as_f64() {
                Some(speed) if speed.is_finite() && speed > 0.0 => {
                    self.state.update(move |s| PlaybackState { speed, ..s.clone() });
                }
                _ => debug!("Ignoring invalid speed {:?}", value),
            },
            "sub-delay" => {
                if let Some(delay) = value.as_f64().filter(|d| d.is_finite()) {
                    self.state.update(move |s| PlaybackState {
                        subtitle_delay_seconds: delay,
                        ..s.clone()
                    });
                }
            }
            "dwidth" | "dheight" => {
                let Some(extent) = value.as_i64().and_then(|v| u32::try_from(v).ok()) else {
                    return;
                };
                let is_width = name == "dwidth";
                self.state.update(move |s| {
                    let mut size = s.video_size.unwrap_or_default();
                    if is_width {
                        size.width = extent;
                    } else {
                        size.height = extent;
                    }
                    PlaybackState {
                        video_size: Some(size),
                        ..s.clone()
                    }
                });
            }
            other => trace!("Unrouted property {} = {:?}", other, value),
        }
    }

    fn route_event(&self, event: EngineEvent) {
        match event {
            EngineEvent::FileLoaded => {
                self.state.update(|s| PlaybackState {
                    is_loading_file: false,
                    lifecycle: LifecycleState::Ready,
                    ..s.clone()
                });
                self.enqueue(Command::FileLoaded);
            }
            EngineEvent::PlaybackRestart
            | EngineEvent::VideoReconfig
            | EngineEvent::AudioReconfig => self.enqueue(Command::RefreshTracks),
            other => debug!("Engine event {:?}", other),
        }
    }

    fn route_end_of_file(&self, reason: EndFileReason, error_code: i32) {
        match reason {
            EndFileReason::Eof => {
                info!("Playback reached end of stream");
                self.state.update(|s| PlaybackState {
                    lifecycle: LifecycleState::Ended,
                    is_loading_file: false,
                    is_buffering: false,
                    ..s.clone()
                });
            }
            EndFileReason::Error => {
                let error = PlaybackError::new(error_code, "Native playback failed");
                warn!("{}", error);
                self.state.update(|s| PlaybackState {
                    lifecycle: LifecycleState::Idle,
                    is_loading_file: false,
                    is_buffering: false,
                    ..s.clone()
                });
                self.state.emit(PlayerEvent::Error(error));
            }
            other => debug!("File ended ({:?})", other),
        }
    }
}

/// Seconds from a numeric property as milliseconds, rejecting NaN and infinities
fn time_value(value: &PropertyValue) -> Option<i64> {
    value
        .as_f64()
        .map(seconds_to_ms)
        .filter(|ms| *ms != TIME_UNSET)
}

impl EngineObserver for NativeEventBridge {
    fn on_property_changed(&self, name: &str, value: PropertyValue) {
        self.guarded("property", || self.route_property(name, value));
    }

    fn on_event(&self, event: EngineEvent) {
        self.guarded("event", || self.route_event(event));
    }

    fn on_end_of_file(&self, reason: EndFileReason, error_code: i32) {
        self.guarded("end-of-file", || self.route_end_of_file(reason, error_code));
    }

    fn on_log_message(&self, prefix: &str, level: LogLevel, text: &str) {
        let text = text.trim_end();
        match level {
            LogLevel::Fatal | LogLevel::Error => {
                error!(target: ENGINE_LOG_TARGET, "[{}] {}", prefix, text)
            }
            LogLevel::Warn => warn!(target: ENGINE_LOG_TARGET, "[{}] {}", prefix, text),
            LogLevel::Info => info!(target: ENGINE_LOG_TARGET, "[{}] {}", prefix, text),
            LogLevel::Verbose | LogLevel::Debug => {
                debug!(target: ENGINE_LOG_TARGET, "[{}] {}", prefix, text)
            }
            LogLevel::Trace => trace!(target: ENGINE_LOG_TARGET, "[{}] {}", prefix, text),
        }
    }
}
