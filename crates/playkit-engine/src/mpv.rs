//! MPV-based native engine using libmpv2
//!
//! libmpv delivers notifications by polling an event queue. This binding opens
//! a second client handle on the same core, dedicated to events, and owns a
//! thread that drains it and forwards every notification to the registered
//! [`EngineObserver`]; that thread is the "native callback thread" seen by the
//! adapter.

use crate::engine::{EngineObserver, NativeEngine};
use crate::error::{EngineError, Result, STATUS_GENERIC};
use crate::types::{EndFileReason, EngineEvent, LogLevel, PropertyFormat, PropertyValue};
use libmpv2::events::{Event, PropertyData};
use libmpv2::{Format, Mpv};
use parking_lot::Mutex;
use std::ffi::CString;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Seconds the event thread blocks per poll; bounds shutdown latency
const EVENT_POLL_SECS: f64 = 0.1;

/// Name of the client handle that receives events
const EVENT_CLIENT_NAME: &str = "playkit-events";

type SharedObserver = Arc<Mutex<Option<Arc<dyn EngineObserver>>>>;

/// Owned copy of an mpv event, taken while the event handle is locked
#[derive(Debug, PartialEq)]
enum Notice {
    Property(String, PropertyValue),
    Event(EngineEvent),
    EndFile(EndFileReason, i32),
    Log {
        prefix: String,
        level: LogLevel,
        text: String,
    },
}

impl Notice {
    /// Convert one `wait_event` result.
    ///
    /// libmpv2 surfaces an end-of-file carrying an error as `Err(Raw(code))`;
    /// no other synchronous event yields a raw status.
    fn from_wait_result(result: libmpv2::Result<Event<'_>>) -> Option<Self> {
        match result {
            Ok(event) => Self::from_event(event),
            Err(libmpv2::Error::Raw(code)) => Some(Notice::EndFile(EndFileReason::Error, code)),
            Err(e) => {
                debug!("MPV event error: {:?}", e);
                None
            }
        }
    }

    fn from_event(event: Event<'_>) -> Option<Self> {
        match event {
            Event::PropertyChange { name, change, .. } => {
                property_value(change).map(|value| Notice::Property(name.to_string(), value))
            }
            Event::StartFile => Some(Notice::Event(EngineEvent::StartFile)),
            Event::FileLoaded => Some(Notice::Event(EngineEvent::FileLoaded)),
            Event::PlaybackRestart => Some(Notice::Event(EngineEvent::PlaybackRestart)),
            Event::VideoReconfig => Some(Notice::Event(EngineEvent::VideoReconfig)),
            Event::AudioReconfig => Some(Notice::Event(EngineEvent::AudioReconfig)),
            Event::Seek => Some(Notice::Event(EngineEvent::Seek)),
            Event::Shutdown => Some(Notice::Event(EngineEvent::Shutdown)),
            Event::EndFile(reason) => Some(Notice::EndFile(EndFileReason::from_raw(reason as i64), 0)),
            Event::LogMessage {
                prefix, level, text, ..
            } => Some(Notice::Log {
                prefix: prefix.to_string(),
                level: LogLevel::from_native(level).unwrap_or(LogLevel::Info),
                text: text.trim_end().to_string(),
            }),
            Event::QueueOverflow => {
                warn!("MPV event queue overflowed");
                None
            }
            _ => None,
        }
    }

    fn deliver(self, observer: &dyn EngineObserver) {
        match self {
            Notice::Property(name, value) => observer.on_property_changed(&name, value),
            Notice::Event(event) => observer.on_event(event),
            Notice::EndFile(reason, code) => observer.on_end_of_file(reason, code),
            Notice::Log {
                prefix,
                level,
                text,
            } => observer.on_log_message(&prefix, level, &text),
        }
    }
}

fn property_value(change: PropertyData<'_>) -> Option<PropertyValue> {
    match change {
        PropertyData::Flag(v) => Some(PropertyValue::Flag(v)),
        PropertyData::Int64(v) => Some(PropertyValue::Int(v)),
        PropertyData::Double(v) => Some(PropertyValue::Double(v)),
        PropertyData::Str(v) | PropertyData::OsdStr(v) => Some(PropertyValue::Str(v.to_string())),
    }
}

fn mpv_error(context: &str, err: libmpv2::Error) -> EngineError {
    match err {
        libmpv2::Error::Raw(code) => EngineError::status(code, context),
        other => EngineError::status(STATUS_GENERIC, format!("{} ({:?})", context, other)),
    }
}

fn mpv_format(format: PropertyFormat) -> Format {
    match format {
        PropertyFormat::Int => Format::Int64,
        PropertyFormat::Double => Format::Double,
        PropertyFormat::Flag => Format::Flag,
        PropertyFormat::String => Format::String,
    }
}

/// Native engine backed by libmpv
pub struct LibMpvEngine {
    created: bool,
    pending_options: Vec<(String, String)>,
    mpv: Option<Mpv>,
    events: Option<Arc<Mutex<Mpv>>>,
    observer: SharedObserver,
    running: Arc<AtomicBool>,
    event_thread: Option<JoinHandle<()>>,
    next_observe_id: u64,
}

impl LibMpvEngine {
    /// Create an unconfigured binding; the native instance is built on `initialize`
    pub fn new() -> Self {
        Self {
            created: false,
            pending_options: Vec::new(),
            mpv: None,
            events: None,
            observer: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            event_thread: None,
            next_observe_id: 1,
        }
    }

    fn mpv(&self) -> Result<&Mpv> {
        self.mpv.as_ref().ok_or(EngineError::NotInitialized)
    }

    fn events(&self) -> Result<&Arc<Mutex<Mpv>>> {
        self.events.as_ref().ok_or(EngineError::NotInitialized)
    }

    fn spawn_event_thread(&mut self, events: Arc<Mutex<Mpv>>) -> Result<()> {
        self.running.store(true, Ordering::Release);

        let running = self.running.clone();
        let observer = self.observer.clone();

        let thread = thread::Builder::new()
            .name("mpv-events".to_string())
            .spawn(move || {
                info!("MPV event thread started");

                while running.load(Ordering::Acquire) {
                    let notice = {
                        let mut client = events.lock();
                        let notice = client
                            .wait_event(EVENT_POLL_SECS)
                            .and_then(Notice::from_wait_result);
                        notice
                    };

                    let Some(notice) = notice else {
                        continue;
                    };
                    let shutdown = matches!(notice, Notice::Event(EngineEvent::Shutdown));

                    // Clone out of the lock so the observer may call back into us
                    let current = observer.lock().clone();
                    if let Some(current) = current {
                        notice.deliver(current.as_ref());
                    }

                    if shutdown {
                        break;
                    }
                }

                info!("MPV event thread stopped");
            })
            .map_err(|e| EngineError::Create(format!("event thread: {}", e)))?;

        self.event_thread = Some(thread);
        Ok(())
    }
}

impl Default for LibMpvEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeEngine for LibMpvEngine {
    fn create(&mut self) -> Result<()> {
        if self.mpv.is_some() {
            return Err(EngineError::Create("already initialized".to_string()));
        }
        self.created = true;
        self.pending_options.clear();
        Ok(())
    }

    fn set_option_string(&mut self, name: &str, value: &str) -> Result<()> {
        if let Some(mpv) = &self.mpv {
            return mpv
                .set_property(name, value)
                .map_err(|e| mpv_error(&format!("set option {}", name), e));
        }
        if !self.created {
            return Err(EngineError::NotInitialized);
        }
        self.pending_options.push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn initialize(&mut self, observer: Arc<dyn EngineObserver>) -> Result<()> {
        if !self.created {
            return Err(EngineError::NotInitialized);
        }

        info!("Initializing MPV with {} options", self.pending_options.len());

        let options = std::mem::take(&mut self.pending_options);
        let mpv = Mpv::with_initializer(|init| {
            for (name, value) in &options {
                init.set_option(name, value.as_str())?;
            }
            Ok(())
        })
        .map_err(|e| {
            error!("Failed to create MPV instance: {:?}", e);
            EngineError::Create(format!("MPV init failed: {:?}", e))
        })?;

        let client = mpv
            .create_client(Some(EVENT_CLIENT_NAME))
            .map_err(|e| EngineError::Create(format!("MPV event client failed: {:?}", e)))?;
        client
            .disable_deprecated_events()
            .map_err(|e| mpv_error("disable deprecated events", e))?;

        *self.observer.lock() = Some(observer);
        let events = Arc::new(Mutex::new(client));
        self.events = Some(events.clone());
        self.mpv = Some(mpv);
        self.spawn_event_thread(events)
    }

    fn remove_observer(&mut self) {
        *self.observer.lock() = None;
    }

    fn destroy(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.event_thread.take() {
            if thread.join().is_err() {
                warn!("MPV event thread panicked");
            }
        }
        // Event client goes before the core handle
        self.events = None;
        if self.mpv.take().is_some() {
            info!("MPV instance destroyed");
        }
        self.created = false;
    }

    fn attach_render_target(&mut self, handle: i64) -> Result<()> {
        self.mpv()?
            .set_property("wid", handle)
            .map_err(|e| mpv_error("attach render target", e))
    }

    fn detach_render_target(&mut self) -> Result<()> {
        self.mpv()?
            .set_property("wid", 0i64)
            .map_err(|e| mpv_error("detach render target", e))
    }

    fn command(&mut self, args: &[&str]) -> Result<()> {
        let (verb, rest) = args
            .split_first()
            .ok_or_else(|| EngineError::status(STATUS_GENERIC, "empty command"))?;
        self.mpv()?
            .command(verb, rest)
            .map_err(|e| mpv_error(&format!("command {}", verb), e))
    }

    fn get_property_int(&mut self, name: &str) -> Result<i64> {
        self.mpv()?
            .get_property::<i64>(name)
            .map_err(|_| EngineError::PropertyUnavailable(name.to_string()))
    }

    fn get_property_double(&mut self, name: &str) -> Result<f64> {
        self.mpv()?
            .get_property::<f64>(name)
            .map_err(|_| EngineError::PropertyUnavailable(name.to_string()))
    }

    fn get_property_bool(&mut self, name: &str) -> Result<bool> {
        self.mpv()?
            .get_property::<bool>(name)
            .map_err(|_| EngineError::PropertyUnavailable(name.to_string()))
    }

    fn get_property_string(&mut self, name: &str) -> Result<String> {
        self.mpv()?
            .get_property::<String>(name)
            .map_err(|_| EngineError::PropertyUnavailable(name.to_string()))
    }

    fn set_property_int(&mut self, name: &str, value: i64) -> Result<()> {
        self.mpv()?
            .set_property(name, value)
            .map_err(|e| mpv_error(&format!("set {}", name), e))
    }

    fn set_property_double(&mut self, name: &str, value: f64) -> Result<()> {
        self.mpv()?
            .set_property(name, value)
            .map_err(|e| mpv_error(&format!("set {}", name), e))
    }

    fn set_property_bool(&mut self, name: &str, value: bool) -> Result<()> {
        self.mpv()?
            .set_property(name, value)
            .map_err(|e| mpv_error(&format!("set {}", name), e))
    }

    fn set_property_string(&mut self, name: &str, value: &str) -> Result<()> {
        self.mpv()?
            .set_property(name, value)
            .map_err(|e| mpv_error(&format!("set {}", name), e))
    }

    fn observe_property(&mut self, name: &str, format: PropertyFormat) -> Result<()> {
        let id = self.next_observe_id;
        self.next_observe_id += 1;
        self.events()?
            .lock()
            .observe_property(name, mpv_format(format), id)
            .map_err(|e| mpv_error(&format!("observe {}", name), e))
    }

    fn request_log_messages(&mut self, level: LogLevel) -> Result<()> {
        let min_level = CString::new(level.as_native())
            .map_err(|_| EngineError::status(STATUS_GENERIC, "log level name"))?;
        let client = self.events()?.lock();
        // SAFETY: the client handle stays alive while the lock is held and
        // `min_level` outlives the call.
        let status = unsafe {
            libmpv2_sys::mpv_request_log_messages(client.ctx.as_ptr(), min_level.as_ptr())
        };
        if status < 0 {
            return Err(EngineError::status(status, "request log messages"));
        }
        debug!("Requested MPV log messages at {}", level.as_native());
        Ok(())
    }
}

impl Drop for LibMpvEngine {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        end_files: Mutex<Vec<(EndFileReason, i32)>>,
        logs: Mutex<Vec<(String, LogLevel, String)>>,
    }

    impl EngineObserver for Recorder {
        fn on_property_changed(&self, _name: &str, _value: PropertyValue) {}
        fn on_event(&self, _event: EngineEvent) {}
        fn on_end_of_file(&self, reason: EndFileReason, error_code: i32) {
            self.end_files.lock().push((reason, error_code));
        }
        fn on_log_message(&self, prefix: &str, level: LogLevel, text: &str) {
            self.logs
                .lock()
                .push((prefix.to_string(), level, text.to_string()));
        }
    }

    #[test]
    fn test_unconfigured_engine_rejects_calls() {
        let mut engine = LibMpvEngine::new();
        assert_eq!(
            engine.set_option_string("vo", "null"),
            Err(EngineError::NotInitialized)
        );
        assert_eq!(
            engine.command(&["stop"]),
            Err(EngineError::NotInitialized)
        );
        assert_eq!(
            engine.observe_property("pause", PropertyFormat::Flag),
            Err(EngineError::NotInitialized)
        );
        assert_eq!(
            engine.request_log_messages(LogLevel::Warn),
            Err(EngineError::NotInitialized)
        );
    }

    #[test]
    fn test_options_queue_until_initialize() {
        let mut engine = LibMpvEngine::default();
        engine.create().unwrap();
        engine.set_option_string("vo", "null").unwrap();
        engine.set_option_string("idle", "yes").unwrap();
        assert_eq!(engine.pending_options.len(), 2);

        engine.destroy();
        assert!(!engine.created);
        assert!(engine.mpv.is_none());
    }

    #[test]
    fn test_end_file_error_keeps_native_code() {
        let notice = Notice::from_wait_result(Err(libmpv2::Error::Raw(-13)));
        assert_eq!(notice, Some(Notice::EndFile(EndFileReason::Error, -13)));

        let recorder = Recorder::default();
        notice.unwrap().deliver(&recorder);
        assert_eq!(
            *recorder.end_files.lock(),
            vec![(EndFileReason::Error, -13)]
        );
    }

    #[test]
    fn test_clean_end_file_has_zero_code() {
        let notice = Notice::from_wait_result(Ok(Event::EndFile(0)));
        assert_eq!(notice, Some(Notice::EndFile(EndFileReason::Eof, 0)));
        assert_eq!(
            Notice::from_wait_result(Err(libmpv2::Error::InvalidUtf8)),
            None
        );
    }

    #[test]
    fn test_event_notices() {
        let change = Event::PropertyChange {
            name: "speed",
            change: PropertyData::Double(1.5),
            reply_userdata: 3,
        };
        assert_eq!(
            Notice::from_event(change),
            Some(Notice::Property(
                "speed".to_string(),
                PropertyValue::Double(1.5)
            ))
        );
        assert_eq!(
            Notice::from_event(Event::FileLoaded),
            Some(Notice::Event(EngineEvent::FileLoaded))
        );
        assert_eq!(Notice::from_event(Event::CommandReply(1)), None);
    }

    #[test]
    fn test_log_message_notice() {
        let notice = Notice::from_event(Event::LogMessage {
            prefix: "ffmpeg",
            level: "v",
            text: "probing\n",
            log_level: 50,
        })
        .unwrap();

        let recorder = Recorder::default();
        notice.deliver(&recorder);
        assert_eq!(
            *recorder.logs.lock(),
            vec![("ffmpeg".to_string(), LogLevel::Verbose, "probing".to_string())]
        );
    }
}
