//! Recording test double for [`NativeEngine`]
//!
//! Every call is appended to a shared log so tests can assert on exactly what
//! reached the "native" side and in which order. Property reads are served from
//! a scripted table; writes update the same table, like the real engine does.
//! Observer callbacks can be fired from any thread to simulate native threads.

use crate::engine::{EngineObserver, NativeEngine};
use crate::error::{EngineError, Result};
use crate::types::{EndFileReason, EngineEvent, LogLevel, PropertyFormat, PropertyValue};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// One recorded engine invocation
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    /// `create`
    Create,
    /// `set_option_string`
    SetOption(String, String),
    /// `initialize`
    Initialize,
    /// `remove_observer`
    RemoveObserver,
    /// `destroy`
    Destroy,
    /// `attach_render_target`
    AttachRenderTarget(i64),
    /// `detach_render_target`
    DetachRenderTarget,
    /// `command`
    Command(Vec<String>),
    /// Any `get_property_*`
    GetProperty(String),
    /// Any `set_property_*`
    SetProperty(String, PropertyValue),
    /// `observe_property`
    ObserveProperty(String, PropertyFormat),
    /// `request_log_messages`
    RequestLogMessages(LogLevel),
}

impl EngineCall {
    /// Key used by [`FakeEngine::fail_on`]: the method name, plus the property
    /// name or verb where there is one (e.g. `"set:aid"`, `"command:loadfile"`).
    fn failure_keys(&self) -> Vec<String> {
        match self {
            EngineCall::Create => vec!["create".into()],
            EngineCall::SetOption(name, _) => vec!["option".into(), format!("option:{}", name)],
            EngineCall::Initialize => vec!["initialize".into()],
            EngineCall::RemoveObserver | EngineCall::Destroy => Vec::new(),
            EngineCall::AttachRenderTarget(_) => vec!["attach".into()],
            EngineCall::DetachRenderTarget => vec!["detach".into()],
            EngineCall::Command(args) => {
                let verb = args.first().cloned().unwrap_or_default();
                vec!["command".into(), format!("command:{}", verb)]
            }
            EngineCall::GetProperty(name) => vec!["get".into(), format!("get:{}", name)],
            EngineCall::SetProperty(name, _) => vec!["set".into(), format!("set:{}", name)],
            EngineCall::ObserveProperty(name, _) => vec!["observe".into(), format!("observe:{}", name)],
            EngineCall::RequestLogMessages(_) => vec!["log".into()],
        }
    }
}

/// A track served through the fake `track-list/*` properties
#[derive(Debug, Clone, PartialEq)]
pub struct FakeTrack {
    /// `video`, `audio` or `sub`
    pub kind: &'static str,
    /// Native id
    pub id: i64,
    /// Language tag
    pub lang: Option<String>,
    /// Codec name
    pub codec: Option<String>,
    /// Title
    pub title: Option<String>,
    /// Default flag
    pub default: bool,
    /// Forced flag
    pub forced: bool,
    /// External flag
    pub external: bool,
    /// Selected flag
    pub selected: bool,
    /// Channel count (audio)
    pub channels: Option<i64>,
}

impl FakeTrack {
    /// A plain track of `kind` with `id`
    pub fn new(kind: &'static str, id: i64) -> Self {
        Self {
            kind,
            id,
            lang: None,
            codec: None,
            title: None,
            default: false,
            forced: false,
            external: false,
            selected: false,
            channels: None,
        }
    }

    /// Set the language
    pub fn lang(mut self, lang: &str) -> Self {
        self.lang = Some(lang.to_string());
        self
    }

    /// Mark as selected
    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    /// Mark as external
    pub fn external(mut self) -> Self {
        self.external = true;
        self
    }
}

#[derive(Default)]
struct FakeState {
    calls: Vec<EngineCall>,
    properties: HashMap<String, PropertyValue>,
    failing: HashSet<String>,
    observer: Option<Arc<dyn EngineObserver>>,
    initialized: bool,
}

/// Recording engine double. Clones share state.
#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Arc<Mutex<FakeState>>,
}

impl FakeEngine {
    /// New fake with no scripted properties
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded calls in order
    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().calls.clone()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Recorded property writes to `name`
    pub fn writes_to(&self, name: &str) -> Vec<PropertyValue> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::SetProperty(n, v) if n == name => Some(v.clone()),
                _ => None,
            })
            .collect()
    }

    /// Recorded commands with verb `verb`
    pub fn commands(&self, verb: &str) -> Vec<Vec<String>> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::Command(args) if args.first().map(String::as_str) == Some(verb) => {
                    Some(args.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Number of recorded reads of `name`
    pub fn reads_of(&self, name: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, EngineCall::GetProperty(n) if n == name))
            .count()
    }

    /// Whether `destroy` has been recorded
    pub fn is_destroyed(&self) -> bool {
        self.state
            .lock()
            .calls
            .iter()
            .any(|call| matches!(call, EngineCall::Destroy))
    }

    /// Script a property value
    pub fn set_value(&self, name: &str, value: PropertyValue) {
        self.state.lock().properties.insert(name.to_string(), value);
    }

    /// Replace the scripted track list
    pub fn set_tracks(&self, tracks: &[FakeTrack]) {
        let mut state = self.state.lock();
        state.properties.retain(|name, _| !name.starts_with("track-list/"));
        state.properties.insert(
            "track-list/count".to_string(),
            PropertyValue::Int(tracks.len() as i64),
        );
        for (index, track) in tracks.iter().enumerate() {
            let key = |field: &str| format!("track-list/{}/{}", index, field);
            let props = &mut state.properties;
            props.insert(key("type"), PropertyValue::Str(track.kind.to_string()));
            props.insert(key("id"), PropertyValue::Int(track.id));
            props.insert(key("default"), PropertyValue::Flag(track.default));
            props.insert(key("forced"), PropertyValue::Flag(track.forced));
            props.insert(key("external"), PropertyValue::Flag(track.external));
            props.insert(key("selected"), PropertyValue::Flag(track.selected));
            if let Some(lang) = &track.lang {
                props.insert(key("lang"), PropertyValue::Str(lang.clone()));
            }
            if let Some(codec) = &track.codec {
                props.insert(key("codec"), PropertyValue::Str(codec.clone()));
            }
            if let Some(title) = &track.title {
                props.insert(key("title"), PropertyValue::Str(title.clone()));
            }
            if let Some(channels) = track.channels {
                props.insert(key("demux-channel-count"), PropertyValue::Int(channels));
            }
        }
    }

    /// Make calls matching `key` fail (see [`EngineCall`] failure keys)
    pub fn fail_on(&self, key: &str) {
        self.state.lock().failing.insert(key.to_string());
    }

    /// Stop failing calls matching `key`
    pub fn succeed_on(&self, key: &str) {
        self.state.lock().failing.remove(key);
    }

    /// The currently registered observer
    pub fn observer(&self) -> Option<Arc<dyn EngineObserver>> {
        self.state.lock().observer.clone()
    }

    /// Fire a property notification on the calling thread
    pub fn emit_property(&self, name: &str, value: PropertyValue) {
        if let Some(observer) = self.observer() {
            observer.on_property_changed(name, value);
        }
    }

    /// Fire a lifecycle event on the calling thread
    pub fn emit_event(&self, event: EngineEvent) {
        if let Some(observer) = self.observer() {
            observer.on_event(event);
        }
    }

    /// Fire an end-of-file notification on the calling thread
    pub fn emit_end_of_file(&self, reason: EndFileReason, error_code: i32) {
        if let Some(observer) = self.observer() {
            observer.on_end_of_file(reason, error_code);
        }
    }

    /// Fire a log line on the calling thread
    pub fn emit_log(&self, prefix: &str, level: LogLevel, text: &str) {
        if let Some(observer) = self.observer() {
            observer.on_log_message(prefix, level, text);
        }
    }

    fn record(&self, call: EngineCall) -> Result<()> {
        let mut state = self.state.lock();
        let failing = call
            .failure_keys()
            .iter()
            .any(|key| state.failing.contains(key));
        let context = format!("{:?}", call);
        state.calls.push(call);
        if failing {
            return Err(EngineError::status(-1, context));
        }
        Ok(())
    }

    fn read(&self, name: &str) -> Result<PropertyValue> {
        self.record(EngineCall::GetProperty(name.to_string()))?;
        self.state
            .lock()
            .properties
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::PropertyUnavailable(name.to_string()))
    }

    fn write(&self, name: &str, value: PropertyValue) -> Result<()> {
        self.record(EngineCall::SetProperty(name.to_string(), value.clone()))?;
        self.state.lock().properties.insert(name.to_string(), value);
        Ok(())
    }

    fn unavailable(name: &str) -> EngineError {
        EngineError::PropertyUnavailable(name.to_string())
    }
}

impl NativeEngine for FakeEngine {
    fn create(&mut self) -> Result<()> {
        self.record(EngineCall::Create)
    }

    fn set_option_string(&mut self, name: &str, value: &str) -> Result<()> {
        self.record(EngineCall::SetOption(name.to_string(), value.to_string()))?;
        self.state
            .lock()
            .properties
            .insert(name.to_string(), PropertyValue::Str(value.to_string()));
        Ok(())
    }

    fn initialize(&mut self, observer: Arc<dyn EngineObserver>) -> Result<()> {
        self.record(EngineCall::Initialize)?;
        let mut state = self.state.lock();
        state.observer = Some(observer);
        state.initialized = true;
        Ok(())
    }

    fn remove_observer(&mut self) {
        let _ = self.record(EngineCall::RemoveObserver);
        self.state.lock().observer = None;
    }

    fn destroy(&mut self) {
        let _ = self.record(EngineCall::Destroy);
        let mut state = self.state.lock();
        state.observer = None;
        state.initialized = false;
    }

    fn attach_render_target(&mut self, handle: i64) -> Result<()> {
        self.record(EngineCall::AttachRenderTarget(handle))
    }

    fn detach_render_target(&mut self) -> Result<()> {
        self.record(EngineCall::DetachRenderTarget)
    }

    fn command(&mut self, args: &[&str]) -> Result<()> {
        self.record(EngineCall::Command(
            args.iter().map(|a| a.to_string()).collect(),
        ))
    }

    fn get_property_int(&mut self, name: &str) -> Result<i64> {
        self.read(name)?.as_i64().ok_or_else(|| Self::unavailable(name))
    }

    fn get_property_double(&mut self, name: &str) -> Result<f64> {
        self.read(name)?.as_f64().ok_or_else(|| Self::unavailable(name))
    }

    fn get_property_bool(&mut self, name: &str) -> Result<bool> {
        self.read(name)?.as_bool().ok_or_else(|| Self::unavailable(name))
    }

    fn get_property_string(&mut self, name: &str) -> Result<String> {
        match self.read(name)? {
            PropertyValue::Str(v) => Ok(v),
            _ => Err(Self::unavailable(name)),
        }
    }

    fn set_property_int(&mut self, name: &str, value: i64) -> Result<()> {
        self.write(name, PropertyValue::Int(value))
    }

    fn set_property_double(&mut self, name: &str, value: f64) -> Result<()> {
        self.write(name, PropertyValue::Double(value))
    }

    fn set_property_bool(&mut self, name: &str, value: bool) -> Result<()> {
        self.write(name, PropertyValue::Flag(value))
    }

    fn set_property_string(&mut self, name: &str, value: &str) -> Result<()> {
        self.write(name, PropertyValue::Str(value.to_string()))
    }

    fn observe_property(&mut self, name: &str, format: PropertyFormat) -> Result<()> {
        self.record(EngineCall::ObserveProperty(name.to_string(), format))
    }

    fn request_log_messages(&mut self, level: LogLevel) -> Result<()> {
        self.record(EngineCall::RequestLogMessages(level))
    }
}
