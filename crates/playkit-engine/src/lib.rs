//! Playkit Engine - Native Playback Engine Boundary
//!
//! This crate defines the contract the player adapter consumes from a native
//! decoding/rendering engine:
//! - [`NativeEngine`]: lifecycle, render target, scripting verbs and typed properties
//! - [`EngineObserver`]: the asynchronous callback surface the engine invokes
//!
//! ## Feature Flags
//!
//! - `libmpv`: [`LibMpvEngine`], a binding over libmpv (requires `libmpv2`)
//! - `test-util`: [`FakeEngine`], a recording test double

#![warn(missing_docs)]

pub mod engine;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod fake;
#[cfg(feature = "libmpv")]
pub mod mpv;
pub mod types;

pub use engine::{EngineObserver, NativeEngine};
pub use error::{EngineError, Result};
#[cfg(any(test, feature = "test-util"))]
pub use fake::{EngineCall, FakeEngine, FakeTrack};
#[cfg(feature = "libmpv")]
pub use mpv::LibMpvEngine;
pub use types::{EndFileReason, EngineEvent, LogLevel, PropertyFormat, PropertyValue};
