//! Playkit Player - Thread-Safe Adapter over a Native Engine
//!
//! Three kinds of threads meet here:
//! - caller threads, which only enqueue commands and read snapshots
//! - the command thread, the sole owner of the [`playkit_engine::NativeEngine`]
//! - native callback threads, which push property and lifecycle notifications
//!
//! A fourth, internal state thread applies every snapshot update and delivers
//! every listener event, so updates never interleave and listeners observe
//! events in the order the updates were applied.

#![warn(missing_docs)]

pub mod bridge;
pub mod listeners;
pub mod player;
pub mod queue;
pub mod snapshot;
pub mod surface;
pub mod tracks;

pub use bridge::{NativeEventBridge, ENGINE_LOG_TARGET};
pub use listeners::{ListenerId, ListenerRegistry, PlayerListener};
pub use player::Player;
pub use snapshot::StateHandle;
pub use surface::SurfaceManager;
