//! State actor
//!
//! One thread owns every write to the published [`PlaybackState`]. The command
//! thread and native callback threads send it update closures; it applies them
//! in arrival order, swaps the result into an [`ArcSwap`] for lock-free reads,
//! and delivers the resulting listener events. Because it is the only writer,
//! no update can interleave with another, and because it is the only delivery
//! thread, listeners see events in the order updates were applied.

use crate::listeners::ListenerRegistry;
use arc_swap::ArcSwap;
use crossbeam_channel::{unbounded, Receiver, Sender};
use playkit_core::{PlaybackState, PlayerEvent};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Pure `old -> new` transition of the snapshot
pub type StateUpdate = Box<dyn FnOnce(&PlaybackState) -> PlaybackState + Send>;

/// Messages understood by the state actor
pub enum StateMessage {
    /// Apply an update and publish the result
    Update(StateUpdate),
    /// Deliver an event that is not derivable from a state diff
    Emit(PlayerEvent),
    /// Publish the empty snapshot without notifying anyone
    Reset,
    /// Stop the actor
    Shutdown,
}

/// Cloneable sender side of the actor
#[derive(Clone)]
pub struct StateHandle {
    tx: Sender<StateMessage>,
}

impl StateHandle {
    /// Queue an update. Dropped silently once the actor has stopped.
    pub fn update<F>(&self, update: F)
    where
        F: FnOnce(&PlaybackState) -> PlaybackState + Send + 'static,
    {
        self.send(StateMessage::Update(Box::new(update)));
    }

    /// Queue an explicit event
    pub fn emit(&self, event: PlayerEvent) {
        self.send(StateMessage::Emit(event));
    }

    /// Queue a reset to the empty snapshot
    pub fn reset(&self) {
        self.send(StateMessage::Reset);
    }

    /// Ask the actor to exit after draining what was queued before
    pub fn shutdown(&self) {
        self.send(StateMessage::Shutdown);
    }

    fn send(&self, message: StateMessage) {
        if self.tx.send(message).is_err() {
            debug!("State actor gone; message dropped");
        }
    }
}

/// Events implied by going from `old` to `new`, in delivery order
pub fn derive_events(old: &PlaybackState, new: &PlaybackState) -> Vec<PlayerEvent> {
    let mut events = Vec::new();

    if old.is_loading() != new.is_loading() {
        events.push(PlayerEvent::IsLoadingChanged(new.is_loading()));
    }
    if old.lifecycle != new.lifecycle {
        events.push(PlayerEvent::PlaybackStateChanged(new.lifecycle));
    }
    if old.is_playing() != new.is_playing() {
        events.push(PlayerEvent::IsPlayingChanged(new.is_playing()));
    }
    if old.video_size != new.video_size {
        if let Some(size) = new.video_size.filter(|s| s.is_complete()) {
            events.push(PlayerEvent::VideoSizeChanged(size));
        }
    }

    events
}

struct StateActor {
    rx: Receiver<StateMessage>,
    snapshot: Arc<ArcSwap<PlaybackState>>,
    listeners: Arc<ListenerRegistry>,
}

impl StateActor {
    fn run(self) {
        info!("State thread started");

        while let Ok(message) = self.rx.recv() {
            match message {
                StateMessage::Update(update) => self.apply(update),
                StateMessage::Emit(event) => self.listeners.dispatch(&event),
                StateMessage::Reset => self.snapshot.store(Arc::new(PlaybackState::empty())),
                StateMessage::Shutdown => break,
            }
        }

        info!("State thread stopped");
    }

    fn apply(&self, update: StateUpdate) {
        let old = self.snapshot.load_full();
        let new = match panic::catch_unwind(AssertUnwindSafe(|| update(old.as_ref()))) {
            Ok(new) => new.refreshed(),
            Err(_) => {
                error!("State update panicked; snapshot left unchanged");
                return;
            }
        };

        let events = derive_events(&old, &new);
        self.snapshot.store(Arc::new(new));

        for event in &events {
            self.listeners.dispatch(event);
        }
    }
}

/// Start the actor thread publishing into `snapshot`
pub fn spawn(
    name: String,
    snapshot: Arc<ArcSwap<PlaybackState>>,
    listeners: Arc<ListenerRegistry>,
) -> std::io::Result<(StateHandle, JoinHandle<()>)> {
    let (tx, rx) = unbounded();
    let actor = StateActor {
        rx,
        snapshot,
        listeners,
    };
    let handle = thread::Builder::new().name(name).spawn(move || actor.run())?;
    Ok((StateHandle { tx }, handle))
}
