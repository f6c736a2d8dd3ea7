//! Track inventory builder
//!
//! Inventories are rebuilt wholesale from `track-list/*` introspection. Only
//! the command thread calls [`build_inventory`], since it reads from the engine.

use playkit_core::{
    Command, TrackGroup, TrackInventory, TrackKind, TrackSelectionOverride, TrackValue,
};
use playkit_engine::NativeEngine;
use tracing::{debug, warn};

fn track_property(index: usize, field: &str) -> String {
    format!("track-list/{}/{}", index, field)
}

fn read_string(engine: &mut dyn NativeEngine, index: usize, field: &str) -> Option<String> {
    engine
        .get_property_string(&track_property(index, field))
        .ok()
        .filter(|s| !s.is_empty())
}

fn read_flag(engine: &mut dyn NativeEngine, index: usize, field: &str) -> bool {
    engine
        .get_property_bool(&track_property(index, field))
        .unwrap_or(false)
}

fn read_track(engine: &mut dyn NativeEngine, index: usize) -> Option<TrackGroup> {
    let kind_name = read_string(engine, index, "type")?;
    let Some(kind) = TrackKind::from_native(&kind_name) else {
        debug!("Skipping track {} of unknown type {}", index, kind_name);
        return None;
    };
    let native_id = engine.get_property_int(&track_property(index, "id")).ok()?;
    let is_external = read_flag(engine, index, "external");

    Some(TrackGroup {
        id: TrackGroup::synthesize_id(index, is_external, native_id),
        index,
        kind,
        native_id,
        language: read_string(engine, index, "lang"),
        codec_name: read_string(engine, index, "codec"),
        label: read_string(engine, index, "title"),
        channel_count: engine
            .get_property_int(&track_property(index, "demux-channel-count"))
            .ok()
            .and_then(|c| u32::try_from(c).ok()),
        is_default: read_flag(engine, index, "default"),
        is_forced: read_flag(engine, index, "forced"),
        is_external,
        is_selected: read_flag(engine, index, "selected"),
    })
}

/// Query the engine for its current track list
pub fn build_inventory(engine: &mut dyn NativeEngine) -> TrackInventory {
    let count = match engine.get_property_int("track-list/count") {
        Ok(count) => count.max(0) as usize,
        Err(e) => {
            debug!("No track list available: {}", e);
            return TrackInventory::empty();
        }
    };

    let groups: Vec<TrackGroup> = (0..count)
        .filter_map(|index| read_track(engine, index))
        .collect();

    debug!("Track inventory rebuilt with {} of {} tracks", groups.len(), count);
    TrackInventory::new(groups)
}

/// Map one selection override to the property write that applies it.
///
/// Returns `None`, after logging, when the requested group is not part of the
/// current inventory.
pub fn resolve_override(
    inventory: &TrackInventory,
    selection: &TrackSelectionOverride,
) -> Option<Command> {
    let property = selection.kind().selection_property();

    match selection {
        TrackSelectionOverride::Disable(_) => Some(Command::SetTrack {
            property,
            value: TrackValue::Disabled,
        }),
        TrackSelectionOverride::Select(requested) => {
            let found = inventory
                .find(&requested.id)
                .filter(|g| g.kind == requested.kind)
                .or_else(|| {
                    inventory
                        .of_kind(requested.kind)
                        .find(|g| g.native_id == requested.native_id)
                });

            match found {
                Some(group) => Some(Command::SetTrack {
                    property,
                    value: TrackValue::Id(group.native_id),
                }),
                None => {
                    warn!(
                        "No {} track matches selection {}; ignoring",
                        requested.kind, requested.id
                    );
                    None
                }
            }
        }
    }
}
