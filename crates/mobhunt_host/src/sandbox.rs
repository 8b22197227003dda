//! An in-memory host. It keeps whatever state you give it and records every marker call,
//! so that the addon can be driven without the game client.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::Vec3;

use crate::{
    ClientState, CommandRegistry, HostServices, LocalPlayer, MapId, MapMarkers, MapRow, MapSheet,
    ObjectTable, TerritoryBroadcaster, TerritoryId, TerritorySubscription,
};

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerCall {
    Map {
        position: Vec3,
        icon_id: u32,
        scale: i32,
    },
    MiniMap {
        position: Vec3,
        icon_id: u32,
        scale: i32,
    },
    ResetMap,
    ResetMiniMap,
}

impl MarkerCall {
    pub fn is_placement(&self) -> bool {
        matches!(self, Self::Map { .. } | Self::MiniMap { .. })
    }
}

#[derive(Debug, Default)]
struct SandboxState {
    territory: TerritoryId,
    map_id: MapId,
    player: Option<LocalPlayer>,
    map_rows: BTreeMap<MapId, MapRow>,
    marker_calls: Vec<MarkerCall>,
    /// when set, every marker placement is refused like a full marker list would be
    refuse_placements: bool,
    /// command -> help message
    commands: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
pub struct SandboxHost {
    state: Mutex<SandboxState>,
    territory_changed: TerritoryBroadcaster,
}

impl SandboxHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, SandboxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn services(self: &Arc<Self>) -> HostServices {
        HostServices {
            client_state: self.clone(),
            objects: self.clone(),
            map_sheet: self.clone(),
            markers: self.clone(),
            commands: self.clone(),
        }
    }

    /// Moves the player into `territory_id` and notifies subscribers, even if it's the same territory.
    pub fn enter_territory(&self, territory_id: TerritoryId) {
        self.state().territory = territory_id;
        self.territory_changed.emit(territory_id);
    }

    /// like [Self::enter_territory], but nobody is notified. useful to set the initial zone.
    pub fn set_territory_silently(&self, territory_id: TerritoryId) {
        self.state().territory = territory_id;
    }

    pub fn set_map(&self, map_id: MapId, row: Option<MapRow>) {
        let mut state = self.state();
        state.map_id = map_id;
        match row {
            Some(row) => {
                state.map_rows.insert(map_id, row);
            }
            None => {
                state.map_rows.remove(&map_id);
            }
        }
    }

    pub fn set_player_position(&self, position: Option<Vec3>) {
        self.state().player = position.map(|position| LocalPlayer { position });
    }

    pub fn refuse_placements(&self, refuse: bool) {
        self.state().refuse_placements = refuse;
    }

    pub fn marker_calls(&self) -> Vec<MarkerCall> {
        self.state().marker_calls.clone()
    }

    pub fn take_marker_calls(&self) -> Vec<MarkerCall> {
        std::mem::take(&mut self.state().marker_calls)
    }

    pub fn registered_commands(&self) -> BTreeMap<String, String> {
        self.state().commands.clone()
    }

    pub fn territory_subscriber_count(&self) -> usize {
        self.territory_changed.subscriber_count()
    }
}

impl ClientState for SandboxHost {
    fn territory_type(&self) -> TerritoryId {
        self.state().territory
    }

    fn map_id(&self) -> MapId {
        self.state().map_id
    }

    fn subscribe_territory_changed(&self) -> TerritorySubscription {
        self.territory_changed.subscribe()
    }
}

impl ObjectTable for SandboxHost {
    fn local_player(&self) -> Option<LocalPlayer> {
        self.state().player
    }
}

impl MapSheet for SandboxHost {
    fn map_row(&self, map_id: MapId) -> Option<MapRow> {
        self.state().map_rows.get(&map_id).cloned()
    }
}

impl MapMarkers for SandboxHost {
    fn add_map_marker(&self, position: Vec3, icon_id: u32, scale: i32) -> bool {
        let mut state = self.state();
        state.marker_calls.push(MarkerCall::Map {
            position,
            icon_id,
            scale,
        });
        !state.refuse_placements
    }

    fn add_minimap_marker(&self, position: Vec3, icon_id: u32, scale: i32) -> bool {
        let mut state = self.state();
        state.marker_calls.push(MarkerCall::MiniMap {
            position,
            icon_id,
            scale,
        });
        !state.refuse_placements
    }

    fn reset_map_markers(&self) {
        self.state().marker_calls.push(MarkerCall::ResetMap);
    }

    fn reset_minimap_markers(&self) {
        self.state().marker_calls.push(MarkerCall::ResetMiniMap);
    }
}

impl CommandRegistry for SandboxHost {
    fn add_handler(&self, command: &str, help_message: &str) -> bool {
        let mut state = self.state();
        if state.commands.contains_key(command) {
            tracing::warn!(command, "command is already registered");
            return false;
        }
        state
            .commands
            .insert(command.to_string(), help_message.to_string());
        true
    }

    fn remove_handler(&self, command: &str) -> bool {
        self.state().commands.remove(command).is_some()
    }
}
