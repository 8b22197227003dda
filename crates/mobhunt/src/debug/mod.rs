//! The debug window used while collecting spawn coordinates.
//! Everything shown is read from the host every frame. Nothing is cached between frames.

mod transform;

use egui::{CollapsingHeader, Color32, Window};
use glam::Vec3;
use mob_locations::ZoneMarkerTracker;
use mobhunt_core::trace::MobHuntTracingLayer;
use mobhunt_host::{Clipboard, HostServices, MapId, MapRow, TerritoryId};
use tracing::{info, warn};

pub use transform::MapProjection;

pub const UNKNOWN_MAP_NAME: &str = "Unknown";

/// Host state that the debug window needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugSnapshot {
    pub territory_id: TerritoryId,
    pub map_id: MapId,
    pub map_row: Option<MapRow>,
    pub player_position: Vec3,
}

impl DebugSnapshot {
    /// None while there's no local player (character select, loading screens..)
    pub fn capture(host: &HostServices) -> Option<Self> {
        let player = host.objects.local_player()?;
        let map_id = host.client_state.map_id();
        Some(Self {
            territory_id: host.client_state.territory_type(),
            map_id,
            map_row: host.map_sheet.map_row(map_id),
            player_position: player.position,
        })
    }

    pub fn map_name(&self) -> &str {
        self.map_row
            .as_ref()
            .and_then(|row| row.place_name.as_deref())
            .unwrap_or(UNKNOWN_MAP_NAME)
    }

    /// falls back to the default projection if the map row is missing
    pub fn projection(&self) -> MapProjection {
        self.map_row
            .as_ref()
            .map(MapProjection::from)
            .unwrap_or_default()
    }

    pub fn position_json(&self) -> String {
        position_json(self.player_position)
    }
}

fn position_json(pos: Vec3) -> String {
    format!(
        "{{ \"X\": {:.2}, \"Y\": {:.2}, \"Z\": {:.2} }}",
        pos.x, pos.y, pos.z
    )
}

/// Buttons that were clicked this frame. They are applied after the window is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelAction {
    /// position as it was shown in the frame where the button was clicked
    CopyPosition(Vec3),
    CopyTerritoryId(TerritoryId),
    AddMarkerHere,
    ClearAllMarkers,
    RefreshZoneMarkers,
    ReloadData,
}

pub struct DebugPanel {
    pub open: bool,
    host: HostServices,
    icon_id: u32,
}

impl DebugPanel {
    pub fn new(host: HostServices, icon_id: u32) -> Self {
        Self {
            open: false,
            host,
            icon_id,
        }
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn gui(&mut self, etx: &egui::Context, tracker: &ZoneMarkerTracker) -> Vec<PanelAction> {
        let mut actions = vec![];
        let Self { open, host, .. } = self;
        Window::new("MobHunt Debug")
            .id(egui::Id::new("mobhunt_debug"))
            .open(open)
            .default_size([400.0, 350.0])
            .show(etx, |ui| match DebugSnapshot::capture(host) {
                Some(snapshot) => snapshot_ui(ui, &snapshot, tracker, &mut actions),
                None => {
                    ui.label("Player not available");
                }
            });
        actions
    }

    /// Adds a world map marker (not minimap) where the player is standing right now.
    pub fn add_marker_at_player(&self) -> bool {
        let Some(player) = self.host.objects.local_player() else {
            return false;
        };
        let pos = player.position;
        if self.host.markers.add_map_marker(pos, self.icon_id, 0) {
            info!(
                "added marker at world pos: ({:.2}, {:.2}, {:.2})",
                pos.x, pos.y, pos.z
            );
            true
        } else {
            warn!("failed to add marker");
            false
        }
    }

    /// Clears every marker the host is showing, including the ones that other addons placed.
    pub fn clear_all_markers(&self) {
        self.host.markers.reset_map_markers();
        self.host.markers.reset_minimap_markers();
        info!("cleared all markers");
    }

    pub fn copy_position(&self, clipboard: &dyn Clipboard, position: Vec3) {
        let json = position_json(position);
        clipboard.set_text(&json);
        info!("copied to clipboard: {json}");
    }

    pub fn copy_territory_id(&self, clipboard: &dyn Clipboard, territory_id: TerritoryId) {
        clipboard.set_text(&territory_id.to_string());
        info!(territory_id, "copied territory id");
    }
}

fn snapshot_ui(
    ui: &mut egui::Ui,
    snapshot: &DebugSnapshot,
    tracker: &ZoneMarkerTracker,
    actions: &mut Vec<PanelAction>,
) {
    ui.colored_label(Color32::YELLOW, "=== Territory / Map Info ===");
    ui.label(format!("TerritoryTypeId: {}", snapshot.territory_id));
    ui.label(format!("MapId: {}", snapshot.map_id));
    if let Some(row) = snapshot.map_row.as_ref() {
        ui.label(format!("Map Name: {}", snapshot.map_name()));
        ui.label(format!(
            "SizeFactor: {}, OffsetX: {}, OffsetY: {}",
            row.size_factor, row.offset_x, row.offset_y
        ));
    }
    ui.separator();

    ui.colored_label(Color32::from_rgb(0, 255, 255), "=== Player Position ===");
    let pos = snapshot.player_position;
    ui.label("World Position:");
    ui.label(format!("  X: {:.2}", pos.x));
    ui.label(format!("  Y: {:.2}", pos.y));
    ui.label(format!("  Z: {:.2}", pos.z));
    if let Some(map) = snapshot.projection().world_to_map(pos) {
        ui.label(format!("Map Coord: ({:.1}, {:.1})", map.x, map.y));
    }
    ui.separator();

    ui.colored_label(Color32::GREEN, "=== Copy to Clipboard ===");
    ui.horizontal(|ui| {
        if ui.button("Copy Position (JSON)").clicked() {
            actions.push(PanelAction::CopyPosition(pos));
        }
        if ui.button("Copy TerritoryTypeId").clicked() {
            actions.push(PanelAction::CopyTerritoryId(snapshot.territory_id));
        }
    });
    ui.separator();

    ui.colored_label(Color32::from_rgb(255, 128, 0), "=== Marker Controls ===");
    ui.horizontal(|ui| {
        if ui.button("Add Marker at Current Position").clicked() {
            actions.push(PanelAction::AddMarkerHere);
        }
        if ui.button("Clear All Markers").clicked() {
            actions.push(PanelAction::ClearAllMarkers);
        }
    });
    ui.separator();

    ui.colored_label(Color32::LIGHT_BLUE, "=== Mob Data ===");
    match tracker.store() {
        Some(store) => {
            ui.label(format!(
                "version {}, {} territories, {} coordinates",
                store.version(),
                store.territories().len(),
                store.coordinate_count()
            ));
        }
        None => {
            ui.label("not loaded");
        }
    }
    match tracker.current_territory() {
        Some(territory) => {
            ui.label(format!(
                "active: {} ({} mobs, {} coordinates)",
                territory.internal_name,
                territory.mobs.len(),
                territory.coordinate_count()
            ));
        }
        None => {
            ui.label("no mob data for this territory");
        }
    }
    ui.horizontal(|ui| {
        if ui
            .button("Refresh Zone Markers")
            .on_hover_text("place the markers of this territory again, eg: after they were cleared")
            .clicked()
        {
            actions.push(PanelAction::RefreshZoneMarkers);
        }
        if ui
            .button("Reload Data")
            .on_hover_text("read the mob location file from disk again")
            .clicked()
        {
            actions.push(PanelAction::ReloadData);
        }
    });

    CollapsingHeader::new("Recent log").show(ui, MobHuntTracingLayer::show_recent_events);
}
