//! The services that the game client's plugin host gives to MobHunt.
//!
//! Every part of the addon receives these as trait objects when it is created,
//! so nothing reaches for a global. The real host glue implements these traits
//! by forwarding to the client. [sandbox::SandboxHost] implements all of them in memory.

mod broadcast;
pub mod sandbox;

use std::sync::Arc;

use glam::Vec3;

pub use broadcast::{TerritoryBroadcaster, TerritorySubscription};

/// id of a zone (territory type row) in the host's static data
pub type TerritoryId = u32;
/// id of a map row in the host's static data. A zone can have multiple maps (floors).
pub type MapId = u32;

/// Red circle icon from the host's icon sheet.
pub const RED_CIRCLE_MARKER_ICON: u32 = 60561;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalPlayer {
    /// world space position
    pub position: Vec3,
}

/// The parts of a map sheet row that we care about.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MapRow {
    /// display name of the place this map belongs to. rows can point to an empty/missing place name
    pub place_name: Option<String>,
    /// percentage. 100 is the default zoom level of a map
    pub size_factor: u16,
    pub offset_x: i16,
    pub offset_y: i16,
}

pub trait ClientState {
    /// zone that the player is currently in. 0 while on title screen or loading.
    fn territory_type(&self) -> TerritoryId;
    fn map_id(&self) -> MapId;
    /// The host sends the new territory id through the subscription whenever the player changes zones.
    /// Dropping the subscription unsubscribes.
    fn subscribe_territory_changed(&self) -> TerritorySubscription;
}

pub trait ObjectTable {
    /// None during character select, loading screens etc..
    fn local_player(&self) -> Option<LocalPlayer>;
}

pub trait MapSheet {
    fn map_row(&self, map_id: MapId) -> Option<MapRow>;
}

/// Marker lists are owned by the host. It may clear them whenever it wants (eg: map window reopened).
pub trait MapMarkers {
    /// Returns false if the host refused to add the marker (eg: the marker list is full)
    fn add_map_marker(&self, position: Vec3, icon_id: u32, scale: i32) -> bool;
    fn add_minimap_marker(&self, position: Vec3, icon_id: u32, scale: i32) -> bool;
    fn reset_map_markers(&self);
    fn reset_minimap_markers(&self);
}

pub trait CommandRegistry {
    fn add_handler(&self, command: &str, help_message: &str) -> bool;
    fn remove_handler(&self, command: &str) -> bool;
}

pub trait Clipboard {
    fn set_text(&self, text: &str);
}

/// egui hands the copied text to the platform integration at the end of the frame.
impl Clipboard for egui::Context {
    fn set_text(&self, text: &str) {
        self.output_mut(|o| o.copied_text = text.to_string());
    }
}

/// All host services bundled together, so that they can be handed around as one value.
#[derive(Clone)]
pub struct HostServices {
    pub client_state: Arc<dyn ClientState>,
    pub objects: Arc<dyn ObjectTable>,
    pub map_sheet: Arc<dyn MapSheet>,
    pub markers: Arc<dyn MapMarkers>,
    pub commands: Arc<dyn CommandRegistry>,
}
