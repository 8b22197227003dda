//! Keeps the host's maps populated with the spawn points of the zone that the player is in.
//!
//! 1. Until a store is handed over, the tracker is idle and ignores territory changes.
//! 2. When a store arrives, the current territory is evaluated right away.
//! 3. On every territory change, the new zone is looked up and its markers are placed.
//!    A notification for the zone we already handled is ignored.
//! 4. The host owns the marker lists and can wipe them whenever it wants. [ZoneMarkerTracker::refresh] puts them back.

use std::sync::Arc;

use glam::Vec3;
use mobhunt_host::{MapMarkers, TerritoryId, RED_CIRCLE_MARKER_ICON};
use tracing::{debug, info, warn};

use crate::store::{MobLocationStore, TerritoryData};

/// How the markers look. Shared by every placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerSettings {
    pub icon_id: u32,
    /// also put every marker on the minimap
    pub minimap_markers: bool,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            icon_id: RED_CIRCLE_MARKER_ICON,
            minimap_markers: true,
        }
    }
}

/// How many marker placements the host accepted or refused during one [ZoneMarkerTracker::place_markers]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlacementReport {
    pub map_placed: usize,
    pub map_failed: usize,
    pub minimap_placed: usize,
    pub minimap_failed: usize,
}

impl PlacementReport {
    pub fn attempted(&self) -> usize {
        self.map_placed + self.map_failed + self.minimap_placed + self.minimap_failed
    }

    pub fn failed(&self) -> usize {
        self.map_failed + self.minimap_failed
    }
}

#[derive(Debug, Default)]
enum TrackerState {
    /// no store yet
    #[default]
    Idle,
    Tracking {
        store: Arc<MobLocationStore>,
        /// last territory that we acted on. None until the first evaluation.
        last_territory_id: Option<TerritoryId>,
        /// index of the active zone inside `store`
        current: Option<usize>,
    },
}

pub struct ZoneMarkerTracker {
    markers: Arc<dyn MapMarkers>,
    settings: TrackerSettings,
    state: TrackerState,
}

impl ZoneMarkerTracker {
    pub fn new(markers: Arc<dyn MapMarkers>, settings: TrackerSettings) -> Self {
        Self {
            markers,
            settings,
            state: TrackerState::Idle,
        }
    }

    /// Starts tracking with `store`, and evaluates `current_territory` as if we just entered it.
    /// Calling this again replaces the store and forgets the previous zone, so the markers are placed again.
    pub fn load_store(
        &mut self,
        store: Arc<MobLocationStore>,
        current_territory: TerritoryId,
    ) -> Option<PlacementReport> {
        info!(
            version = store.version(),
            territories = store.territories().len(),
            "tracking mob locations"
        );
        self.state = TrackerState::Tracking {
            store,
            last_territory_id: None,
            current: None,
        };
        self.on_territory_changed(current_territory)
    }

    /// Returns the placement report if we entered a zone which has mob data.
    pub fn on_territory_changed(&mut self, territory_id: TerritoryId) -> Option<PlacementReport> {
        let TrackerState::Tracking {
            store,
            last_territory_id,
            current,
        } = &mut self.state
        else {
            debug!(territory_id, "ignoring territory change. no mob data loaded yet");
            return None;
        };
        if *last_territory_id == Some(territory_id) {
            return None;
        }
        *last_territory_id = Some(territory_id);
        match store.find_territory(territory_id) {
            Some((index, territory)) => {
                info!(
                    territory_id,
                    internal_name = %territory.internal_name,
                    "territory changed, adding markers"
                );
                *current = Some(index);
            }
            None => {
                debug!(territory_id, "no mob data for territory");
                *current = None;
                return None;
            }
        }
        Some(self.place_markers())
    }

    /// Puts a marker on the map (and minimap) for every spawn point of the active zone.
    /// A refused marker is logged and skipped. The rest are still placed.
    pub fn place_markers(&self) -> PlacementReport {
        let mut report = PlacementReport::default();
        let Some(territory) = self.current_territory() else {
            return report;
        };
        let TrackerSettings {
            icon_id,
            minimap_markers,
        } = self.settings;
        for mob in &territory.mobs {
            for location in &mob.locations {
                let position = Vec3::from(*location);
                if self.markers.add_map_marker(position, icon_id, 0) {
                    debug!(mob_name = %mob.mob_name, %position, "added map marker");
                    report.map_placed += 1;
                } else {
                    warn!(mob_name = %mob.mob_name, %position, "failed to add map marker");
                    report.map_failed += 1;
                }
                if !minimap_markers {
                    continue;
                }
                if self.markers.add_minimap_marker(position, icon_id, 0) {
                    report.minimap_placed += 1;
                } else {
                    warn!(mob_name = %mob.mob_name, %position, "failed to add minimap marker");
                    report.minimap_failed += 1;
                }
            }
        }
        report
    }

    /// Places the markers of the active zone again, eg: after the host cleared its marker lists.
    pub fn refresh(&self) -> PlacementReport {
        self.place_markers()
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, TrackerState::Tracking { .. })
    }

    pub fn last_territory_id(&self) -> Option<TerritoryId> {
        match &self.state {
            TrackerState::Idle => None,
            TrackerState::Tracking {
                last_territory_id, ..
            } => *last_territory_id,
        }
    }

    pub fn store(&self) -> Option<&Arc<MobLocationStore>> {
        match &self.state {
            TrackerState::Idle => None,
            TrackerState::Tracking { store, .. } => Some(store),
        }
    }

    pub fn current_territory(&self) -> Option<&TerritoryData> {
        match &self.state {
            TrackerState::Tracking {
                store,
                current: Some(index),
                ..
            } => store.territory(*index),
            _ => None,
        }
    }

    pub fn settings(&self) -> TrackerSettings {
        self.settings
    }
}
