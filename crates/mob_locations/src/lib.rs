//! Monster spawn locations per zone, and the manager which puts them on the host's maps.

pub mod manager;
pub mod store;

pub use manager::{PlacementReport, TrackerSettings, ZoneMarkerTracker};
pub use store::{LoadError, MobLocationStore};
