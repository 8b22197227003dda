//! The bundled data file is a json document like
//! ```json
//! { "version": 1, "data": [
//!     { "territoryTypeId": 1187, "internalName": "urqopacha", "mobs": [
//!         { "mobName": "...", "locations": [ { "x": 1.0, "y": 2.0, "z": 3.0 } ] }
//!     ] }
//! ] }
//! ```
//! It is read once when the addon starts and never modified.

mod error;
mod schema;

use std::collections::BTreeSet;
use std::path::Path;

use cap_std::fs::Dir;
use mobhunt_host::TerritoryId;
use tracing::{error, info, warn};

pub use error::LoadError;
pub use schema::{Coordinate, MobEntry, MobLocationData, TerritoryData};

/// path of the data file, relative to the addon install directory
pub const DEFAULT_DATA_FILE: &str = "Data/MobLocations.json";

/// Read only table of zone -> mobs -> spawn coordinates.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MobLocationStore {
    data: MobLocationData,
}

impl MobLocationStore {
    /// A store without any zones. Every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(data: MobLocationData) -> Self {
        let store = Self { data };
        for territory_id in store.duplicate_territory_ids() {
            warn!(
                territory_id,
                "territory appears more than once in mob location data. only the first entry is used"
            );
        }
        store
    }

    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json).map(Self::new)
    }

    /// Reads and parses the data file at `path` inside `dir`.
    pub fn load(dir: &Dir, path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let exists = dir.try_exists(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if !exists {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }
        let json = dir.read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_json_str(&json).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            version = store.version(),
            territories = store.territories().len(),
            coordinates = store.coordinate_count(),
            "loaded mob location data"
        );
        Ok(store)
    }

    /// Like [Self::load], but a failure is only logged and we get an empty store instead.
    pub fn load_or_empty(dir: &Dir, path: impl AsRef<Path>) -> Self {
        match Self::load(dir, path) {
            Ok(store) => store,
            Err(e) => {
                error!(?e, "failed to load mob location data. no markers will be placed");
                Self::empty()
            }
        }
    }

    pub fn version(&self) -> i64 {
        self.data.version
    }

    pub fn territories(&self) -> &[TerritoryData] {
        &self.data.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.data.is_empty()
    }

    /// First entry with the given id, along with its index. The index stays valid for the lifetime of this store.
    pub fn find_territory(&self, territory_id: TerritoryId) -> Option<(usize, &TerritoryData)> {
        self.data
            .data
            .iter()
            .enumerate()
            .find(|(_, territory)| territory.territory_type_id == territory_id)
    }

    pub fn territory(&self, index: usize) -> Option<&TerritoryData> {
        self.data.data.get(index)
    }

    /// ids which appear more than once, in the order of their second appearance.
    pub fn duplicate_territory_ids(&self) -> Vec<TerritoryId> {
        let mut seen = BTreeSet::new();
        let mut duplicates = vec![];
        for territory in &self.data.data {
            if !seen.insert(territory.territory_type_id)
                && !duplicates.contains(&territory.territory_type_id)
            {
                duplicates.push(territory.territory_type_id);
            }
        }
        duplicates
    }

    /// number of spawn coordinates across all zones
    pub fn coordinate_count(&self) -> usize {
        self.data
            .data
            .iter()
            .map(TerritoryData::coordinate_count)
            .sum()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use mobhunt_core::trace::MobHuntTracingLayer;
    use rstest::*;
    use similar_asserts::assert_eq;
    use tracing_subscriber::prelude::*;

    const ONE_ZONE: &str = r#"{
        "version": 1,
        "data": [
            {
                "territoryTypeId": 1187,
                "internalName": "urqopacha",
                "mobs": [
                    {
                        "mobName": "Yeheheceyaa",
                        "locations": [
                            { "x": 10.5, "y": -3.25, "z": 200.0 },
                            { "x": -41.0, "y": 7.0, "z": 12.75 }
                        ]
                    }
                ]
            }
        ]
    }"#;

    fn temp_install_dir() -> cap_tempfile::TempDir {
        cap_tempfile::TempDir::new(cap_std::ambient_authority()).expect("failed to create temp dir")
    }

    #[test]
    fn well_formed_file_keeps_order() {
        let dir = temp_install_dir();
        dir.create_dir_all("Data").expect("failed to create Data dir");
        dir.write(DEFAULT_DATA_FILE, ONE_ZONE)
            .expect("failed to write data file");

        let store = MobLocationStore::load(&dir, DEFAULT_DATA_FILE).expect("failed to load");
        assert_eq!(store.version(), 1);
        let (index, territory) = store.find_territory(1187).expect("zone is missing");
        assert_eq!(index, 0);
        assert_eq!(territory.internal_name, "urqopacha");
        assert_eq!(territory.mobs.len(), 1);
        let mob = &territory.mobs[0];
        assert_eq!(mob.mob_name, "Yeheheceyaa");
        assert_eq!(
            mob.locations,
            vec![
                Coordinate {
                    x: 10.5,
                    y: -3.25,
                    z: 200.0
                },
                Coordinate {
                    x: -41.0,
                    y: 7.0,
                    z: 12.75
                }
            ]
        );
        assert_eq!(store.coordinate_count(), 2);
    }

    #[test]
    fn absent_file_is_not_found_and_degrades_to_empty() {
        let dir = temp_install_dir();
        let err = MobLocationStore::load(&dir, DEFAULT_DATA_FILE).expect_err("file doesn't exist");
        assert!(matches!(err, LoadError::NotFound(_)), "{err:?}");

        let subscriber = tracing_subscriber::registry().with(MobHuntTracingLayer);
        let store = tracing::subscriber::with_default(subscriber, || {
            MobLocationStore::load_or_empty(&dir, DEFAULT_DATA_FILE)
        });
        assert!(store.is_empty());
        assert!(store.find_territory(1187).is_none());
        assert!(store.find_territory(0).is_none());

        let logged = MobHuntTracingLayer::recent_messages();
        assert!(
            logged.iter().any(|(level, message)| *level == tracing::Level::ERROR
                && message.starts_with("failed to load mob location data")
                && message.contains("NotFound")),
            "{logged:?}"
        );
    }

    #[rstest]
    #[case::not_json("this is not json")]
    #[case::wrong_type(r#"{ "version": 1, "data": {} }"#)]
    #[case::missing_territory_id(r#"{ "data": [ { "internalName": "x" } ] }"#)]
    #[case::coordinate_as_array(
        r#"{ "data": [ { "territoryTypeId": 1, "mobs": [ { "mobName": "a", "locations": [[1, 2, 3]] } ] } ] }"#
    )]
    #[case::coordinate_missing_z(
        r#"{ "data": [ { "territoryTypeId": 1, "mobs": [ { "mobName": "a", "locations": [ { "x": 1, "y": 2 } ] } ] } ] }"#
    )]
    #[case::coordinate_as_string(
        r#"{ "data": [ { "territoryTypeId": 1, "mobs": [ { "mobName": "a", "locations": [ { "x": "1", "y": 2, "z": 3 } ] } ] } ] }"#
    )]
    #[case::missing_mob_name(
        r#"{ "data": [ { "territoryTypeId": 1, "mobs": [ { "locations": [] } ] } ] }"#
    )]
    #[case::missing_locations(
        r#"{ "data": [ { "territoryTypeId": 1, "mobs": [ { "mobName": "a" } ] } ] }"#
    )]
    fn malformed_file_is_parse_error(#[case] json: &str) {
        let dir = temp_install_dir();
        dir.write("broken.json", json).expect("failed to write file");
        let err = MobLocationStore::load(&dir, "broken.json").expect_err("json is malformed");
        assert!(matches!(err, LoadError::Parse { .. }), "{err:?}");
        assert!(MobLocationStore::load_or_empty(&dir, "broken.json").is_empty());
    }

    #[test]
    fn optional_fields_have_defaults() {
        let store = MobLocationStore::from_json_str(r#"{ "data": [ { "territoryTypeId": 5 } ] }"#)
            .expect("failed to parse");
        assert_eq!(store.version(), 0);
        let (_, territory) = store.find_territory(5).expect("zone is missing");
        assert!(territory.mobs.is_empty());
        assert_eq!(territory.internal_name, "");
    }

    #[test]
    fn integer_coordinates_and_extra_fields_are_accepted() {
        let store = MobLocationStore::from_json_str(
            r#"{ "data": [ { "territoryTypeId": 5, "mobs": [
                { "mobName": "a", "locations": [ { "x": 1, "y": -2, "z": 3.5, "note": "by the tree" } ] }
            ] } ] }"#,
        )
        .expect("failed to parse");
        let (_, territory) = store.find_territory(5).expect("zone is missing");
        assert_eq!(
            territory.mobs[0].locations,
            vec![Coordinate {
                x: 1.0,
                y: -2.0,
                z: 3.5
            }]
        );
    }

    #[test]
    fn first_duplicate_wins() {
        let store = MobLocationStore::from_json_str(
            r#"{ "version": 2, "data": [
                { "territoryTypeId": 7, "internalName": "first" },
                { "territoryTypeId": 8, "internalName": "other" },
                { "territoryTypeId": 7, "internalName": "second" },
                { "territoryTypeId": 7, "internalName": "third" }
            ] }"#,
        )
        .expect("failed to parse");
        let (index, territory) = store.find_territory(7).expect("zone is missing");
        assert_eq!(index, 0);
        assert_eq!(territory.internal_name, "first");
        assert_eq!(store.duplicate_territory_ids(), vec![7]);
    }
}
