use glam::Vec3;
use mobhunt_host::TerritoryId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Root of the bundled data file.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobLocationData {
    /// only logged. nothing compares it.
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub data: Vec<TerritoryData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerritoryData {
    pub territory_type_id: TerritoryId,
    /// name used in logs. has no meaning to the host.
    #[serde(default)]
    pub internal_name: String,
    #[serde(default)]
    pub mobs: Vec<MobEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobEntry {
    pub mob_name: String,
    pub locations: Vec<Coordinate>,
}

/// world space position of a single spawn point.
/// Only the object form `{ "x": .., "y": .., "z": .. }` is accepted, never `[x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Coordinate {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl TryFrom<Map<String, Value>> for Coordinate {
    type Error = String;

    fn try_from(object: Map<String, Value>) -> Result<Self, Self::Error> {
        let axis = |name: &str| {
            object
                .get(name)
                .and_then(Value::as_f64)
                .map(|value| value as f32)
                .ok_or_else(|| format!("coordinate field `{name}` is missing or not a number"))
        };
        Ok(Self {
            x: axis("x")?,
            y: axis("y")?,
            z: axis("z")?,
        })
    }
}

impl From<Coordinate> for Vec3 {
    fn from(c: Coordinate) -> Self {
        Vec3::new(c.x, c.y, c.z)
    }
}

impl TerritoryData {
    pub fn coordinate_count(&self) -> usize {
        self.mobs.iter().map(|mob| mob.locations.len()).sum()
    }
}
