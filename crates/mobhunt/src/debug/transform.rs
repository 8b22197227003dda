use glam::{Vec2, Vec3};
use mobhunt_host::MapRow;

/// Parameters that the host uses to project world positions onto a map's coordinate grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapProjection {
    /// percentage
    pub size_factor: u16,
    pub offset_x: i16,
    pub offset_y: i16,
}

impl Default for MapProjection {
    fn default() -> Self {
        Self {
            size_factor: 100,
            offset_x: 0,
            offset_y: 0,
        }
    }
}

impl From<&MapRow> for MapProjection {
    fn from(row: &MapRow) -> Self {
        Self {
            size_factor: row.size_factor,
            offset_x: row.offset_x,
            offset_y: row.offset_y,
        }
    }
}

impl MapProjection {
    /// Map grid coordinate shown to players, eg: (21.0, 21.0) is the center of a default map.
    /// The map's vertical axis is the world Z axis, just like the host does it.
    /// None if the size factor is zero.
    pub fn world_to_map(&self, world: Vec3) -> Option<Vec2> {
        if self.size_factor == 0 {
            return None;
        }
        let scale = self.size_factor as f32 / 100.0;
        let map_x = ((world.x + self.offset_x as f32) * scale / 50.0) + 21.0;
        let map_y = ((world.z + self.offset_y as f32) * scale / 50.0) + 21.0;
        Some(Vec2::new(map_x, map_y))
    }
}
