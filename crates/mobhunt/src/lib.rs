//! MobHunt places markers for monster spawn points on the game's map and minimap
//! whenever the player enters a zone that we have data for.

pub mod config;
pub mod debug;
mod plugin;

pub use plugin::{MobHuntPlugin, COMMAND_NAME};
