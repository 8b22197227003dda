use cap_std::fs::Dir;
use miette::{Context, IntoDiagnostic, Result};
use mob_locations::{store::DEFAULT_DATA_FILE, TrackerSettings};
use mobhunt_host::RED_CIRCLE_MARKER_ICON;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

pub const CONFIG_FILE_NAME: &str = "mobhunt_config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MobHuntConfig {
    /// path of the mob location data, relative to the addon install directory
    pub data_file: String,
    /// icon used for every marker
    pub marker_icon_id: u32,
    /// also place markers on the minimap, not just the world map
    pub minimap_markers: bool,
    /// open the debug window as soon as the addon is loaded
    pub open_debug_on_load: bool,
}

impl Default for MobHuntConfig {
    fn default() -> Self {
        Self {
            data_file: DEFAULT_DATA_FILE.to_string(),
            marker_icon_id: RED_CIRCLE_MARKER_ICON,
            minimap_markers: true,
            open_debug_on_load: false,
        }
    }
}

impl MobHuntConfig {
    /// Reads the config from `dir`. If there's none, the defaults are written there.
    /// A config that can't be read or parsed is logged and replaced by defaults in memory, but left alone on disk.
    pub fn load(dir: &Dir) -> Self {
        match dir.try_exists(CONFIG_FILE_NAME) {
            Ok(true) => {}
            Ok(false) => {
                let config = Self::default();
                match config.save(dir) {
                    Ok(_) => info!("wrote default config"),
                    Err(e) => error!(?e, "failed to write default config"),
                }
                return config;
            }
            Err(e) => {
                error!(?e, "failed to check if config exists");
                return Self::default();
            }
        }
        match Self::read(dir) {
            Ok(config) => config,
            Err(e) => {
                error!(?e, "failed to load config. using defaults");
                Self::default()
            }
        }
    }

    fn read(dir: &Dir) -> Result<Self> {
        let json = dir
            .read_to_string(CONFIG_FILE_NAME)
            .into_diagnostic()
            .wrap_err("failed to read config file")?;
        serde_json::from_str(&json)
            .into_diagnostic()
            .wrap_err("failed to deserialize config")
    }

    pub fn save(&self, dir: &Dir) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .into_diagnostic()
            .wrap_err("failed to serialize config")?;
        dir.write(CONFIG_FILE_NAME, json)
            .into_diagnostic()
            .wrap_err("failed to write config file")
    }

    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            icon_id: self.marker_icon_id,
            minimap_markers: self.minimap_markers,
        }
    }
}
