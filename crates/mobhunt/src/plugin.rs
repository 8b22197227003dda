use std::path::Path;
use std::sync::Arc;

use cap_std::fs::Dir;
use mob_locations::{MobLocationStore, ZoneMarkerTracker};
use mobhunt_core::{
    init::{get_mobhunt_dir, open_install_dir},
    trace::MobHuntTracingLayer,
};
use mobhunt_host::{Clipboard, HostServices, TerritorySubscription};
use tracing::{error, info, info_span, warn};

use crate::config::MobHuntConfig;
use crate::debug::{DebugPanel, PanelAction};

pub const COMMAND_NAME: &str = "/mobhunt";
const COMMAND_HELP: &str = "Open MobHuntOverlay debug window";

/// The addon. The host creates it once when loading the addon and drops it when unloading.
///
/// Everything runs on the host's ui thread:
/// 1. [Self::handle_command] when the user types [COMMAND_NAME]
/// 2. [Self::draw] every frame
pub struct MobHuntPlugin {
    host: HostServices,
    /// where the host installed us. bundled data lives here. None if it couldn't be opened
    install_dir: Option<Dir>,
    config: MobHuntConfig,
    tracker: ZoneMarkerTracker,
    debug_panel: DebugPanel,
    territory_changed: TerritorySubscription,
    command_registered: bool,
    /// flushes the log file when dropped. None if someone else installed the global subscriber.
    _log_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

impl MobHuntPlugin {
    /// `install_dir` contains the addon and its bundled data. `config_dir` is where the host wants us to keep our files.
    ///
    /// Never fails. Without a config dir we run with the default config and no log file.
    /// Without an install dir we run without mob data.
    pub fn new(host: HostServices, install_dir: &Path, config_dir: &Path) -> Self {
        let mobhunt_dir = match get_mobhunt_dir(config_dir) {
            Ok(dir) => Some(dir),
            Err(e) => {
                error!(?e, "failed to get mobhunt dir. using default config without a log file");
                None
            }
        };
        let log_guard = match mobhunt_dir.as_ref().map(MobHuntTracingLayer::install_tracing) {
            Some(Ok(guard)) => Some(guard),
            Some(Err(e)) => {
                warn!(?e, "failed to install tracing");
                None
            }
            None => None,
        };
        let install_dir = match open_install_dir(install_dir) {
            Ok(dir) => Some(dir),
            Err(e) => {
                error!(?e, "failed to open install dir. no mob data will be loaded");
                None
            }
        };
        let config = match &mobhunt_dir {
            Some(dir) => MobHuntConfig::load(dir),
            None => MobHuntConfig::default(),
        };
        let mut plugin = Self::with_config(host, install_dir, config);
        plugin._log_guard = log_guard;
        plugin
    }

    /// Same as [Self::new], but with already opened directories and without touching the global tracing subscriber.
    pub fn with_dirs(host: HostServices, install_dir: Dir, mobhunt_dir: &Dir) -> Self {
        Self::with_config(host, Some(install_dir), MobHuntConfig::load(mobhunt_dir))
    }

    fn with_config(host: HostServices, install_dir: Option<Dir>, config: MobHuntConfig) -> Self {
        let _span = info_span!("mobhunt init").entered();
        info!(?config, "using config");

        let mut tracker = ZoneMarkerTracker::new(host.markers.clone(), config.tracker_settings());
        // subscribe before evaluating the current zone, so that a change in between isn't lost
        let territory_changed = host.client_state.subscribe_territory_changed();
        let store = match &install_dir {
            Some(dir) => MobLocationStore::load_or_empty(dir, &config.data_file),
            None => MobLocationStore::empty(),
        };
        tracker.load_store(Arc::new(store), host.client_state.territory_type());

        let mut debug_panel = DebugPanel::new(host.clone(), config.marker_icon_id);
        debug_panel.open = config.open_debug_on_load;

        let command_registered = host.commands.add_handler(COMMAND_NAME, COMMAND_HELP);
        if !command_registered {
            warn!(command = COMMAND_NAME, "failed to register command");
        }
        info!("MobHuntOverlay loaded successfully");
        Self {
            host,
            install_dir,
            config,
            tracker,
            debug_panel,
            territory_changed,
            command_registered,
            _log_guard: None,
        }
    }

    /// The command doesn't take any arguments. It just toggles the debug window.
    pub fn handle_command(&mut self, command: &str, _args: &str) {
        if command == COMMAND_NAME {
            self.debug_panel.toggle();
        }
    }

    /// Called when the user clicks the addon's main ui button in the host's addon list.
    pub fn open_main_ui(&mut self) {
        self.debug_panel.toggle();
    }

    /// Feeds territory changes that arrived since the last call to the tracker.
    pub fn tick(&mut self) {
        for territory_id in self.territory_changed.drain() {
            self.tracker.on_territory_changed(territory_id);
        }
    }

    /// Per frame callback.
    pub fn draw(&mut self, etx: &egui::Context) {
        self.tick();
        if !self.debug_panel.open {
            return;
        }
        let actions = self.debug_panel.gui(etx, &self.tracker);
        for action in actions {
            self.apply_action(action, etx);
        }
    }

    pub fn apply_action(&mut self, action: PanelAction, clipboard: &dyn Clipboard) {
        match action {
            PanelAction::CopyPosition(position) => {
                self.debug_panel.copy_position(clipboard, position);
            }
            PanelAction::CopyTerritoryId(territory_id) => {
                self.debug_panel.copy_territory_id(clipboard, territory_id);
            }
            PanelAction::AddMarkerHere => {
                self.debug_panel.add_marker_at_player();
            }
            PanelAction::ClearAllMarkers => {
                self.debug_panel.clear_all_markers();
            }
            PanelAction::RefreshZoneMarkers => {
                let report = self.tracker.refresh();
                info!(?report, "refreshed zone markers");
            }
            PanelAction::ReloadData => {
                self.reload_data();
            }
        }
    }

    /// Reads the data file again and places the markers of the current zone from the new data.
    /// Skipped if the install dir couldn't be opened at startup.
    pub fn reload_data(&mut self) {
        let Some(install_dir) = self.install_dir.as_ref() else {
            warn!("install dir is not available. skipping reload");
            return;
        };
        let store = MobLocationStore::load_or_empty(install_dir, &self.config.data_file);
        self.tracker
            .load_store(Arc::new(store), self.host.client_state.territory_type());
    }

    pub fn tracker(&self) -> &ZoneMarkerTracker {
        &self.tracker
    }

    pub fn config(&self) -> &MobHuntConfig {
        &self.config
    }

    pub fn is_debug_open(&self) -> bool {
        self.debug_panel.open
    }
}

impl Drop for MobHuntPlugin {
    fn drop(&mut self) {
        // the territory subscription is dropped with us, which unsubscribes
        if self.command_registered {
            self.host.commands.remove_handler(COMMAND_NAME);
        }
        info!("MobHuntOverlay unloaded");
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::CONFIG_FILE_NAME;
    use cap_tempfile::TempDir;
    use glam::{vec3, Vec3};
    use mob_locations::store::DEFAULT_DATA_FILE;
    use mobhunt_host::sandbox::{MarkerCall, SandboxHost};
    use rstest::*;
    use similar_asserts::assert_eq;
    use std::sync::Mutex;

    const DATA: &str = r#"{
        "version": 1,
        "data": [
            {
                "territoryTypeId": 1187,
                "internalName": "urqopacha",
                "mobs": [ { "mobName": "a", "locations": [ { "x": 1.0, "y": 2.0, "z": 3.0 }, { "x": 4.0, "y": 5.0, "z": 6.0 } ] } ]
            },
            {
                "territoryTypeId": 1188,
                "internalName": "kozamauka",
                "mobs": [ { "mobName": "b", "locations": [ { "x": 7.0, "y": 8.0, "z": 9.0 } ] } ]
            }
        ]
    }"#;

    #[derive(Default)]
    struct RecordingClipboard(Mutex<Vec<String>>);
    impl Clipboard for RecordingClipboard {
        fn set_text(&self, text: &str) {
            self.0.lock().expect("poisoned").push(text.to_string());
        }
    }

    fn temp_dir() -> TempDir {
        TempDir::new(cap_std::ambient_authority()).expect("failed to create temp dir")
    }

    /// install dir with the data file, and an empty config dir
    #[fixture]
    fn dirs() -> (TempDir, TempDir) {
        let install = temp_dir();
        install.create_dir_all("Data").expect("failed to create Data dir");
        install
            .write(DEFAULT_DATA_FILE, DATA)
            .expect("failed to write data file");
        (install, temp_dir())
    }

    fn plugin(host: &Arc<SandboxHost>, (install, config): &(TempDir, TempDir)) -> MobHuntPlugin {
        let install_dir = install.try_clone().expect("failed to clone install dir");
        MobHuntPlugin::with_dirs(host.services(), install_dir, config)
    }

    fn placements(host: &SandboxHost) -> usize {
        host.marker_calls()
            .iter()
            .filter(|call| call.is_placement())
            .count()
    }

    #[rstest]
    fn loading_places_markers_for_current_zone(dirs: (TempDir, TempDir)) {
        let host = SandboxHost::new();
        host.set_territory_silently(1187);
        let plugin = plugin(&host, &dirs);
        assert!(plugin.tracker().is_tracking());
        assert_eq!(placements(&host), 4);
        assert!(host.registered_commands().contains_key(COMMAND_NAME));
        assert!(!plugin.is_debug_open());
        // default config was written next to the logs
        assert!(dirs.1.exists(CONFIG_FILE_NAME));
    }

    #[rstest]
    fn territory_changes_are_applied_on_tick(dirs: (TempDir, TempDir)) {
        let host = SandboxHost::new();
        let mut plugin = plugin(&host, &dirs);
        assert_eq!(placements(&host), 0);

        host.enter_territory(1188);
        assert_eq!(placements(&host), 0);
        plugin.tick();
        assert_eq!(placements(&host), 2);

        // same zone reported again
        host.enter_territory(1188);
        plugin.tick();
        assert_eq!(placements(&host), 2);

        host.enter_territory(1187);
        host.enter_territory(1188);
        plugin.tick();
        assert_eq!(placements(&host), 2 + 4 + 2);
    }

    #[rstest]
    fn missing_data_file_degrades(dirs: (TempDir, TempDir)) {
        let host = SandboxHost::new();
        host.set_territory_silently(1187);
        dirs.0
            .remove_file(DEFAULT_DATA_FILE)
            .expect("failed to remove data file");
        let mut plugin = plugin(&host, &dirs);
        assert!(plugin.tracker().store().expect("tracking").is_empty());
        host.enter_territory(1188);
        plugin.tick();
        assert!(host.marker_calls().is_empty());
    }

    #[rstest]
    fn command_toggles_debug_window(dirs: (TempDir, TempDir)) {
        let host = SandboxHost::new();
        let mut plugin = plugin(&host, &dirs);
        plugin.handle_command(COMMAND_NAME, "");
        assert!(plugin.is_debug_open());
        plugin.handle_command(COMMAND_NAME, "ignored arguments");
        assert!(!plugin.is_debug_open());
        plugin.handle_command("/someothercommand", "");
        assert!(!plugin.is_debug_open());
        plugin.open_main_ui();
        assert!(plugin.is_debug_open());
    }

    #[rstest]
    fn drop_unsubscribes_and_removes_command(dirs: (TempDir, TempDir)) {
        let host = SandboxHost::new();
        let plugin = plugin(&host, &dirs);
        assert_eq!(host.territory_subscriber_count(), 1);
        drop(plugin);
        assert_eq!(host.territory_subscriber_count(), 0);
        assert!(host.registered_commands().is_empty());
    }

    #[rstest]
    fn panel_actions(dirs: (TempDir, TempDir)) {
        let host = SandboxHost::new();
        host.set_territory_silently(1188);
        host.set_player_position(Some(vec3(-1.0, 0.5, 2.0)));
        let mut plugin = plugin(&host, &dirs);
        host.take_marker_calls();
        let clipboard = RecordingClipboard::default();

        plugin.apply_action(PanelAction::ClearAllMarkers, &clipboard);
        assert_eq!(
            host.take_marker_calls(),
            vec![MarkerCall::ResetMap, MarkerCall::ResetMiniMap]
        );

        plugin.apply_action(PanelAction::RefreshZoneMarkers, &clipboard);
        assert_eq!(placements(&host), 2);
        host.take_marker_calls();

        plugin.apply_action(PanelAction::AddMarkerHere, &clipboard);
        assert_eq!(
            host.take_marker_calls(),
            vec![MarkerCall::Map {
                position: vec3(-1.0, 0.5, 2.0),
                icon_id: plugin.config().marker_icon_id,
                scale: 0
            }]
        );

        plugin.apply_action(PanelAction::CopyTerritoryId(1188), &clipboard);
        plugin.apply_action(PanelAction::CopyPosition(Vec3::ZERO), &clipboard);
        assert_eq!(
            *clipboard.0.lock().expect("poisoned"),
            vec![
                "1188".to_string(),
                r#"{ "X": 0.00, "Y": 0.00, "Z": 0.00 }"#.to_string()
            ]
        );
    }

    #[rstest]
    fn reload_picks_up_new_data(dirs: (TempDir, TempDir)) {
        let host = SandboxHost::new();
        host.set_territory_silently(1189);
        let mut plugin = plugin(&host, &dirs);
        assert_eq!(placements(&host), 0);

        dirs.0
            .write(
                DEFAULT_DATA_FILE,
                r#"{ "version": 2, "data": [ { "territoryTypeId": 1189, "mobs": [ { "mobName": "c", "locations": [ { "x": 0.0, "y": 0.0, "z": 0.0 } ] } ] } ] }"#,
            )
            .expect("failed to write data file");
        plugin.apply_action(PanelAction::ReloadData, &RecordingClipboard::default());
        assert_eq!(plugin.tracker().store().map(|s| s.version()), Some(2));
        assert_eq!(placements(&host), 2);
    }

    #[rstest]
    fn config_controls_markers_and_window(dirs: (TempDir, TempDir)) {
        let config = MobHuntConfig {
            marker_icon_id: 60_002,
            minimap_markers: false,
            open_debug_on_load: true,
            ..Default::default()
        };
        config.save(&dirs.1).expect("failed to save config");
        let host = SandboxHost::new();
        host.set_territory_silently(1187);
        let plugin = plugin(&host, &dirs);
        assert!(plugin.is_debug_open());
        let calls = host.marker_calls();
        assert_eq!(calls.len(), 2);
        assert!(calls
            .iter()
            .all(|call| matches!(call, MarkerCall::Map { icon_id: 60_002, .. })));
    }

    #[rstest]
    fn draw_applies_pending_territory_changes(dirs: (TempDir, TempDir)) {
        let host = SandboxHost::new();
        let mut plugin = plugin(&host, &dirs);
        plugin.open_main_ui();
        host.enter_territory(1187);
        let etx = egui::Context::default();
        let _ = etx.run(Default::default(), |etx| plugin.draw(etx));
        assert_eq!(placements(&host), 4);
    }

    /// `/dev/null` is a file, so nothing can be created below it
    const UNUSABLE_CONFIG_DIR: &str = "/dev/null/mobhunt";

    #[rstest]
    fn unusable_config_dir_falls_back_to_default_config() {
        let host = SandboxHost::new();
        host.set_territory_silently(1187);
        let plugin = MobHuntPlugin::new(
            host.services(),
            Path::new(env!("CARGO_MANIFEST_DIR")),
            Path::new(UNUSABLE_CONFIG_DIR),
        );
        assert_eq!(plugin.config(), &MobHuntConfig::default());
        assert!(host.registered_commands().contains_key(COMMAND_NAME));
        // bundled data is still loaded from the install dir
        assert!(!plugin.tracker().store().expect("tracking").is_empty());
        assert!(placements(&host) > 0);
    }

    #[rstest]
    fn missing_install_dir_runs_without_data() {
        let host = SandboxHost::new();
        host.set_territory_silently(1187);
        let mut plugin = MobHuntPlugin::new(
            host.services(),
            Path::new("/nonexistent/mobhunt/install"),
            Path::new(UNUSABLE_CONFIG_DIR),
        );
        assert!(host.registered_commands().contains_key(COMMAND_NAME));
        assert!(plugin.tracker().is_tracking());
        assert!(plugin.tracker().store().expect("tracking").is_empty());

        plugin.reload_data();
        plugin.handle_command(COMMAND_NAME, "");
        assert!(plugin.is_debug_open());
        host.enter_territory(1188);
        plugin.tick();
        assert!(host.marker_calls().is_empty());

        drop(plugin);
        assert!(host.registered_commands().is_empty());
    }

    #[test_log::test]
    fn bundled_data_file_parses() {
        let manifest_dir =
            Dir::open_ambient_dir(env!("CARGO_MANIFEST_DIR"), cap_std::ambient_authority())
                .expect("failed to open crate dir");
        let store = MobLocationStore::load(&manifest_dir, DEFAULT_DATA_FILE)
            .expect("bundled data file is invalid");
        assert!(!store.is_empty());
        assert!(store.duplicate_territory_ids().is_empty());
    }
}
