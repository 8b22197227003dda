use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use miette::{Context, IntoDiagnostic, Result};

/// env var which overrides the directory that the host gave us for config and logs.
pub const DATA_DIR_ENV: &str = "MOBHUNT_DATA_DIR";

/// MobHunt configuration directory.
/// We will read a path from env `MOBHUNT_DATA_DIR` or use the config directory handed to us by the host.
/// Inside this directory, we store the config file and logs. The directory is created if it doesn't exist.
pub fn get_mobhunt_dir(host_config_dir: &Path) -> Result<Dir> {
    let path = match std::env::var(DATA_DIR_ENV) {
        Ok(env_dir) if !env_dir.is_empty() => PathBuf::from(env_dir),
        _ => host_config_dir.to_path_buf(),
    };
    open_dir_all(&path)
}

/// Opens the directory where the host installed the addon. Bundled data lives here.
/// Unlike the config dir, we never create it. If it's missing, something is very wrong with the install.
pub fn open_install_dir(install_dir: &Path) -> Result<Dir> {
    Dir::open_ambient_dir(install_dir, ambient_authority())
        .into_diagnostic()
        .wrap_err_with(|| install_dir.display().to_string())
        .wrap_err("failed to open addon install directory")
}

/// Only the parent of `path` is opened with ambient authority. The last component is created through it.
fn open_dir_all(path: &Path) -> Result<Dir> {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return Dir::open_ambient_dir(path, ambient_authority())
            .into_diagnostic()
            .wrap_err_with(|| path.display().to_string())
            .wrap_err("failed to open mobhunt directory");
    };
    // a bare relative name has an empty parent
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    let authoratah = ambient_authority();
    Dir::create_ambient_dir_all(parent, authoratah)
        .into_diagnostic()
        .wrap_err_with(|| parent.display().to_string())
        .wrap_err("failed to create parent of mobhunt directory")?;
    let parent_dir = Dir::open_ambient_dir(parent, authoratah)
        .into_diagnostic()
        .wrap_err_with(|| parent.display().to_string())
        .wrap_err("failed to open parent of mobhunt directory")?;
    create_dir_all_in(&parent_dir, name)
}

/// Creates `relative` (and any missing directories leading to it) inside `parent` and opens it.
fn create_dir_all_in(parent: &Dir, relative: impl AsRef<Path>) -> Result<Dir> {
    let relative = relative.as_ref();
    parent
        .create_dir_all(relative)
        .into_diagnostic()
        .wrap_err_with(|| relative.display().to_string())
        .wrap_err("failed to create mobhunt directory")?;
    parent
        .open_dir(relative)
        .into_diagnostic()
        .wrap_err_with(|| relative.display().to_string())
        .wrap_err("failed to open mobhunt directory")
}
