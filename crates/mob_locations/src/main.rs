//! Checks a mob location data file the same way the addon loads it.
//!
//! usage: `mobhunt_check <install dir> [data file relative to install dir]`

use mob_locations::store::{MobLocationStore, DEFAULT_DATA_FILE};
use miette::{bail, IntoDiagnostic, Result};
use tracing::info;

fn main() -> Result<()> {
    {
        use tracing_subscriber::prelude::*;
        use tracing_subscriber::{fmt, EnvFilter};
        let filter_layer = EnvFilter::try_from_env(mobhunt_core::trace::LOG_ENV)
            .or_else(|_| EnvFilter::try_new("info"))
            .into_diagnostic()?;
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
    info!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let Some(install_dir) = args.next() else {
        bail!("usage: mobhunt_check <install dir> [data file]");
    };
    let data_file = args.next().unwrap_or_else(|| DEFAULT_DATA_FILE.to_string());

    let dir = mobhunt_core::init::open_install_dir(std::path::Path::new(&install_dir))?;
    let store = MobLocationStore::load(&dir, &data_file)?;

    println!("version: {}", store.version());
    println!("territories: {}", store.territories().len());
    println!("coordinates: {}", store.coordinate_count());
    for territory in store.territories() {
        println!(
            "  {:>5} {:<24} mobs: {:>3} coordinates: {:>4}",
            territory.territory_type_id,
            territory.internal_name,
            territory.mobs.len(),
            territory.coordinate_count()
        );
        for mob in territory.mobs.iter().filter(|mob| mob.locations.is_empty()) {
            println!("        mob without locations: {}", mob.mob_name);
        }
    }
    let duplicates = store.duplicate_territory_ids();
    if !duplicates.is_empty() {
        println!("duplicate territory ids (only the first entry is used): {duplicates:?}");
    }
    Ok(())
}
