use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Reasons why the bundled data file couldn't be turned into a store.
/// None of these are fatal. The addon keeps running without markers.
#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("mob location data not found at {}", .0.display())]
    #[diagnostic(
        code(mob_locations::not_found),
        help("the data file is bundled with the addon. try reinstalling it")
    )]
    NotFound(PathBuf),
    #[error("failed to read mob location data at {}", .path.display())]
    #[diagnostic(code(mob_locations::read_error))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse mob location data at {}", .path.display())]
    #[diagnostic(code(mob_locations::parse_error))]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
