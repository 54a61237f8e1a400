//! Host configuration loading and validation.
//!
//! The host config lists static routes and the debug chains in front of
//! them. Submodules provide the data model ([`model`]), validation logic
//! ([`validation`]) and the file source ([`sources`]). Configuration is
//! read once at startup; provisioned handlers are immutable afterwards.

pub mod model;
pub mod sources;
pub mod validation;

use std::path::{Path, PathBuf};

use crate::error::RequestDebugError;
use sources::file_source::FileSource;
use sources::AUTO_DETECT_CANDIDATES;

/// Pick the config file: the explicit path, or the first auto-detected
/// candidate in the current directory.
pub async fn resolve_file_source(explicit: Option<&Path>) -> Result<FileSource, RequestDebugError> {
    if let Some(path) = explicit {
        return Ok(FileSource::new(path));
    }

    for name in AUTO_DETECT_CANDIDATES {
        let path = PathBuf::from(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(path = %path.display(), "auto-detected config file");
            return Ok(FileSource::new(path));
        }
    }

    Err(RequestDebugError::NoConfigSource {
        hint: "Provide --config <file> or create ./request-debug.yaml.".into(),
    })
}
