//! Config file sources.
//!
//! Provides the file-based [`FileSource`](file_source::FileSource) and the
//! [`parse_config_str`] helper for format-specific deserialization. YAML,
//! JSON and TOML are gated by feature flags.

pub mod file_source;

use crate::config::model::Config;
use crate::error::RequestDebugError;

/// File names probed, in order, when no config path is given.
pub const AUTO_DETECT_CANDIDATES: &[&str] = &[
    "request-debug.yaml",
    "request-debug.yml",
    "request-debug.json",
    "request-debug.toml",
];

/// Parse a config string based on file extension.
pub fn parse_config_str(
    ext: &str,
    content: &str,
    path_display: &str,
) -> Result<Config, RequestDebugError> {
    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => serde_yml::from_str(content).map_err(|e| RequestDebugError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "json")]
        "json" => serde_json::from_str(content).map_err(|e| RequestDebugError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "toml")]
        "toml" => toml::from_str(content).map_err(|e| RequestDebugError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        other => Err(RequestDebugError::UnsupportedFormat(other.to_string())),
    }
}
