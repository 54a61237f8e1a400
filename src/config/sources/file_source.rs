//! Async file-based config source.
//!
//! [`FileSource`] reads a config file via Tokio, picks the format from the
//! file extension, and validates the result before handing it out.

use std::path::{Path, PathBuf};

use super::parse_config_str;
use crate::config::model::Config;
use crate::config::validation::validate;
use crate::error::RequestDebugError;

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn extension(&self) -> &str {
        self.path.extension().and_then(|e| e.to_str()).unwrap_or("")
    }

    async fn read_content(&self) -> Result<String, RequestDebugError> {
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RequestDebugError::ConfigFileNotFound {
                    path: self.path.clone(),
                }
            } else {
                RequestDebugError::Io(e)
            }
        })
    }

    pub async fn load(&self) -> Result<Config, RequestDebugError> {
        let content = self.read_content().await?;
        let config = parse_config_str(self.extension(), &content, &self.path.display().to_string())?;

        if let Err(errors) = validate(&config) {
            return Err(RequestDebugError::ConfigValidation { errors });
        }

        Ok(config)
    }
}
