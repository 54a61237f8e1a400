//! Unified error types for request-debug.
//!
//! Defines [`DirectiveError`] (provisioning failures of a single debug
//! handler), [`RequestDebugError`] (the host binary's error enum) and
//! [`ValidationError`] for host config validation failures. All use
//! `thiserror` or hand-written `Display` impls. Messages include
//! contextual hints to guide the user toward a fix.

use std::path::PathBuf;

use serde::Serialize;

/// Failure to turn directive tokens or structured settings into a
/// [`HandlerConfig`](crate::middleware::HandlerConfig).
///
/// Always fatal at provisioning time: the handler is never constructed.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DirectiveError {
    #[error("unsupported argument: {0}")]
    UnsupportedArgument(String),

    #[error("{key} argument value of {value} is unsupported")]
    UnsupportedValue { key: String, value: String },

    #[error("uri_filter directive value of {value} fails to compile: {source}")]
    FilterCompile {
        value: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub route: String,
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  route {}: {}: {}", self.route, self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RequestDebugError {
    #[error("No config file found.\n\n  {hint}")]
    NoConfigSource { hint: String },

    #[error("Config file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Config parse error in {path}:\n  {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Config validation failed:\n{}", format_errors(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Invalid debug directive in {context}: {source}")]
    Directive {
        context: String,
        #[source]
        source: DirectiveError,
    },

    #[error("Unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}
