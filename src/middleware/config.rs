//! Immutable per-handler configuration.
//!
//! [`HandlerConfig`] is produced once at provisioning time, either by the
//! directive parser ([`parse_tokens`](super::directive::parse_tokens)) or
//! from structured [`DebugSettings`], and is shared read-only by every
//! request the handler sees.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DirectiveError;

/// Level at which a handler emits its debug records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    #[default]
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(()),
        }
    }
}

/// A compiled URI filter. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct UriFilter {
    pattern: Regex,
}

impl UriFilter {
    /// Compile `expr` as an extended regular expression.
    ///
    /// The dialect is the `regex` crate's, a superset of POSIX ERE: Perl
    /// classes (`\d`), inline flags (`(?i)`) and lazy repetition (`*?`)
    /// are accepted rather than rejected at provisioning.
    pub fn new(expr: &str) -> Result<Self, DirectiveError> {
        Regex::new(expr)
            .map(|pattern| Self { pattern })
            .map_err(|source| DirectiveError::FilterCompile {
                value: expr.to_string(),
                source,
            })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    #[must_use]
    pub fn is_match(&self, uri: &str) -> bool {
        self.pattern.is_match(uri)
    }
}

#[derive(Debug, Clone)]
pub struct HandlerConfig {
    pub(crate) disabled: bool,
    pub(crate) tag: String,
    pub(crate) log_level: LogLevel,
    pub(crate) enable_correlation_id: bool,
    pub(crate) response_debug_enabled: bool,
    pub(crate) uri_filter: Option<UriFilter>,
}

impl Default for HandlerConfig {
    /// Enabled, correlation IDs on, records at `error`, no filter.
    fn default() -> Self {
        Self {
            disabled: false,
            tag: String::new(),
            log_level: LogLevel::default(),
            enable_correlation_id: true,
            response_debug_enabled: false,
            uri_filter: None,
        }
    }
}

impl HandlerConfig {
    #[must_use]
    pub const fn disabled(&self) -> bool {
        self.disabled
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[must_use]
    pub const fn log_level(&self) -> LogLevel {
        self.log_level
    }

    #[must_use]
    pub const fn enable_correlation_id(&self) -> bool {
        self.enable_correlation_id
    }

    #[must_use]
    pub const fn response_debug_enabled(&self) -> bool {
        self.response_debug_enabled
    }

    #[must_use]
    pub const fn uri_filter(&self) -> Option<&UriFilter> {
        self.uri_filter.as_ref()
    }

    /// Whether a request target passes the filter. No filter matches everything.
    #[must_use]
    pub fn matches(&self, uri: &str) -> bool {
        self.uri_filter.as_ref().map_or(true, |f| f.is_match(uri))
    }
}

const fn default_true() -> bool {
    true
}

fn is_true(v: &bool) -> bool {
    *v
}

fn is_false(v: &bool) -> bool {
    !*v
}

fn is_default_level(v: &LogLevel) -> bool {
    *v == LogLevel::default()
}

/// Structured form of a debug directive, as found in config files.
///
/// Keys are the directive keys; defaults match the bare directive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugSettings {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub response_debug: bool,

    /// Request-target pattern in `regex` syntax (wider than POSIX ERE,
    /// see [`UriFilter::new`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri_filter: Option<String>,

    #[serde(default, skip_serializing_if = "is_default_level")]
    pub log_level: LogLevel,

    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub enable_uuid: bool,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            tag: String::new(),
            disabled: false,
            response_debug: false,
            uri_filter: None,
            log_level: LogLevel::default(),
            enable_uuid: default_true(),
        }
    }
}

impl TryFrom<DebugSettings> for HandlerConfig {
    type Error = DirectiveError;

    fn try_from(settings: DebugSettings) -> Result<Self, Self::Error> {
        let uri_filter = match settings.uri_filter.as_deref() {
            None | Some("") => None,
            Some(expr) => Some(UriFilter::new(expr)?),
        };
        Ok(Self {
            disabled: settings.disabled,
            tag: settings.tag,
            log_level: settings.log_level,
            enable_correlation_id: settings.enable_uuid,
            response_debug_enabled: settings.response_debug,
            uri_filter,
        })
    }
}

impl From<&HandlerConfig> for DebugSettings {
    fn from(config: &HandlerConfig) -> Self {
        Self {
            tag: config.tag.clone(),
            disabled: config.disabled,
            response_debug: config.response_debug_enabled,
            uri_filter: config.uri_filter.as_ref().map(|f| f.as_str().to_string()),
            log_level: config.log_level,
            enable_uuid: config.enable_correlation_id,
        }
    }
}
