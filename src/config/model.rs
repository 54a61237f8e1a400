//! Serde data structures for the host configuration file.
//!
//! Contains [`Config`] (the root), [`Route`] and [`DebugEntry`]. A debug
//! entry is either a directive argument string or a structured
//! [`DebugSettings`] table; both provision the same
//! [`HandlerConfig`].

use serde::{Deserialize, Serialize};

use crate::error::DirectiveError;
use crate::middleware::directive::parse_directive;
use crate::middleware::{DebugSettings, HandlerConfig};

const fn default_status() -> u16 {
    200
}

fn is_default_status(v: &u16) -> bool {
    *v == default_status()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Debug chain applied to every request, outermost first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub debug: Vec<DebugEntry>,

    pub routes: Vec<Route>,
}

impl Config {
    #[must_use]
    pub fn total_handlers(&self) -> usize {
        self.debug.len() + self.routes.iter().map(|r| r.debug.len()).sum::<usize>()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Route {
    pub path: String,

    /// Debug chain applied to this route only, outermost first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub debug: Vec<DebugEntry>,

    #[serde(default = "default_status", skip_serializing_if = "is_default_status")]
    pub status: u16,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DebugEntry {
    Directive(String),
    Settings(DebugSettings),
}

impl DebugEntry {
    pub fn provision(&self) -> Result<HandlerConfig, DirectiveError> {
        match self {
            Self::Directive(line) => parse_directive(line),
            Self::Settings(settings) => HandlerConfig::try_from(settings.clone()),
        }
    }
}
