//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`Config`] for structural
//! errors such as empty routes, invalid or duplicate paths, bad status
//! codes and debug entries that fail to provision. Returns a list of
//! [`ValidationError`] values with per-field suggestions.

use axum::http::StatusCode;

use super::model::{Config, DebugEntry};
use crate::error::ValidationError;

/// Validate a single route path. Returns `Ok(())` or a human-readable error.
///
/// Routes serve static responses, so paths must be static: no `:name` or
/// `*name` segments and no `{capture}` braces.
pub fn validate_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("path cannot be empty".into());
    }
    if !path.starts_with('/') {
        return Err(format!("path must start with '/' (did you mean '/{path}'?)"));
    }
    if let Some(segment) = path
        .split('/')
        .find(|s| s.starts_with(':') || s.starts_with('*'))
    {
        return Err(format!("segment '{segment}' is a capture; route paths must be static"));
    }
    if path.contains(['{', '}']) {
        return Err("path cannot contain '{' or '}'; route paths must be static".into());
    }
    Ok(())
}

/// A static spelling of an invalid path, if one can be derived.
fn path_suggestion(path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    let cleaned: String = path
        .split('/')
        .map(|s| s.trim_start_matches([':', '*']))
        .collect::<Vec<_>>()
        .join("/")
        .replace(['{', '}'], "");
    let cleaned = if cleaned.starts_with('/') {
        cleaned
    } else {
        format!("/{cleaned}")
    };
    (cleaned != path && validate_path(&cleaned).is_ok())
        .then(|| format!("did you mean '{cleaned}'?"))
}

/// Validate a response status code. Returns `Ok(())` or a human-readable error.
pub fn validate_status(status: u16) -> Result<(), String> {
    match StatusCode::from_u16(status) {
        Ok(code) if !code.is_informational() => Ok(()),
        Ok(_) => Err(format!("{status} is informational and cannot be a final response")),
        Err(_) => Err(format!("{status} is not a valid HTTP status code")),
    }
}

fn check_chain(route: &str, field: &str, chain: &[DebugEntry], errors: &mut Vec<ValidationError>) {
    for (i, entry) in chain.iter().enumerate() {
        if let Err(e) = entry.provision() {
            errors.push(ValidationError {
                route: route.to_string(),
                field: format!("{field}[{i}]"),
                message: e.to_string(),
                suggestion: None,
            });
        }
    }
}

pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_chain("(root)", "debug", &config.debug, &mut errors);

    if config.routes.is_empty() {
        errors.push(ValidationError {
            route: "(root)".into(),
            field: "routes".into(),
            message: "at least one route must be defined".into(),
            suggestion: None,
        });
        return Err(errors);
    }

    let mut seen_paths = std::collections::HashSet::new();

    for (i, route) in config.routes.iter().enumerate() {
        let route_id = if route.path.is_empty() {
            format!("routes[{i}]")
        } else {
            route.path.clone()
        };

        if let Err(msg) = validate_path(&route.path) {
            errors.push(ValidationError {
                route: route_id.clone(),
                field: "path".into(),
                message: msg,
                suggestion: path_suggestion(&route.path),
            });
        }

        if !seen_paths.insert(&route.path) {
            errors.push(ValidationError {
                route: route_id.clone(),
                field: "path".into(),
                message: "duplicate route path".into(),
                suggestion: None,
            });
        }

        if let Err(msg) = validate_status(route.status) {
            errors.push(ValidationError {
                route: route_id.clone(),
                field: "status".into(),
                message: msg,
                suggestion: None,
            });
        }

        check_chain(&route_id, "debug", &route.debug, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[must_use]
pub fn format_validation_report(path: &str, config: &Config) -> String {
    let mut lines = vec![format!(
        "  {} routes, {} debug handlers\n",
        config.routes.len(),
        config.total_handlers()
    )];

    if !config.debug.is_empty() {
        lines.push(format!("  (all routes)  -> {} debug handlers", config.debug.len()));
    }

    for route in &config.routes {
        lines.push(format!(
            "  {}  -> {} {} ({} debug handlers)",
            route.path,
            route.status,
            if route.body.is_empty() { "<empty>" } else { "<body>" },
            route.debug.len(),
        ));
    }

    format!("{} is valid\n{}", path, lines.join("\n"))
}
