//! `request-debug validate`: check a configuration file for errors.
//!
//! Parses the config file and provisions every debug entry without
//! binding a listener. Results are printed as human-readable text or as
//! a JSON report.

use serde::Serialize;

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::config::model::Config;
use crate::config::sources::parse_config_str;
use crate::config::validation;
use crate::error::{RequestDebugError, ValidationError};

#[derive(Serialize)]
struct RouteSummary<'a> {
    path: &'a str,
    status: u16,
    debug_handlers: usize,
}

#[derive(Serialize)]
struct Report<'a> {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    routes: Option<Vec<RouteSummary<'a>>>,
    #[serde(skip_serializing_if = "no_errors")]
    errors: &'a [ValidationError],
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn no_errors(errors: &&[ValidationError]) -> bool {
    errors.is_empty()
}

fn summarize(config: &Config) -> Vec<RouteSummary<'_>> {
    config
        .routes
        .iter()
        .map(|r| RouteSummary {
            path: &r.path,
            status: r.status,
            debug_handlers: config.debug.len() + r.debug.len(),
        })
        .collect()
}

fn print_json(report: &Report<'_>) -> Result<(), RequestDebugError> {
    let rendered = serde_json::to_string(report).map_err(|e| RequestDebugError::Io(e.into()))?;
    println!("{rendered}");
    Ok(())
}

pub fn execute(args: &ValidateArgs) -> Result<(), RequestDebugError> {
    let path = &args.config;

    if !path.exists() {
        return Err(RequestDebugError::ConfigFileNotFound { path: path.clone() });
    }

    let content = std::fs::read_to_string(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let config = parse_config_str(ext, &content, &path.display().to_string())?;

    if let Err(errors) = validation::validate(&config) {
        match args.format {
            ValidateFormat::Text => {
                eprintln!("\u{2717} {} has {} errors\n", path.display(), errors.len());
                for error in &errors {
                    eprintln!("{error}");
                }
            }
            ValidateFormat::Json => print_json(&Report {
                valid: false,
                routes: None,
                errors: &errors,
            })?,
        }
        return Err(RequestDebugError::ConfigValidation { errors });
    }

    match args.format {
        ValidateFormat::Text => println!(
            "\u{2713} {}",
            validation::format_validation_report(&path.display().to_string(), &config)
        ),
        ValidateFormat::Json => print_json(&Report {
            valid: true,
            routes: Some(summarize(&config)),
            errors: &[],
        })?,
    }

    Ok(())
}
