//! `request-debug parse`: check a debug directive.
//!
//! Parses the directive arguments exactly as a provisioned handler would
//! and prints the effective settings as JSON.

use crate::cli::ParseArgs;
use crate::error::RequestDebugError;
use crate::middleware::directive::parse_tokens;
use crate::middleware::HandlerConfig;

#[must_use]
pub fn describe(config: &HandlerConfig) -> serde_json::Value {
    serde_json::json!({
        "tag": config.tag(),
        "disabled": config.disabled(),
        "response_debug": config.response_debug_enabled(),
        "uri_filter": config.uri_filter().map(|f| f.as_str()),
        "log_level": config.log_level(),
        "enable_uuid": config.enable_correlation_id(),
    })
}

pub fn execute(args: &ParseArgs) -> Result<(), RequestDebugError> {
    let config = parse_tokens(&args.args).map_err(|source| RequestDebugError::Directive {
        context: "command line".into(),
        source,
    })?;

    let value = describe(&config);
    let rendered = if args.pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    };
    println!("{}", rendered.map_err(|e| RequestDebugError::Io(e.into()))?);
    Ok(())
}
