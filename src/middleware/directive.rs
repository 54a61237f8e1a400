//! Directive argument parsing.
//!
//! A directive is either bare (no arguments, meaning "enable with
//! defaults") or a list of `key=value` tokens:
//!
//! ```text
//! request_debug [tag=<string>] [disabled=<yes|no>] [response_debug=<yes|no>]
//!               [uri_filter=<ERE>] [log_level=<debug|info|warn|error>]
//!               [enable_uuid=<yes|no>]
//! ```
//!
//! Values may be wrapped in double quotes, which are stripped. No other
//! escaping is performed. Parsing is pure: the same tokens always yield
//! the same [`HandlerConfig`].

use super::config::{HandlerConfig, LogLevel, UriFilter};
use crate::error::DirectiveError;

/// Parse a whitespace-separated directive argument line.
///
/// ```
/// use request_debug::middleware::directive::parse_directive;
///
/// let config = parse_directive(r#"tag="foo bar" log_level=debug"#).unwrap();
/// assert_eq!(config.tag(), "foo bar");
/// ```
pub fn parse_directive(line: &str) -> Result<HandlerConfig, DirectiveError> {
    parse_tokens(split_arguments(line))
}

/// Parse an ordered sequence of directive tokens.
pub fn parse_tokens<I, S>(tokens: I) -> Result<HandlerConfig, DirectiveError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tokens = tokens.into_iter().peekable();

    // Bare form
    if tokens.peek().is_none() {
        return Ok(HandlerConfig::default());
    }

    let mut config = HandlerConfig::default();
    for token in tokens {
        let token = token.as_ref();
        let Some((key, raw)) = token.split_once('=') else {
            return Err(DirectiveError::UnsupportedArgument(token.to_string()));
        };
        let value = raw.trim_matches('"');

        match key {
            "tag" => config.tag = value.to_string(),
            "disabled" => config.disabled = parse_switch(key, value)?,
            "response_debug" => config.response_debug_enabled = parse_switch(key, value)?,
            "enable_uuid" => config.enable_correlation_id = parse_switch(key, value)?,
            "log_level" => {
                config.log_level = value
                    .parse::<LogLevel>()
                    .map_err(|()| unsupported_value(key, value))?;
            }
            "uri_filter" => {
                config.uri_filter = if value.is_empty() {
                    None
                } else {
                    Some(UriFilter::new(value)?)
                };
            }
            _ => return Err(DirectiveError::UnsupportedArgument(token.to_string())),
        }
    }

    Ok(config)
}

/// Split a directive line on whitespace. Double quotes group a value that
/// contains spaces and are kept in the token for [`parse_tokens`] to strip.
#[must_use]
pub fn split_arguments(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                current.push(ch);
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Boolean literal: `yes|true|on` or `no|false|off`.
fn parse_switch(key: &str, value: &str) -> Result<bool, DirectiveError> {
    match value {
        "yes" | "true" | "on" => Ok(true),
        "no" | "false" | "off" => Ok(false),
        _ => Err(unsupported_value(key, value)),
    }
}

fn unsupported_value(key: &str, value: &str) -> DirectiveError {
    DirectiveError::UnsupportedValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
