//! Field extraction and redaction.
//!
//! Turns a request (or a recorded response) into a serializable snapshot.
//! Raw `Cookie` / `Set-Cookie` lines never reach the generic header map;
//! cookies are reported as structured name/value pairs instead. Headers
//! and query parameters with a single value collapse to a scalar, repeated
//! names keep every value in order.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::body::{Body, HttpBody};
use axum::extract::{ConnectInfo, Request};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, COOKIE, HOST, REFERER, SET_COOKIE, USER_AGENT};
use http::{HeaderMap, Method, Uri};
use http_body_util::{BodyExt, Limited};
use serde::Serialize;

use super::capture::{error_body, ResponseRecorder};

/// Form bodies are decoded only below this size.
pub const FORM_BODY_LIMIT: usize = 1000;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multi(Vec<String>),
}

pub type FieldMap = BTreeMap<String, FieldValue>;

/// Group `(name, value)` pairs by name, keeping value order.
/// One value becomes [`FieldValue::Single`], more become [`FieldValue::Multi`].
pub fn collapse<I>(pairs: I) -> FieldMap
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in pairs {
        grouped.entry(name).or_default().push(value);
    }
    grouped
        .into_iter()
        .map(|(name, mut values)| {
            let value = if values.len() == 1 {
                FieldValue::Single(values.remove(0))
            } else {
                FieldValue::Multi(values)
            };
            (name, value)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// Cookies sent by the client, from every `Cookie` header line.
#[must_use]
pub fn request_cookies(headers: &HeaderMap) -> Vec<Cookie> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(parse_cookie_pair)
        .collect()
}

/// Cookies set by the server. Only the leading `name=value` of each
/// `Set-Cookie` line is kept, attributes are dropped.
#[must_use]
pub fn response_cookies(headers: &HeaderMap) -> Vec<Cookie> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|line| line.split(';').next())
        .filter_map(parse_cookie_pair)
        .collect()
}

fn parse_cookie_pair(pair: &str) -> Option<Cookie> {
    let (name, value) = pair.trim().split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    Some(Cookie {
        name: name.to_string(),
        value: value.to_string(),
    })
}

/// Every header except `Cookie` and `Set-Cookie`.
#[must_use]
pub fn header_fields(headers: &HeaderMap) -> FieldMap {
    collapse(
        headers
            .iter()
            .filter(|(name, _)| **name != COOKIE && **name != SET_COOKIE)
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            }),
    )
}

#[must_use]
pub fn query_params(uri: &Uri) -> FieldMap {
    let query = uri.query().unwrap_or("");
    collapse(
        url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned())),
    )
}

fn header_str<'a>(headers: &'a HeaderMap, name: &http::HeaderName) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Declared body length: `Content-Length`, then the body's exact size
/// hint, else `-1` for unknown.
#[must_use]
pub fn content_length(request: &Request) -> i64 {
    if let Some(declared) = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
    {
        return declared;
    }
    HttpBody::size_hint(request.body())
        .exact()
        .and_then(|n| i64::try_from(n).ok())
        .unwrap_or(-1)
}

/// Form decoding precondition: POST, exact urlencoded content type, and
/// a known length below [`FORM_BODY_LIMIT`].
#[must_use]
pub fn wants_form(method: &Method, headers: &HeaderMap, content_length: i64) -> bool {
    *method == Method::POST
        && header_str(headers, &CONTENT_TYPE) == FORM_CONTENT_TYPE
        && usize::try_from(content_length).is_ok_and(|n| n < FORM_BODY_LIMIT)
}

/// The request target as sent: path plus query.
#[must_use]
pub fn request_uri(uri: &Uri) -> &str {
    uri.path_and_query().map_or("/", http::uri::PathAndQuery::as_str)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address {0}: missing port in address")]
    MissingPort(String),
    #[error("address {0}: too many colons in address")]
    TooManyColons(String),
    #[error("address {0}: missing ']' in address")]
    MissingBracket(String),
    #[error("address {0}: unexpected '[' or ']' in address")]
    UnexpectedBracket(String),
}

/// Split `host:port` or `[host]:port` into host and port text.
pub fn split_host_port(addr: &str) -> Result<(&str, &str), AddressError> {
    let Some(colon) = addr.rfind(':') else {
        return Err(AddressError::MissingPort(addr.to_string()));
    };

    let (host, open, close) = if addr.starts_with('[') {
        let Some(end) = addr.find(']') else {
            return Err(AddressError::MissingBracket(addr.to_string()));
        };
        // "]" must be immediately followed by the last ':'
        match end + 1 {
            n if n == addr.len() => return Err(AddressError::MissingPort(addr.to_string())),
            n if n == colon => {}
            n if addr.as_bytes()[n] == b':' => {
                return Err(AddressError::TooManyColons(addr.to_string()));
            }
            _ => return Err(AddressError::MissingPort(addr.to_string())),
        }
        (&addr[1..end], 1, end + 1)
    } else {
        let host = &addr[..colon];
        if host.contains(':') {
            return Err(AddressError::TooManyColons(addr.to_string()));
        }
        (host, 0, 0)
    };

    if addr[open..].contains('[') || addr[close..].contains(']') {
        return Err(AddressError::UnexpectedBracket(addr.to_string()));
    }

    Ok((host, &addr[colon + 1..]))
}

/// A non-fatal problem found while extracting request fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: &'static str,
    pub error: String,
}

pub const SOURCE_IP_ERROR: &str = "request debugging: encountered source ip parsing error";
pub const SOURCE_PORT_ERROR: &str = "request debugging: encountered source port parsing error";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteAddress {
    pub addr: String,
    pub port: u16,
}

/// Parse a peer address, collecting diagnostics instead of failing.
#[must_use]
pub fn parse_remote(addr_port: &str) -> (RemoteAddress, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let (host, port_text) = match split_host_port(addr_port) {
        Ok(parts) => parts,
        Err(e) => {
            diagnostics.push(Diagnostic {
                message: SOURCE_IP_ERROR,
                error: e.to_string(),
            });
            ("", "")
        }
    };

    let mut port = 0;
    if !port_text.is_empty() {
        match port_text.parse::<u16>() {
            Ok(p) => port = p,
            Err(e) => diagnostics.push(Diagnostic {
                message: SOURCE_PORT_ERROR,
                error: format!("parsing {port_text:?}: {e}"),
            }),
        }
    }

    (
        RemoteAddress {
            addr: host.to_string(),
            port,
        },
        diagnostics,
    )
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestSnapshot {
    pub method: String,
    pub proto: String,
    pub host: String,
    pub uri: String,
    pub remote_addr_port: String,
    pub remote_addr: String,
    pub remote_port: u16,
    pub content_length: i64,
    pub cookie_count: usize,
    pub user_agent: String,
    pub referer: String,
    pub cookies: Vec<Cookie>,
    pub query_params: FieldMap,
    pub headers: FieldMap,
    pub form: BTreeMap<String, Vec<String>>,
}

/// Extract request fields.
///
/// The request is left untouched except when the form precondition holds:
/// then the (small) body is read, decoded, and put back byte for byte.
pub async fn extract_request(request: &mut Request) -> (RequestSnapshot, Vec<Diagnostic>) {
    let remote_addr_port = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();
    let (remote, diagnostics) = parse_remote(&remote_addr_port);

    let headers = request.headers();
    let uri = request.uri();
    let host = match header_str(headers, &HOST) {
        "" => uri.authority().map(|a| a.as_str().to_string()).unwrap_or_default(),
        h => h.to_string(),
    };
    let cookies = request_cookies(headers);
    let length = content_length(request);

    let mut snapshot = RequestSnapshot {
        method: request.method().to_string(),
        proto: format!("{:?}", request.version()),
        host,
        uri: request_uri(uri).to_string(),
        remote_addr_port,
        remote_addr: remote.addr,
        remote_port: remote.port,
        content_length: length,
        cookie_count: cookies.len(),
        user_agent: header_str(headers, &USER_AGENT).to_string(),
        referer: header_str(headers, &REFERER).to_string(),
        cookies,
        query_params: query_params(uri),
        headers: header_fields(headers),
        form: BTreeMap::new(),
    };

    if wants_form(request.method(), request.headers(), length) {
        snapshot.form = read_form(request).await;
    }

    (snapshot, diagnostics)
}

async fn read_form(request: &mut Request) -> BTreeMap<String, Vec<String>> {
    let body = std::mem::take(request.body_mut());
    match Limited::new(body, FORM_BODY_LIMIT).collect().await {
        Ok(collected) => {
            let bytes = collected.to_bytes();
            let mut form: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for (k, v) in url::form_urlencoded::parse(&bytes) {
                form.entry(k.into_owned()).or_default().push(v.into_owned());
            }
            *request.body_mut() = Body::from(bytes);
            form
        }
        Err(e) => {
            tracing::debug!(error = %e, "form body could not be read");
            *request.body_mut() = error_body(e);
            BTreeMap::new()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseSnapshot {
    pub status_code: u16,
    pub response_size: usize,
    pub buffer_size: usize,
    pub response_headers: FieldMap,
    pub cookies: Vec<Cookie>,
}

#[must_use]
pub fn extract_response(recorder: &ResponseRecorder) -> ResponseSnapshot {
    ResponseSnapshot {
        status_code: recorder.status().as_u16(),
        response_size: recorder.size(),
        buffer_size: recorder.buffer().map_or(0, bytes::Bytes::len),
        response_headers: header_fields(recorder.headers()),
        cookies: response_cookies(recorder.headers()),
    }
}
