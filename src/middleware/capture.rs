//! Response buffering.
//!
//! [`ResponseRecorder::record`] drains the downstream response body into
//! memory so it can be inspected before anything reaches the client, then
//! [`ResponseRecorder::flush`] releases it unchanged.

use axum::body::Body;
use axum::response::Response;
use axum::BoxError;
use bytes::Bytes;
use futures_util::stream;
use http::response::Parts;
use http::{HeaderMap, StatusCode};
use http_body_util::BodyExt;

/// A body that yields `err` on first poll.
pub(crate) fn error_body<E: Into<BoxError>>(err: E) -> Body {
    let err: BoxError = err.into();
    Body::from_stream(stream::once(async move { Err::<Bytes, BoxError>(err) }))
}

/// Buffering policy. Everything is buffered except a protocol switch,
/// where the downstream handler has taken over the connection.
fn should_buffer(status: StatusCode) -> bool {
    status != StatusCode::SWITCHING_PROTOCOLS
}

#[derive(Debug)]
enum Recorded {
    Buffered(Bytes),
    Passthrough(Body),
}

#[derive(Debug)]
pub struct ResponseRecorder {
    parts: Parts,
    recorded: Recorded,
}

/// The downstream body failed while being buffered.
#[derive(Debug)]
pub struct CaptureError {
    parts: Parts,
    source: axum::Error,
}

impl CaptureError {
    /// The response the client gets: original head, body re-raising the error.
    #[must_use]
    pub fn into_response(self) -> Response {
        Response::from_parts(self.parts, error_body(self.source))
    }
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "response body failed during capture: {}", self.source)
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl ResponseRecorder {
    pub async fn record(response: Response) -> Result<Self, CaptureError> {
        let (parts, body) = response.into_parts();
        if !should_buffer(parts.status) {
            return Ok(Self {
                parts,
                recorded: Recorded::Passthrough(body),
            });
        }
        match body.collect().await {
            Ok(collected) => Ok(Self {
                parts,
                recorded: Recorded::Buffered(collected.to_bytes()),
            }),
            Err(source) => Err(CaptureError { parts, source }),
        }
    }

    #[must_use]
    pub const fn buffered(&self) -> bool {
        matches!(self.recorded, Recorded::Buffered(_))
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.parts.status
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Bytes written by the downstream handler. Zero when not buffered.
    #[must_use]
    pub fn size(&self) -> usize {
        self.buffer().map_or(0, Bytes::len)
    }

    #[must_use]
    pub const fn buffer(&self) -> Option<&Bytes> {
        match &self.recorded {
            Recorded::Buffered(bytes) => Some(bytes),
            Recorded::Passthrough(_) => None,
        }
    }

    /// Release the response to the client exactly as recorded.
    #[must_use]
    pub fn flush(self) -> Response {
        let body = match self.recorded {
            Recorded::Buffered(bytes) => Body::from(bytes),
            Recorded::Passthrough(body) => body,
        };
        Response::from_parts(self.parts, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[tokio::test]
    async fn buffered_response_flushes_verbatim() {
        let response = Response::builder()
            .status(StatusCode::CREATED)
            .header("x-custom", "1")
            .body(Body::from("1.0.0"))
            .unwrap();

        let recorder = ResponseRecorder::record(response).await.unwrap();
        assert!(recorder.buffered());
        assert_eq!(recorder.status(), StatusCode::CREATED);
        assert_eq!(recorder.size(), 5);
        assert_eq!(recorder.headers()["x-custom"], "1");

        let flushed = recorder.flush();
        assert_eq!(flushed.status(), StatusCode::CREATED);
        assert_eq!(flushed.headers()["x-custom"], "1");
        let body = flushed.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "1.0.0");
    }

    #[tokio::test]
    async fn streamed_body_is_buffered_in_full() {
        let chunks = stream::iter(vec![
            Ok::<_, Infallible>(Bytes::from("chunk1")),
            Ok(Bytes::from("chunk2")),
        ]);
        let response = Response::new(Body::from_stream(chunks));

        let recorder = ResponseRecorder::record(response).await.unwrap();
        assert_eq!(recorder.buffer().unwrap(), "chunk1chunk2");
    }

    #[tokio::test]
    async fn protocol_switch_is_not_buffered() {
        let response = Response::builder()
            .status(StatusCode::SWITCHING_PROTOCOLS)
            .body(Body::empty())
            .unwrap();

        let recorder = ResponseRecorder::record(response).await.unwrap();
        assert!(!recorder.buffered());
        assert_eq!(recorder.size(), 0);
        assert_eq!(recorder.flush().status(), StatusCode::SWITCHING_PROTOCOLS);
    }

    #[tokio::test]
    async fn body_error_is_reraised_to_client() {
        let response = Response::new(error_body(std::io::Error::other("boom")));

        let err = ResponseRecorder::record(response).await.unwrap_err();
        assert!(err.to_string().contains("boom"));

        let body = err.into_response().into_body().collect().await;
        assert!(body.is_err());
    }
}
