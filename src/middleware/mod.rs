//! Request/response introspection middleware.
//!
//! [`DebugLayer`] wraps any `tower` service handling axum requests. For each
//! request it decides once, from its immutable [`HandlerConfig`], between:
//!
//! - **disabled**: pure passthrough, nothing is inspected or emitted;
//! - **request only**: emit a request record, then delegate;
//! - **request and response**: emit a request record, delegate through a
//!   [`ResponseRecorder`], emit a response record, then flush the buffered
//!   response unchanged.
//!
//! Submodules hold the pieces: directive parsing ([`directive`]), the
//! configuration model ([`config`]), field extraction ([`extract`]),
//! correlation IDs ([`correlation`]), response buffering ([`capture`]) and
//! record sinks ([`sink`]).

pub mod capture;
pub mod config;
pub mod correlation;
pub mod directive;
pub mod extract;
pub mod sink;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::Request;
use axum::response::Response;
use tower::{Layer, Service};

pub use capture::ResponseRecorder;
pub use config::{DebugSettings, HandlerConfig, LogLevel};
pub use correlation::CorrelationId;
pub use sink::{LogRecord, LogSink, MemorySink, TracingSink};

pub const REQUEST_MESSAGE: &str = "debugging request";
pub const RESPONSE_MESSAGE: &str = "debugging response";

/// Shared state of one provisioned debug handler.
struct Debugger {
    config: HandlerConfig,
    sink: Arc<dyn LogSink>,
}

impl Debugger {
    /// Emit the request record. Returns the correlation ID reported with it
    /// (empty when correlation IDs are off).
    async fn debug_request(&self, request: &mut Request) -> String {
        let direction = "incoming";
        let request_id = if self.config.enable_correlation_id() {
            correlation::ensure(request.extensions_mut()).to_string()
        } else {
            String::new()
        };

        let (snapshot, diagnostics) = extract::extract_request(request).await;

        for diagnostic in diagnostics {
            self.sink.emit(
                LogRecord::new(LogLevel::Error, diagnostic.message)
                    .with("request_id", request_id.as_str())
                    .with("direction", direction)
                    .with("tag", self.config.tag())
                    .with("error", diagnostic.error),
            );
        }

        self.sink.emit(
            LogRecord::new(self.config.log_level(), REQUEST_MESSAGE)
                .with("request_id", request_id.as_str())
                .with("direction", direction)
                .with("tag", self.config.tag())
                .with_snapshot(&snapshot),
        );

        request_id
    }

    fn debug_response(&self, recorder: &ResponseRecorder, request_id: &str) {
        let snapshot = extract::extract_response(recorder);
        self.sink.emit(
            LogRecord::new(self.config.log_level(), RESPONSE_MESSAGE)
                .with("request_id", request_id)
                .with("direction", "outgoing")
                .with("tag", self.config.tag())
                .with_snapshot(&snapshot),
        );
    }
}

/// Tower layer installing one debug handler.
///
/// ```rust,no_run
/// use axum::{routing::get, Router};
/// use request_debug::middleware::{directive::parse_directive, DebugLayer, TracingSink};
///
/// let config = parse_directive(r#"tag="api" log_level=debug response_debug=yes"#).unwrap();
/// let app: Router = Router::new()
///     .route("/version", get(|| async { "1.0.0" }))
///     .layer(DebugLayer::new(config, TracingSink));
/// ```
#[derive(Clone)]
pub struct DebugLayer {
    debugger: Arc<Debugger>,
}

impl DebugLayer {
    pub fn new(config: HandlerConfig, sink: impl LogSink) -> Self {
        Self::with_shared_sink(config, Arc::new(sink))
    }

    #[must_use]
    pub fn with_shared_sink(config: HandlerConfig, sink: Arc<dyn LogSink>) -> Self {
        Self {
            debugger: Arc::new(Debugger { config, sink }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &HandlerConfig {
        &self.debugger.config
    }
}

impl std::fmt::Debug for DebugLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugLayer")
            .field("config", &self.debugger.config)
            .finish_non_exhaustive()
    }
}

impl<S> Layer<S> for DebugLayer {
    type Service = DebugService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DebugService {
            inner,
            debugger: Arc::clone(&self.debugger),
        }
    }
}

/// Service produced by [`DebugLayer`].
#[derive(Clone)]
pub struct DebugService<S> {
    inner: S,
    debugger: Arc<Debugger>,
}

impl<S> Service<Request> for DebugService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        if self.debugger.config.disabled() {
            return Box::pin(self.inner.call(request));
        }

        // Use the service that was driven to readiness, leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let debugger = Arc::clone(&self.debugger);

        Box::pin(async move {
            let matched = debugger
                .config
                .matches(extract::request_uri(request.uri()));
            if !matched {
                return inner.call(request).await;
            }

            let request_id = debugger.debug_request(&mut request).await;

            if !debugger.config.response_debug_enabled() {
                return inner.call(request).await;
            }

            let response = inner.call(request).await?;
            let recorder = match ResponseRecorder::record(response).await {
                Ok(recorder) => recorder,
                Err(e) => return Ok(e.into_response()),
            };
            if recorder.buffered() {
                debugger.debug_response(&recorder, &request_id);
            }
            Ok(recorder.flush())
        })
    }
}
