//! Axum host server and graceful shutdown.
//!
//! [`build_router`] provisions every debug directive of a [`Config`] and
//! mounts the configured static routes behind their debug chains;
//! [`shutdown_signal`] handles SIGTERM / Ctrl+C.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::{any, MethodRouter};
use axum::Router;
use bytes::Bytes;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::model::{Config, DebugEntry, Route};
use crate::config::validation;
use crate::error::RequestDebugError;
use crate::middleware::{DebugLayer, LogSink};

/// Provision a debug chain. The first entry ends up outermost.
fn provision_chain(
    context: &str,
    chain: &[DebugEntry],
    sink: &Arc<dyn LogSink>,
) -> Result<Vec<DebugLayer>, RequestDebugError> {
    chain
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            entry
                .provision()
                .map(|config| DebugLayer::with_shared_sink(config, Arc::clone(sink)))
                .map_err(|source| RequestDebugError::Directive {
                    context: format!("{context} debug[{i}]"),
                    source,
                })
        })
        .collect()
}

fn static_response(route: &Route) -> MethodRouter {
    let status = StatusCode::from_u16(route.status).unwrap_or(StatusCode::OK);
    let body = Bytes::from(route.body.clone());
    any(move || {
        let body = body.clone();
        async move { (status, body) }
    })
}

pub fn build_router(
    config: &Config,
    sink: Arc<dyn LogSink>,
    max_body: usize,
) -> Result<Router, RequestDebugError> {
    validation::validate(config).map_err(|errors| RequestDebugError::ConfigValidation { errors })?;

    let mut router = Router::new();
    for route in &config.routes {
        let mut handler = static_response(route);
        for layer in provision_chain(&route.path, &route.debug, &sink)?.into_iter().rev() {
            handler = handler.layer(layer);
        }
        router = router.route(&route.path, handler);
    }
    router = router.fallback(|| async { StatusCode::NOT_FOUND });

    for layer in provision_chain("(root)", &config.debug, &sink)?.into_iter().rev() {
        router = router.layer(layer);
    }

    Ok(router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyLimitLayer::new(max_body)),
    ))
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
