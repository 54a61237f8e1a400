//! `request-debug run`: serve the configured routes.
//!
//! Loads the host config once, provisions every debug handler, and starts
//! the Axum server with graceful shutdown. Debug records go to the
//! `tracing` subscriber installed here.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::cli::RunArgs;
use crate::config::resolve_file_source;
use crate::error::RequestDebugError;
use crate::logging;
use crate::middleware::{LogSink, TracingSink};
use crate::server;

pub async fn execute(args: RunArgs) -> Result<(), RequestDebugError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let source = resolve_file_source(args.config.as_deref()).await?;
    let config = source.load().await?;

    let sink: Arc<dyn LogSink> = Arc::new(TracingSink);
    let router = server::build_router(&config, sink, args.max_body)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        config = %source.path().display(),
        routes = config.routes.len(),
        debug_handlers = config.total_handlers(),
        "request-debug started"
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(server::shutdown_signal())
    .await?;

    tracing::info!("request-debug stopped");
    Ok(())
}
