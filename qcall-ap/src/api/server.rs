//! HTTP server setup and routing

use crate::error::{Error, Result};
use crate::playback::AnnouncementQueue;
use crate::state::RequestMetrics;
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub queue: Arc<AnnouncementQueue>,
    pub metrics: Arc<RequestMetrics>,
}

/// Build the router with every API route.
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(super::handlers::root))
        .route("/api/audio/announcement", post(super::handlers::enqueue_announcement))
        .route("/api/audio/queue/status", get(super::handlers::queue_status))
        .route("/api/audio/queue/clear", post(super::handlers::clear_queue))
        .route("/api/audio/health", get(super::handlers::health))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the API on `port` until `shutdown` resolves.
pub async fn run<F>(port: u16, ctx: AppContext, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    info!("HTTP server stopped");
    Ok(())
}
