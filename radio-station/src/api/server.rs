//! HTTP server setup and routing

use crate::catalog::TrackCatalog;
use crate::clock::PlaybackClock;
use crate::error::{Error, Result};
use crate::publisher::PositionPublisher;
use axum::{
    routing::{delete, get, post},
    Router,
};
use radio_common::events::EventBus;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub catalog: Arc<TrackCatalog>,
    pub clock: Arc<PlaybackClock>,
    pub publisher: Arc<PositionPublisher>,
    /// Clock and background events, fanned out to SSE clients
    pub events: EventBus,
    pub root_folder: PathBuf,
    pub port: u16,
}

/// Build the router with all routes and layers attached
pub fn build_router(ctx: AppContext) -> Router {
    let static_dir = ctx.root_folder.join("static");

    Router::new()
        .route("/health", get(super::handlers::health))
        // Polled by clients
        .route("/get-position", get(super::handlers::get_position))
        .route("/get-additional-data", get(super::handlers::get_additional_data))
        .route("/get-song", get(super::handlers::get_song))
        // Clock control
        .route("/playback/state", get(super::handlers::get_playback_state))
        .route("/playback/skip", post(super::handlers::skip))
        .route("/playback/restart", post(super::handlers::restart))
        // Catalog
        .route(
            "/songs",
            get(super::handlers::list_songs)
                .post(super::handlers::upload_song)
                .delete(super::handlers::delete_all_songs),
        )
        .route("/songs/:id", delete(super::handlers::delete_song))
        .route("/events", get(super::sse::event_stream))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind to `ctx.port` and serve until `shutdown` resolves
pub async fn run<F>(ctx: AppContext, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], ctx.port));
    let app = build_router(ctx);

    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
