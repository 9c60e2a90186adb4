//! HTTP request handlers

use crate::api::server::AppContext;
use crate::catalog::TrackCatalog;
use crate::clock::PlaybackSnapshot;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use radio_common::api::{StartReference, StatusResponse};
use radio_common::time::unix_seconds;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

type ApiError = (StatusCode, Json<StatusResponse>);

fn api_error(code: StatusCode, message: impl Into<String>) -> ApiError {
    (
        code,
        Json(StatusResponse {
            status: format!("error: {}", message.into()),
        }),
    )
}

fn ok_status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AdditionalData {
    pub bi: u32,
    pub si: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SongListResponse {
    pub songs: Vec<String>,
    pub count: usize,
}

/// Clock snapshot plus the derived progress a client would show
#[derive(Debug, Serialize)]
pub struct PlaybackStateResponse {
    #[serde(flatten)]
    snapshot: PlaybackSnapshot,
    progress_percent: f64,
    /// Seconds into the track from the start reference, computed the way
    /// polling clients do
    position: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    name: Option<String>,
}

// ============================================================================
// Health
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "radio-station".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Client polling
// ============================================================================

/// GET /get-position - published start reference
pub async fn get_position(State(ctx): State<AppContext>) -> Json<StartReference> {
    Json(ctx.publisher.start_reference())
}

/// GET /get-additional-data - background index and session token
pub async fn get_additional_data(State(ctx): State<AppContext>) -> Json<AdditionalData> {
    Json(AdditionalData {
        bi: ctx.publisher.background_index().bi,
        si: ctx.publisher.session_token().si,
    })
}

/// GET /get-song - raw record of the current track
///
/// Returns `{"error": true}` (still 200) when nothing is loaded, which is
/// what polling clients test for.
pub async fn get_song(State(ctx): State<AppContext>) -> Response {
    match ctx.clock.current_track_blob() {
        Some(blob) => ([(header::CONTENT_TYPE, "application/json")], blob).into_response(),
        None => Json(json!({ "error": true })).into_response(),
    }
}

// ============================================================================
// Playback control
// ============================================================================

fn playback_state(snapshot: PlaybackSnapshot) -> PlaybackStateResponse {
    let position = snapshot
        .track_id
        .as_ref()
        .map(|_| snapshot.start_reference.elapsed_at(unix_seconds()));
    PlaybackStateResponse {
        progress_percent: snapshot.progress_percent(),
        position,
        snapshot,
    }
}

/// GET /playback/state
pub async fn get_playback_state(State(ctx): State<AppContext>) -> Json<PlaybackStateResponse> {
    Json(playback_state(ctx.clock.snapshot()))
}

/// POST /playback/skip - end the current track now
///
/// A running clock applies the skip on its own task, so this only
/// acknowledges the request; `song_changed` on `/events` (or a later
/// `/playback/state`) shows the new track.
pub async fn skip(State(ctx): State<AppContext>) -> (StatusCode, Json<StatusResponse>) {
    info!("Skip requested");
    ctx.clock.skip().await;
    (
        StatusCode::ACCEPTED,
        Json(StatusResponse {
            status: "skip requested".to_string(),
        }),
    )
}

/// POST /playback/restart - reset the clock and start over
///
/// Restart reloads before returning, so the state is already current.
pub async fn restart(State(ctx): State<AppContext>) -> Json<PlaybackStateResponse> {
    info!("Restart requested");
    ctx.clock.restart().await;
    Json(playback_state(ctx.clock.snapshot()))
}

// ============================================================================
// Catalog
// ============================================================================

/// GET /songs
pub async fn list_songs(State(ctx): State<AppContext>) -> Json<SongListResponse> {
    let songs = ctx.catalog.ids().to_vec();
    let count = songs.len();
    Json(SongListResponse { songs, count })
}

/// POST /songs?name= - store the request body as a track record
pub async fn upload_song(
    State(ctx): State<AppContext>,
    Query(query): Query<UploadQuery>,
    body: String,
) -> Result<(StatusCode, Json<StatusResponse>), ApiError> {
    if let Err(e) = TrackCatalog::validate_record(&body) {
        warn!("Rejected track upload: {}", e);
        return Err(api_error(StatusCode::BAD_REQUEST, e.to_string()));
    }

    if !ctx.catalog.save(&body, query.name.as_deref()) {
        return Err(api_error(StatusCode::BAD_REQUEST, "track could not be saved"));
    }
    Ok((StatusCode::CREATED, ok_status()))
}

/// DELETE /songs/:id
pub async fn delete_song(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    if ctx.catalog.delete(&id) {
        Ok(ok_status())
    } else {
        Err(api_error(StatusCode::NOT_FOUND, format!("track {} not found", id)))
    }
}

/// DELETE /songs - remove every record
pub async fn delete_all_songs(
    State(ctx): State<AppContext>,
) -> Result<Json<StatusResponse>, ApiError> {
    if ctx.catalog.delete_all() {
        Ok(ok_status())
    } else {
        Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "some tracks could not be deleted",
        ))
    }
}
