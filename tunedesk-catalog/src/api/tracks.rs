//! Track library endpoints
//!
//! GET    /api/tracks        - list with optional filters
//! GET    /api/tracks/stats  - counts and total duration
//! GET    /api/tracks/:id    - one track
//! PATCH  /api/tracks/:id    - partial metadata update
//! DELETE /api/tracks/:id    - remove record and stored object

use crate::db::TrackQuery;
use crate::error::{ApiError, ApiResult};
use crate::services::{LibraryStats, TrackFilter, TrackView};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tunedesk_common::db::{TrackStatus, TrackUpdate};
use uuid::Uuid;

/// Query parameters shared by the listing endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub uploader: Option<String>,
    pub search: Option<String>,
    pub genre: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub active_only: bool,
}

impl ListParams {
    fn query(&self) -> TrackQuery {
        TrackQuery {
            uploader_id: self.uploader.clone().filter(|u| !u.is_empty()),
            active_only: self.active_only,
        }
    }

    fn filter(&self) -> ApiResult<TrackFilter> {
        let status = match self.status.as_deref() {
            None | Some("") | Some("all") => None,
            Some(s) => Some(s.parse::<TrackStatus>()?),
        };
        Ok(TrackFilter {
            search: self.search.clone(),
            genre: self.genre.clone().filter(|g| !g.is_empty() && g != "all"),
            status,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TrackListResponse {
    pub tracks: Vec<TrackView>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: LibraryStats,
    pub total_duration_display: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: Uuid,
}

fn parse_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| ApiError::BadRequest(format!("Invalid track id: {}", id)))
}

/// GET /api/tracks
pub async fn list_tracks(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<TrackListResponse>> {
    let filter = params.filter()?;
    let tracks: Vec<TrackView> = state
        .library
        .list(&params.query(), &filter)
        .await?
        .into_iter()
        .map(TrackView::from)
        .collect();

    Ok(Json(TrackListResponse {
        count: tracks.len(),
        tracks,
    }))
}

/// GET /api/tracks/stats
pub async fn track_stats(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<StatsResponse>> {
    let stats = state.library.stats(&params.query()).await?;
    Ok(Json(StatsResponse {
        total_duration_display: stats.total_duration_display(),
        stats,
    }))
}

/// GET /api/tracks/:id
pub async fn get_track(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TrackView>> {
    let id = parse_id(&id)?;
    let track = state
        .library
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Track {}", id)))?;
    Ok(Json(track.into()))
}

/// PATCH /api/tracks/:id
pub async fn update_track(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<TrackUpdate>,
) -> ApiResult<Json<TrackView>> {
    let id = parse_id(&id)?;
    if update.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }
    if matches!(&update.title, Some(t) if t.trim().is_empty()) {
        return Err(ApiError::BadRequest("Title cannot be empty".to_string()));
    }

    let track = state
        .library
        .update(id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Track {}", id)))?;
    Ok(Json(track.into()))
}

/// DELETE /api/tracks/:id
pub async fn delete_track(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let id = parse_id(&id)?;
    state
        .library
        .delete(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Track {}", id)))?;
    Ok(Json(DeleteResponse { deleted: id }))
}

/// Build track library routes
pub fn track_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tracks", get(list_tracks))
        .route("/api/tracks/stats", get(track_stats))
        .route(
            "/api/tracks/:id",
            get(get_track).patch(update_track).delete(delete_track),
        )
}
