//! Album endpoints
//!
//! GET  /api/albums?uploader=  - albums owned by one uploader
//! POST /api/albums            - create an album

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tunedesk_common::db::Album;

#[derive(Debug, Default, Deserialize)]
pub struct AlbumParams {
    pub uploader: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAlbumRequest {
    pub uploader_id: String,
    pub title: String,
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct AlbumListResponse {
    pub albums: Vec<Album>,
    pub count: usize,
}

/// GET /api/albums
pub async fn list_albums(
    State(state): State<AppState>,
    Query(params): Query<AlbumParams>,
) -> ApiResult<Json<AlbumListResponse>> {
    let uploader = params
        .uploader
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("uploader is required".to_string()))?;

    let albums = state.library.albums(&uploader).await?;
    Ok(Json(AlbumListResponse {
        count: albums.len(),
        albums,
    }))
}

/// POST /api/albums
pub async fn create_album(
    State(state): State<AppState>,
    Json(request): Json<CreateAlbumRequest>,
) -> ApiResult<(StatusCode, Json<Album>)> {
    if request.uploader_id.trim().is_empty() {
        return Err(ApiError::BadRequest("uploader_id is required".to_string()));
    }
    if request.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title cannot be empty".to_string()));
    }

    let album = state
        .library
        .create_album(&request.uploader_id, &request.title, request.year)
        .await?;
    Ok((StatusCode::CREATED, Json(album)))
}

/// Build album routes
pub fn album_routes() -> Router<AppState> {
    Router::new().route("/api/albums", get(list_albums).post(create_album))
}
