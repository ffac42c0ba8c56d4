//! tunedesk-catalog library interface
//!
//! Duration estimation, upload, correction sweep and library services, plus
//! the HTTP router exposing them.

pub mod api;
pub mod db;
pub mod decode;
pub mod duration;
pub mod error;
pub mod services;
pub mod storage;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use db::{SqliteTrackStore, TrackStore};
use decode::MediaDecoder;
use duration::DurationEstimator;
use services::{CorrectionSweep, LibraryService, UploadService};
use sqlx::SqlitePool;
use std::sync::Arc;
use storage::ObjectStore;
use tokio::sync::RwLock;
use tunedesk_common::config::CatalogConfig;
use tunedesk_common::events::EventBus;

/// Application state shared across handlers and CLI commands
#[derive(Clone)]
pub struct AppState {
    pub library: LibraryService,
    pub uploads: UploadService,
    pub sweep: CorrectionSweep,
    pub estimator: DurationEstimator,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    /// State backed by the SQLite track table
    pub fn new(
        db: SqlitePool,
        objects: Arc<dyn ObjectStore>,
        decoder: Arc<dyn MediaDecoder>,
        config: &CatalogConfig,
        event_bus: EventBus,
    ) -> Self {
        Self::with_stores(
            Arc::new(SqliteTrackStore::new(db)),
            objects,
            decoder,
            config,
            event_bus,
        )
    }

    /// State over arbitrary store implementations
    pub fn with_stores(
        tracks: Arc<dyn TrackStore>,
        objects: Arc<dyn ObjectStore>,
        decoder: Arc<dyn MediaDecoder>,
        config: &CatalogConfig,
        event_bus: EventBus,
    ) -> Self {
        let estimator = DurationEstimator::new(decoder);

        Self {
            library: LibraryService::new(tracks.clone(), objects.clone(), event_bus.clone()),
            uploads: UploadService::new(
                tracks.clone(),
                objects.clone(),
                estimator.clone(),
                event_bus.clone(),
                config.upload_decode_timeout(),
            ),
            sweep: CorrectionSweep::new(
                tracks,
                objects,
                estimator.clone(),
                event_bus.clone(),
                config.stored_decode_timeout(),
            ),
            estimator,
            event_bus,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::track_routes())
        .merge(api::album_routes())
        .merge(api::duration_routes())
        .route("/events", get(api::event_stream))
        .merge(api::health_routes())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(state)
}
