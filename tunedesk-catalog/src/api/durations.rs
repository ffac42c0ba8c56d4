//! Duration correction endpoint

use crate::error::ApiResult;
use crate::services::{SweepReport, TrackSweepResult};
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;
use tracing::error;

/// Sweep result returned to the caller
#[derive(Debug, Serialize)]
pub struct CorrectionResponse {
    pub scanned: usize,
    pub corrected: usize,
    pub unchanged: usize,
    pub unmeasured: usize,
    pub failed: usize,
    pub results: Vec<TrackSweepResult>,
}

impl From<SweepReport> for CorrectionResponse {
    fn from(report: SweepReport) -> Self {
        Self {
            scanned: report.scanned(),
            corrected: report.corrected(),
            unchanged: report.unchanged(),
            unmeasured: report.unmeasured(),
            failed: report.failed(),
            results: report.results,
        }
    }
}

/// POST /api/durations/correct
///
/// Runs one correction sweep and waits for it to finish.
pub async fn correct_durations(State(state): State<AppState>) -> ApiResult<Json<CorrectionResponse>> {
    match state.sweep.run().await {
        Ok(report) => Ok(Json(report.into())),
        Err(e) => {
            error!(error = %e, "Duration correction sweep failed");
            *state.last_error.write().await = Some(format!("Correction sweep failed: {}", e));
            Err(e.into())
        }
    }
}

/// Build duration routes
pub fn duration_routes() -> Router<AppState> {
    Router::new().route("/api/durations/correct", post(correct_durations))
}
