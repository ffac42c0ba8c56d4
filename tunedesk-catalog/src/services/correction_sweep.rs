//! Duration correction sweep
//!
//! Tracks recorded with the 180 second placeholder are re-estimated against
//! their stored audio. Only a measured duration that differs from the
//! placeholder is written back, so a second sweep leaves corrected tracks
//! alone. A genuinely three minute track is re-probed on every sweep and never
//! changed.

use crate::db::TrackStore;
use crate::duration::{DurationEstimator, PLACEHOLDER_DURATION_SECS};
use crate::storage::ObjectStore;
use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tunedesk_common::db::Track;
use tunedesk_common::events::{CatalogEvent, EventBus};
use uuid::Uuid;

/// What happened to one placeholder track
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SweepOutcome {
    /// Measured duration written to the record
    Corrected { old_seconds: u32, new_seconds: u32 },
    /// Measured duration equals the placeholder
    Unchanged,
    /// Decoder could not measure the asset; nothing written
    Unmeasured { approximation: u32, reason: String },
    /// Stored location could not be turned into an asset
    ResolveFailed { reason: String },
    /// Measured duration could not be persisted
    PersistFailed { new_seconds: u32, reason: String },
}

/// Per-track sweep result
#[derive(Debug, Clone, Serialize)]
pub struct TrackSweepResult {
    pub track_id: Uuid,
    pub title: String,
    #[serde(flatten)]
    pub outcome: SweepOutcome,
}

/// Result of one sweep
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub results: Vec<TrackSweepResult>,
}

impl SweepReport {
    pub fn scanned(&self) -> usize {
        self.results.len()
    }

    pub fn corrected(&self) -> usize {
        self.count(|o| matches!(o, SweepOutcome::Corrected { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, SweepOutcome::Unchanged))
    }

    pub fn unmeasured(&self) -> usize {
        self.count(|o| matches!(o, SweepOutcome::Unmeasured { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                SweepOutcome::ResolveFailed { .. } | SweepOutcome::PersistFailed { .. }
            )
        })
    }

    fn count(&self, pred: impl Fn(&SweepOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Re-estimates placeholder durations against stored audio
#[derive(Clone)]
pub struct CorrectionSweep {
    tracks: Arc<dyn TrackStore>,
    objects: Arc<dyn ObjectStore>,
    estimator: DurationEstimator,
    events: EventBus,
    decode_budget: Duration,
}

impl CorrectionSweep {
    pub fn new(
        tracks: Arc<dyn TrackStore>,
        objects: Arc<dyn ObjectStore>,
        estimator: DurationEstimator,
        events: EventBus,
        decode_budget: Duration,
    ) -> Self {
        Self {
            tracks,
            objects,
            estimator,
            events,
            decode_budget,
        }
    }

    /// Run one sweep over every placeholder track
    ///
    /// Fails only when the placeholder scan itself fails; per-track failures
    /// are reported in the returned [`SweepReport`].
    pub async fn run(&self) -> anyhow::Result<SweepReport> {
        let candidates = self
            .tracks
            .tracks_with_duration(PLACEHOLDER_DURATION_SECS)
            .await?;

        info!(candidates = candidates.len(), "Starting duration correction sweep");

        let results = join_all(candidates.into_iter().map(|track| self.correct_track(track))).await;
        let report = SweepReport { results };

        info!(
            scanned = report.scanned(),
            corrected = report.corrected(),
            unchanged = report.unchanged(),
            unmeasured = report.unmeasured(),
            failed = report.failed(),
            "Duration correction sweep finished"
        );

        self.events.emit_lossy(CatalogEvent::SweepCompleted {
            scanned: report.scanned(),
            corrected: report.corrected(),
            unchanged: report.unchanged(),
            unmeasured: report.unmeasured(),
            failed: report.failed(),
            timestamp: Utc::now(),
        });

        Ok(report)
    }

    async fn correct_track(&self, track: Track) -> TrackSweepResult {
        let outcome = self.correct(&track).await;
        TrackSweepResult {
            track_id: track.id,
            title: track.title,
            outcome,
        }
    }

    async fn correct(&self, track: &Track) -> SweepOutcome {
        let asset = match self.objects.resolve(&track.audio_location).await {
            Ok(asset) => asset.with_recorded_duration(track.duration_secs),
            Err(e) => {
                warn!(track_id = %track.id, error = %e, "Cannot resolve stored audio");
                return SweepOutcome::ResolveFailed {
                    reason: e.to_string(),
                };
            }
        };

        let report = self
            .estimator
            .estimate_with_report(&asset, self.decode_budget)
            .await;

        if !report.estimate.is_measured() {
            return SweepOutcome::Unmeasured {
                approximation: report.estimate.seconds(),
                reason: report
                    .fallback_cause
                    .map(|c| c.to_string())
                    .unwrap_or_default(),
            };
        }

        let new_seconds = report.estimate.seconds();
        if new_seconds == PLACEHOLDER_DURATION_SECS {
            return SweepOutcome::Unchanged;
        }

        match self.tracks.update_duration(track.id, new_seconds).await {
            Ok(true) => {
                info!(
                    track_id = %track.id,
                    title = %track.title,
                    new_seconds,
                    "Corrected placeholder duration"
                );
                self.events.emit_lossy(CatalogEvent::DurationCorrected {
                    track_id: track.id,
                    title: track.title.clone(),
                    old_seconds: track.duration_secs,
                    new_seconds,
                    timestamp: Utc::now(),
                });
                SweepOutcome::Corrected {
                    old_seconds: track.duration_secs,
                    new_seconds,
                }
            }
            Ok(false) => {
                warn!(track_id = %track.id, "Track vanished before correction was saved");
                SweepOutcome::PersistFailed {
                    new_seconds,
                    reason: "track no longer exists".to_string(),
                }
            }
            Err(e) => {
                warn!(track_id = %track.id, error = %e, "Failed to persist corrected duration");
                SweepOutcome::PersistFailed {
                    new_seconds,
                    reason: e.to_string(),
                }
            }
        }
    }
}
