//! Duration estimator
//!
//! Races the injected decoder against a timer. The first of decode-complete,
//! decode-error or timeout decides the estimation; whatever the decoder still
//! holds is torn down through the cancellation token before returning.

use super::{DurationEstimate, EstimateError};
use crate::decode::{AudioAsset, MediaDecoder};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Result of one estimation, with the reason the fallback was used (if it was)
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateReport {
    pub estimate: DurationEstimate,
    pub fallback_cause: Option<EstimateError>,
}

impl EstimateReport {
    /// Decoder reported more than one hour
    pub fn exceeded_ceiling(&self) -> bool {
        matches!(self.fallback_cause, Some(EstimateError::ExceedsCeiling(_)))
    }
}

/// Serializable summary used by the CLI and HTTP responses
#[derive(Debug, Clone, Serialize)]
pub struct EstimateSummary {
    pub seconds: u32,
    pub confidence: super::Confidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_cause: Option<String>,
}

impl From<&EstimateReport> for EstimateSummary {
    fn from(report: &EstimateReport) -> Self {
        Self {
            seconds: report.estimate.seconds(),
            confidence: report.estimate.confidence(),
            fallback_cause: report.fallback_cause.as_ref().map(|c| c.to_string()),
        }
    }
}

/// Estimates asset durations with a bounded wait
#[derive(Clone)]
pub struct DurationEstimator {
    decoder: Arc<dyn MediaDecoder>,
}

impl DurationEstimator {
    pub fn new(decoder: Arc<dyn MediaDecoder>) -> Self {
        Self { decoder }
    }

    /// Estimate the duration of `asset`, waiting at most `budget` for the decoder
    pub async fn estimate(&self, asset: &AudioAsset, budget: Duration) -> DurationEstimate {
        self.estimate_with_report(asset, budget).await.estimate
    }

    /// Same as [`estimate`](Self::estimate), also reporting why the fallback was used
    pub async fn estimate_with_report(&self, asset: &AudioAsset, budget: Duration) -> EstimateReport {
        let started = Instant::now();
        let cancel = CancellationToken::new();
        let teardown = cancel.clone().drop_guard();

        let decoded = tokio::time::timeout(
            budget,
            self.decoder.decode_duration(asset, cancel.child_token()),
        )
        .await;

        // Race decided: release the decoder's resources on every branch
        drop(teardown);

        let measured = match decoded {
            Ok(Ok(raw)) => DurationEstimate::from_measurement(raw),
            Ok(Err(e)) => Err(EstimateError::Decode(e)),
            Err(_) => Err(EstimateError::DecodeTimeout(budget)),
        };

        match measured {
            Ok(estimate) => {
                debug!(
                    file = %asset.file_name,
                    seconds = estimate.seconds(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Measured duration"
                );
                EstimateReport {
                    estimate,
                    fallback_cause: None,
                }
            }
            Err(cause) => {
                let estimate = DurationEstimate::approximate(asset.byte_size, &asset.file_name);
                warn!(
                    file = %asset.file_name,
                    size_bytes = asset.byte_size,
                    seconds = estimate.seconds(),
                    error = %cause,
                    "Falling back to size-based duration"
                );
                EstimateReport {
                    estimate,
                    fallback_cause: Some(cause),
                }
            }
        }
    }
}
