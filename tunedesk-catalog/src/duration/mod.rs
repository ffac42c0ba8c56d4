//! Track duration inference
//!
//! A duration is either *measured* (read from the decoded container) or
//! *approximated* from the file size under an assumed bitrate. Both kinds are
//! whole seconds and never exceed one hour.

pub mod estimator;

pub use estimator::{DurationEstimator, EstimateReport};

use crate::decode::DecodeError;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Shortest approximated duration (seconds)
pub const MIN_APPROXIMATED_SECS: u32 = 5;

/// Longest duration the catalog accepts (seconds)
pub const MAX_DURATION_SECS: u32 = 3600;

/// Duration written when nothing better was known at upload time
pub const PLACEHOLDER_DURATION_SECS: u32 = 180;

/// Assumed byte rate of voice-message containers (~48 kbps)
pub const VOICE_MESSAGE_BYTES_PER_SEC: u64 = 6000;

/// Assumed byte rate of generic compressed audio (16 KiB/s)
pub const COMPRESSED_BYTES_PER_SEC: u64 = 16 * 1024;

/// File-name fragments identifying low-bitrate voice-message containers
const VOICE_MESSAGE_HINTS: &[&str] = &[".opus"];

/// How a duration was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Measured,
    Approximated,
}

/// Whole-second duration tagged with its confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DurationEstimate {
    seconds: u32,
    confidence: Confidence,
}

impl DurationEstimate {
    /// Accept a decoded duration
    ///
    /// The value is floored to whole seconds and must land in
    /// `[1, MAX_DURATION_SECS]`.
    pub fn from_measurement(raw_seconds: f64) -> Result<Self, EstimateError> {
        if !raw_seconds.is_finite() || raw_seconds <= 0.0 {
            return Err(EstimateError::Unmeasurable(raw_seconds));
        }

        let floored = raw_seconds.floor();
        if floored < 1.0 {
            return Err(EstimateError::Unmeasurable(raw_seconds));
        }
        if floored > MAX_DURATION_SECS as f64 {
            return Err(EstimateError::ExceedsCeiling(raw_seconds));
        }

        Ok(Self {
            seconds: floored as u32,
            confidence: Confidence::Measured,
        })
    }

    /// Infer a duration from byte size and file name, clamped to
    /// `[MIN_APPROXIMATED_SECS, MAX_DURATION_SECS]`
    pub fn approximate(byte_size: u64, file_name: &str) -> Self {
        let bytes_per_sec = if is_voice_message(file_name) {
            VOICE_MESSAGE_BYTES_PER_SEC
        } else {
            COMPRESSED_BYTES_PER_SEC
        };

        let raw = byte_size / bytes_per_sec;
        let seconds = raw.clamp(MIN_APPROXIMATED_SECS as u64, MAX_DURATION_SECS as u64) as u32;

        Self {
            seconds,
            confidence: Confidence::Approximated,
        }
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn is_measured(&self) -> bool {
        self.confidence == Confidence::Measured
    }
}

/// True when the file name carries a voice-message container hint
pub fn is_voice_message(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    VOICE_MESSAGE_HINTS.iter().any(|hint| lower.contains(hint))
}

/// Why an estimation fell back to the size heuristic
///
/// Never returned to callers of `estimate`; carried in [`EstimateReport`] for
/// logging and for upload validation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EstimateError {
    #[error("Decode did not finish within {0:?}")]
    DecodeTimeout(Duration),

    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Decoded duration {0} is not a positive finite number")]
    Unmeasurable(f64),

    #[error("Decoded duration {0:.1}s exceeds the one hour ceiling")]
    ExceedsCeiling(f64),
}
