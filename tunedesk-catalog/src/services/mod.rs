//! Catalog services
//!
//! Each service receives its stores through trait objects, so tests swap in
//! fakes without touching SQLite or the bucket.

pub mod correction_sweep;
pub mod library;
pub mod tag_reader;
pub mod upload;

pub use correction_sweep::{CorrectionSweep, SweepOutcome, SweepReport, TrackSweepResult};
pub use library::{LibraryService, LibraryStats, TrackFilter, TrackView};
pub use tag_reader::{read_tags, TrackTags};
pub use upload::{UploadDraft, UploadError, UploadRejection, UploadService};
