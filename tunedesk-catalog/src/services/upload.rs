//! Music upload flow
//!
//! prepare → (caller edits the draft) → submit
//!
//! `prepare` validates the file and estimates its duration with the upload
//! budget; `submit` stores the object and writes the track record, reporting
//! progress on the event bus.

use crate::db::TrackStore;
use crate::decode::AudioAsset;
use crate::duration::{DurationEstimate, DurationEstimator, EstimateError};
use crate::services::tag_reader::read_tags;
use crate::storage::{object_key, ObjectStore, StorageError};
use chrono::{Datelike, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};
use tunedesk_common::db::{NewTrack, Track};
use uuid::Uuid;
use tunedesk_common::events::{CatalogEvent, EventBus, UploadStatus};

/// MIME types accepted for upload
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/ogg",
    "audio/aac",
    "audio/webm",
    "audio/mp4",
    "audio/x-m4a",
    "audio/opus",
];

/// Largest accepted upload (100 MiB)
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Genre used when neither the user nor the tags provide one
pub const DEFAULT_GENRE: &str = "Unclassified";

/// Reasons a file is refused before anything is stored
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("Unsupported file format ({mime}). Use MP3, WAV, OGG, AAC, OPUS or M4A.")]
    UnsupportedFormat { mime: String },

    #[error("File is too large: {size} bytes. Maximum size: 100MB.")]
    TooLarge { size: u64 },

    #[error("Track is too long: {seconds}s. Maximum duration: 1 hour.")]
    TooLong { seconds: u64 },

    #[error("Could not read audio file: {0}")]
    Unreadable(String),
}

/// Failures after validation, while storing the upload
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Album {0} does not belong to the uploader")]
    AlbumNotOwned(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl UploadError {
    /// Message shown next to the failed upload
    pub fn user_message(&self) -> String {
        match self {
            UploadError::Storage(StorageError::BucketNotFound(_)) => {
                "The music bucket does not exist. Configure storage first.".to_string()
            }
            UploadError::Storage(StorageError::PermissionDenied(_)) => {
                "No permission to write to the music bucket.".to_string()
            }
            UploadError::Storage(StorageError::PayloadTooLarge { .. }) => {
                "File too large".to_string()
            }
            UploadError::Storage(StorageError::Unauthorized(_)) => {
                "Not authorized. Check your session.".to_string()
            }
            UploadError::Storage(_) => "Error uploading file".to_string(),
            UploadError::AlbumNotOwned(_) => {
                "The selected album does not belong to this artist".to_string()
            }
            UploadError::Database(_) => "Error saving track to the database".to_string(),
        }
    }
}

/// Check type and size of a candidate upload
///
/// Opus voice messages are accepted by name or MIME even when their declared
/// type is not on the allow-list.
pub fn validate_file(asset: &AudioAsset) -> Result<(), UploadRejection> {
    let mime = asset.mime_type.clone().unwrap_or_default();
    let is_opus = asset.file_name.to_lowercase().contains(".opus") || mime.contains("opus");

    if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) && !is_opus {
        return Err(UploadRejection::UnsupportedFormat {
            mime: if mime.is_empty() { "unknown".to_string() } else { mime },
        });
    }

    if asset.byte_size > MAX_UPLOAD_BYTES {
        return Err(UploadRejection::TooLarge {
            size: asset.byte_size,
        });
    }

    Ok(())
}

/// Validated upload awaiting metadata confirmation
///
/// Fields are public so the caller can edit them before `submit`.
#[derive(Debug, Clone, Serialize)]
pub struct UploadDraft {
    pub file_name: String,
    pub source_path: PathBuf,
    pub title: String,
    pub genre: String,
    pub album_id: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Year from the file's tags; the stored track gets the upload year
    pub year: Option<i32>,
    pub duration: DurationEstimate,
}

/// Runs the upload flow against injected stores
#[derive(Clone)]
pub struct UploadService {
    tracks: Arc<dyn TrackStore>,
    objects: Arc<dyn ObjectStore>,
    estimator: DurationEstimator,
    events: EventBus,
    decode_budget: Duration,
}

impl UploadService {
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

    /// Validate a local file and build its editable draft
    pub async fn prepare(&self, path: &Path) -> Result<UploadDraft, UploadRejection> {
        let asset =
            AudioAsset::from_path(path).map_err(|e| UploadRejection::Unreadable(e.to_string()))?;
        validate_file(&asset)?;

        let report = self
            .estimator
            .estimate_with_report(&asset, self.decode_budget)
            .await;
        if let Some(EstimateError::ExceedsCeiling(raw)) = report.fallback_cause {
            return Err(UploadRejection::TooLong {
                seconds: raw.floor() as u64,
            });
        }

        let tag_path = path.to_path_buf();
        let tags = tokio::task::spawn_blocking(move || read_tags(&tag_path))
            .await
            .unwrap_or_default();

        let title = tags
            .title
            .clone()
            .unwrap_or_else(|| title_from_file_name(&asset.file_name));

        let draft = UploadDraft {
            file_name: asset.file_name.clone(),
            source_path: path.to_path_buf(),
            title,
            genre: tags.genre.clone().unwrap_or_else(|| DEFAULT_GENRE.to_string()),
            album_id: None,
            artist: tags.artist.clone(),
            album: tags.album.clone(),
            year: tags.year.and_then(|y| i32::try_from(y).ok()),
            duration: report.estimate,
        };

        info!(
            file = %draft.file_name,
            seconds = draft.duration.seconds(),
            confidence = ?draft.duration.confidence(),
            "Upload draft ready"
        );
        self.progress(&draft.file_name, 0, UploadStatus::Editing, None);

        Ok(draft)
    }

    /// Store the object and create the track record
    ///
    /// A non-empty `album_id` must name an album owned by `uploader_id`;
    /// otherwise nothing is stored.
    pub async fn submit(&self, draft: &UploadDraft, uploader_id: &str) -> Result<Track, UploadError> {
        self.progress(&draft.file_name, 10, UploadStatus::Uploading, None);

        let album_id = match self.owned_album(draft, uploader_id).await {
            Ok(album_id) => album_id,
            Err(err) => {
                warn!(file = %draft.file_name, error = %err, "Upload refused");
                self.progress(&draft.file_name, 10, UploadStatus::Error, Some(err.user_message()));
                return Err(err);
            }
        };

        let key = object_key(Utc::now().timestamp_millis(), &draft.file_name);
        self.progress(&draft.file_name, 50, UploadStatus::Uploading, None);

        if let Err(e) = self.objects.put(&key, &draft.source_path).await {
            let err = UploadError::Storage(e);
            error!(file = %draft.file_name, error = %err, "Upload failed");
            self.progress(&draft.file_name, 50, UploadStatus::Error, Some(err.user_message()));
            return Err(err);
        }

        self.progress(&draft.file_name, 90, UploadStatus::Processing, None);

        let track = NewTrack {
            title: draft.title.clone(),
            uploader_id: uploader_id.to_string(),
            duration_secs: draft.duration.seconds(),
            genre: draft.genre.clone(),
            year: Some(Utc::now().year()),
            audio_location: key.clone(),
            album_id,
        }
        .into_track();

        if let Err(e) = self.tracks.insert_track(&track).await {
            let err = UploadError::Database(e.to_string());
            error!(file = %draft.file_name, error = %err, "Track insert failed");
            self.progress(&draft.file_name, 90, UploadStatus::Error, Some(err.user_message()));
            return Err(err);
        }

        self.progress(&draft.file_name, 100, UploadStatus::Complete, None);
        info!(track_id = %track.id, key = %key, "Upload complete");

        Ok(track)
    }

    /// Canonical album id for the draft, checked against the uploader
    async fn owned_album(
        &self,
        draft: &UploadDraft,
        uploader_id: &str,
    ) -> Result<Option<String>, UploadError> {
        let raw = match draft.album_id.as_deref().map(str::trim) {
            None | Some("") => return Ok(None),
            Some(raw) => raw,
        };
        let id = Uuid::parse_str(raw).map_err(|_| UploadError::AlbumNotOwned(raw.to_string()))?;

        let album = self
            .tracks
            .get_album(id)
            .await
            .map_err(|e| UploadError::Database(e.to_string()))?;
        match album {
            Some(album) if album.is_owned_by(uploader_id) => Ok(Some(album.id.to_string())),
            _ => Err(UploadError::AlbumNotOwned(raw.to_string())),
        }
    }

    fn progress(&self, file_name: &str, progress: u8, status: UploadStatus, error: Option<String>) {
        self.events.emit_lossy(CatalogEvent::UploadProgress {
            file_name: file_name.to_string(),
            progress,
            status,
            error,
            timestamp: Utc::now(),
        });
    }
}

/// File name without its final extension
pub fn title_from_file_name(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name[..idx].to_string(),
        _ => file_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str, mime: Option<&str>, size: u64) -> AudioAsset {
        AudioAsset {
            source: crate::decode::AssetSource::File(PathBuf::from(name)),
            byte_size: size,
            file_name: name.to_string(),
            mime_type: mime.map(str::to_string),
            recorded_duration: None,
        }
    }

    #[test]
    fn test_allowed_types_pass() {
        for mime in ALLOWED_MIME_TYPES {
            assert!(validate_file(&asset("a.bin", Some(mime), 10)).is_ok(), "{}", mime);
        }
    }

    #[test]
    fn test_opus_accepted_by_name_or_mime() {
        assert!(validate_file(&asset("PTT-WA0001.opus", None, 10)).is_ok());
        assert!(validate_file(&asset("voice", Some("audio/ogg; codecs=opus"), 10)).is_ok());
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert_eq!(
            validate_file(&asset("notes.txt", Some("text/plain"), 10)),
            Err(UploadRejection::UnsupportedFormat {
                mime: "text/plain".into()
            })
        );
        assert!(matches!(
            validate_file(&asset("blob", None, 10)),
            Err(UploadRejection::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_size_ceiling() {
        assert!(validate_file(&asset("a.mp3", Some("audio/mpeg"), MAX_UPLOAD_BYTES)).is_ok());
        assert_eq!(
            validate_file(&asset("a.mp3", Some("audio/mpeg"), MAX_UPLOAD_BYTES + 1)),
            Err(UploadRejection::TooLarge {
                size: MAX_UPLOAD_BYTES + 1
            })
        );
    }

    #[test]
    fn test_container_extensions_pass_from_path() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["x.m4a", "x.mp4", "x.webm", "x.mp3", "x.wav", "x.ogg", "x.aac", "x.opus"] {
            let path = dir.path().join(name);
            std::fs::write(&path, vec![0u8; 64]).unwrap();
            let asset = AudioAsset::from_path(&path).unwrap();
            assert_eq!(validate_file(&asset), Ok(()), "{} guessed as {:?}", name, asset.mime_type);
        }
    }

    #[test]
    fn test_title_from_file_name() {
        assert_eq!(title_from_file_name("My Song.mp3"), "My Song");
        assert_eq!(title_from_file_name("archive.tar.gz"), "archive.tar");
        assert_eq!(title_from_file_name("noext"), "noext");
        assert_eq!(title_from_file_name(".hidden"), ".hidden");
    }

    #[test]
    fn test_user_messages() {
        let err = UploadError::Storage(StorageError::BucketNotFound("music".into()));
        assert!(err.user_message().contains("bucket"));
        let err = UploadError::Storage(StorageError::PayloadTooLarge { size: 2, limit: 1 });
        assert_eq!(err.user_message(), "File too large");
        let err = UploadError::Database("locked".into());
        assert!(err.user_message().contains("database"));
        let err = UploadError::AlbumNotOwned("x".into());
        assert!(err.user_message().contains("album"));
    }
}
