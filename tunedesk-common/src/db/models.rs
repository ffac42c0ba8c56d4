//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Publication state of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackStatus {
    Active,
    Inactive,
    Draft,
}

impl TrackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackStatus::Active => "active",
            TrackStatus::Inactive => "inactive",
            TrackStatus::Draft => "draft",
        }
    }
}

impl fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TrackStatus::Active),
            "inactive" => Ok(TrackStatus::Inactive),
            "draft" => Ok(TrackStatus::Draft),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown track status: {}",
                other
            ))),
        }
    }
}

/// One catalog track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: Uuid,
    pub title: String,
    pub uploader_id: String,
    /// Recorded duration in whole seconds
    pub duration_secs: u32,
    pub genre: String,
    pub year: Option<i32>,
    /// Object key in the bucket, or an absolute URL
    pub audio_location: String,
    pub image_url: Option<String>,
    pub lyrics: Option<String>,
    pub plays: i64,
    pub is_public: bool,
    pub status: TrackStatus,
    pub album_id: Option<String>,
    pub track_number: Option<i32>,
    pub favorites: i64,
    pub downloads: i64,
    pub created_at: DateTime<Utc>,
}

/// Album owned by one uploader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: Uuid,
    pub title: String,
    pub uploader_id: String,
    pub year: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Album {
    pub fn new(title: impl Into<String>, uploader_id: impl Into<String>, year: Option<i32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            uploader_id: uploader_id.into(),
            year,
            created_at: Utc::now(),
        }
    }

    /// True when the album belongs to `uploader_id`
    pub fn is_owned_by(&self, uploader_id: &str) -> bool {
        self.uploader_id == uploader_id
    }
}

/// Fields required to insert a new track; counters start at zero
#[derive(Debug, Clone)]
pub struct NewTrack {
    pub title: String,
    pub uploader_id: String,
    pub duration_secs: u32,
    pub genre: String,
    pub year: Option<i32>,
    pub audio_location: String,
    pub album_id: Option<String>,
}

impl NewTrack {
    /// Build the persisted record for this draft
    pub fn into_track(self) -> Track {
        Track {
            id: Uuid::new_v4(),
            title: self.title,
            uploader_id: self.uploader_id,
            duration_secs: self.duration_secs,
            genre: self.genre,
            year: self.year,
            audio_location: self.audio_location,
            image_url: None,
            lyrics: None,
            plays: 0,
            is_public: true,
            status: TrackStatus::Active,
            album_id: self.album_id,
            track_number: None,
            favorites: 0,
            downloads: 0,
            created_at: Utc::now(),
        }
    }
}

/// Partial update of the editable track fields
///
/// `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackUpdate {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub status: Option<TrackStatus>,
    pub is_public: Option<bool>,
    pub lyrics: Option<String>,
    pub album_id: Option<String>,
    pub track_number: Option<i32>,
    pub image_url: Option<String>,
}

impl TrackUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.genre.is_none()
            && self.year.is_none()
            && self.status.is_none()
            && self.is_public.is_none()
            && self.lyrics.is_none()
            && self.album_id.is_none()
            && self.track_number.is_none()
            && self.image_url.is_none()
    }

    /// Apply this update to an in-memory track
    pub fn apply_to(&self, track: &mut Track) {
        if let Some(title) = &self.title {
            track.title = title.clone();
        }
        if let Some(genre) = &self.genre {
            track.genre = genre.clone();
        }
        if let Some(year) = self.year {
            track.year = Some(year);
        }
        if let Some(status) = self.status {
            track.status = status;
        }
        if let Some(is_public) = self.is_public {
            track.is_public = is_public;
        }
        if let Some(lyrics) = &self.lyrics {
            track.lyrics = Some(lyrics.clone());
        }
        if let Some(album_id) = &self.album_id {
            track.album_id = Some(album_id.clone());
        }
        if let Some(track_number) = self.track_number {
            track.track_number = Some(track_number);
        }
        if let Some(image_url) = &self.image_url {
            track.image_url = Some(image_url.clone());
        }
    }
}
