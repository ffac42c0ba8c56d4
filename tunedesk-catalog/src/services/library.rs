//! Library management: listing, filtering, editing and deleting tracks

use crate::db::{TrackQuery, TrackStore};
use crate::duration::PLACEHOLDER_DURATION_SECS;
use crate::storage::{is_absolute_url, ObjectStore};
use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use tunedesk_common::db::{Album, Track, TrackStatus, TrackUpdate};
use tunedesk_common::events::{CatalogEvent, EventBus};
use tunedesk_common::human_time::{format_total_duration, format_track_duration};
use uuid::Uuid;

/// In-memory filter applied on top of a store listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackFilter {
    /// Case-insensitive substring of the title
    pub search: Option<String>,
    /// Exact genre
    pub genre: Option<String>,
    /// Exact status
    pub status: Option<TrackStatus>,
}

impl TrackFilter {
    pub fn matches(&self, track: &Track) -> bool {
        let search_ok = match &self.search {
            Some(term) if !term.is_empty() => {
                track.title.to_lowercase().contains(&term.to_lowercase())
            }
            _ => true,
        };
        let genre_ok = self.genre.as_ref().map_or(true, |g| &track.genre == g);
        let status_ok = self.status.map_or(true, |s| track.status == s);

        search_ok && genre_ok && status_ok
    }
}

/// Counts shown above the library table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LibraryStats {
    pub total: usize,
    pub active: usize,
    pub draft: usize,
    pub inactive: usize,
    /// Tracks still carrying the placeholder duration
    pub placeholder_durations: usize,
    pub total_duration_secs: u64,
}

impl LibraryStats {
    pub fn from_tracks(tracks: &[Track]) -> Self {
        let by_status = |status| tracks.iter().filter(|t| t.status == status).count();
        Self {
            total: tracks.len(),
            active: by_status(TrackStatus::Active),
            draft: by_status(TrackStatus::Draft),
            inactive: by_status(TrackStatus::Inactive),
            placeholder_durations: tracks
                .iter()
                .filter(|t| t.duration_secs == PLACEHOLDER_DURATION_SECS)
                .count(),
            total_duration_secs: tracks.iter().map(|t| t.duration_secs as u64).sum(),
        }
    }
}

/// Track as shown in the library table
#[derive(Debug, Clone, Serialize)]
pub struct TrackView {
    #[serde(flatten)]
    pub track: Track,
    /// `m:ss`
    pub duration_display: String,
}

impl From<Track> for TrackView {
    fn from(track: Track) -> Self {
        let duration_display = format_track_duration(track.duration_secs);
        Self {
            track,
            duration_display,
        }
    }
}

impl LibraryStats {
    /// `H:MM:SS` rendering of the summed durations
    pub fn total_duration_display(&self) -> String {
        format_total_duration(self.total_duration_secs)
    }
}

/// Track management over injected stores
#[derive(Clone)]
pub struct LibraryService {
    tracks: Arc<dyn TrackStore>,
    objects: Arc<dyn ObjectStore>,
    events: EventBus,
}

impl LibraryService {
    pub fn new(tracks: Arc<dyn TrackStore>, objects: Arc<dyn ObjectStore>, events: EventBus) -> Self {
        Self {
            tracks,
            objects,
            events,
        }
    }

    /// List tracks, newest first
    pub async fn list(&self, query: &TrackQuery, filter: &TrackFilter) -> Result<Vec<Track>> {
        let tracks = self.tracks.list_tracks(query).await?;
        Ok(tracks.into_iter().filter(|t| filter.matches(t)).collect())
    }

    pub async fn stats(&self, query: &TrackQuery) -> Result<LibraryStats> {
        let tracks = self.tracks.list_tracks(query).await?;
        Ok(LibraryStats::from_tracks(&tracks))
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Track>> {
        self.tracks.get_track(id).await
    }

    pub async fn update(&self, id: Uuid, update: &TrackUpdate) -> Result<Option<Track>> {
        let updated = self.tracks.update_track(id, update).await?;
        if updated.is_some() {
            info!(track_id = %id, "Track updated");
        }
        Ok(updated)
    }

    /// Delete a track record and, best effort, its stored object
    pub async fn delete(&self, id: Uuid) -> Result<Option<Track>> {
        let Some(track) = self.tracks.delete_track(id).await? else {
            return Ok(None);
        };

        if !track.audio_location.is_empty() && !is_absolute_url(&track.audio_location) {
            if let Err(e) = self.objects.remove(&track.audio_location).await {
                warn!(track_id = %id, key = %track.audio_location, error = %e, "Stored object not removed");
            }
        }

        info!(track_id = %id, title = %track.title, "Track deleted");
        self.events.emit_lossy(CatalogEvent::TrackDeleted {
            track_id: id,
            timestamp: Utc::now(),
        });

        Ok(Some(track))
    }

    /// Albums an uploader can attach tracks to
    pub async fn albums(&self, uploader_id: &str) -> Result<Vec<Album>> {
        self.tracks.list_albums(uploader_id).await
    }

    pub async fn create_album(&self, uploader_id: &str, title: &str, year: Option<i32>) -> Result<Album> {
        let album = Album::new(title.trim(), uploader_id, year);
        self.tracks.insert_album(&album).await?;
        info!(album_id = %album.id, uploader = %uploader_id, "Album created");
        Ok(album)
    }
}
