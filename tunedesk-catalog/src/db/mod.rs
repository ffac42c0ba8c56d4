//! Database access for tunedesk-catalog
//!
//! Services talk to the relational store through [`TrackStore`] so they can be
//! exercised against in-memory fakes.

pub mod tracks;

pub use tracks::SqliteTrackStore;

use anyhow::Result;
use tunedesk_common::db::{Album, Track, TrackUpdate};
use uuid::Uuid;

/// Which tracks a listing returns
#[derive(Debug, Clone, Default)]
pub struct TrackQuery {
    /// Restrict to one uploader
    pub uploader_id: Option<String>,
    /// Restrict to `active` tracks
    pub active_only: bool,
}

/// Relational track store
#[async_trait::async_trait]
pub trait TrackStore: Send + Sync {
    /// Tracks matching `query`, newest first
    async fn list_tracks(&self, query: &TrackQuery) -> Result<Vec<Track>>;

    /// Tracks whose recorded duration equals `seconds` and that have an audio location
    async fn tracks_with_duration(&self, seconds: u32) -> Result<Vec<Track>>;

    async fn get_track(&self, id: Uuid) -> Result<Option<Track>>;

    async fn insert_track(&self, track: &Track) -> Result<()>;

    /// Apply a partial update; returns the updated track, or `None` if absent
    async fn update_track(&self, id: Uuid, update: &TrackUpdate) -> Result<Option<Track>>;

    /// Overwrite the recorded duration; returns false if the track is absent
    async fn update_duration(&self, id: Uuid, seconds: u32) -> Result<bool>;

    /// Delete a track; returns the removed record, or `None` if absent
    async fn delete_track(&self, id: Uuid) -> Result<Option<Track>>;

    /// Albums owned by `uploader_id`, alphabetical
    async fn list_albums(&self, uploader_id: &str) -> Result<Vec<Album>>;

    async fn get_album(&self, id: Uuid) -> Result<Option<Album>>;

    async fn insert_album(&self, album: &Album) -> Result<()>;
}
