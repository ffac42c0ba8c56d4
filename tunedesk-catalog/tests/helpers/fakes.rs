//! In-memory stand-ins for the injected stores and decoder

use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tunedesk_catalog::db::{TrackQuery, TrackStore};
use tunedesk_catalog::decode::{AudioAsset, DecodeError, MediaDecoder};
use tunedesk_catalog::storage::{is_absolute_url, ObjectStore, StorageError};
use tunedesk_common::db::{Album, Track, TrackStatus, TrackUpdate};
use uuid::Uuid;

/// Track store backed by a HashMap, with failure injection
#[derive(Default)]
pub struct InMemoryTrackStore {
    tracks: Mutex<HashMap<Uuid, Track>>,
    albums: Mutex<HashMap<Uuid, Album>>,
    failing_updates: Mutex<HashSet<Uuid>>,
    fail_scans: AtomicBool,
    fail_inserts: AtomicBool,
}

impl InMemoryTrackStore {
    pub fn with_tracks(tracks: impl IntoIterator<Item = Track>) -> Self {
        let store = Self::default();
        {
            let mut map = store.tracks.lock().unwrap();
            for track in tracks {
                map.insert(track.id, track);
            }
        }
        store
    }

    pub fn with_album(self, album: Album) -> Self {
        self.albums.lock().unwrap().insert(album.id, album);
        self
    }

    pub fn duration_of(&self, id: Uuid) -> Option<u32> {
        self.tracks.lock().unwrap().get(&id).map(|t| t.duration_secs)
    }

    pub fn len(&self) -> usize {
        self.tracks.lock().unwrap().len()
    }

    /// Make `update_duration` fail for this track
    pub fn fail_updates_for(&self, id: Uuid) {
        self.failing_updates.lock().unwrap().insert(id);
    }

    pub fn fail_scans(&self) {
        self.fail_scans.store(true, Ordering::SeqCst);
    }

    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl TrackStore for InMemoryTrackStore {
    async fn list_tracks(&self, query: &TrackQuery) -> Result<Vec<Track>> {
        let mut tracks: Vec<Track> = self
            .tracks
            .lock()
            .unwrap()
            .values()
            .filter(|t| query.uploader_id.as_ref().map_or(true, |u| &t.uploader_id == u))
            .filter(|t| !query.active_only || t.status == TrackStatus::Active)
            .cloned()
            .collect();
        tracks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tracks)
    }

    async fn tracks_with_duration(&self, seconds: u32) -> Result<Vec<Track>> {
        if self.fail_scans.load(Ordering::SeqCst) {
            return Err(anyhow!("database is locked"));
        }
        let mut tracks: Vec<Track> = self
            .tracks
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.duration_secs == seconds && !t.audio_location.is_empty())
            .cloned()
            .collect();
        tracks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tracks)
    }

    async fn get_track(&self, id: Uuid) -> Result<Option<Track>> {
        Ok(self.tracks.lock().unwrap().get(&id).cloned())
    }

    async fn insert_track(&self, track: &Track) -> Result<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(anyhow!("disk I/O error"));
        }
        self.tracks.lock().unwrap().insert(track.id, track.clone());
        Ok(())
    }

    async fn update_track(&self, id: Uuid, update: &TrackUpdate) -> Result<Option<Track>> {
        let mut tracks = self.tracks.lock().unwrap();
        Ok(tracks.get_mut(&id).map(|track| {
            update.apply_to(track);
            track.clone()
        }))
    }

    async fn update_duration(&self, id: Uuid, seconds: u32) -> Result<bool> {
        if self.failing_updates.lock().unwrap().contains(&id) {
            return Err(anyhow!("constraint failed"));
        }
        let mut tracks = self.tracks.lock().unwrap();
        Ok(match tracks.get_mut(&id) {
            Some(track) => {
                track.duration_secs = seconds;
                true
            }
            None => false,
        })
    }

    async fn delete_track(&self, id: Uuid) -> Result<Option<Track>> {
        Ok(self.tracks.lock().unwrap().remove(&id))
    }

    async fn list_albums(&self, uploader_id: &str) -> Result<Vec<Album>> {
        let mut albums: Vec<Album> = self
            .albums
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.uploader_id == uploader_id)
            .cloned()
            .collect();
        albums.sort_by_key(|a| a.title.to_lowercase());
        Ok(albums)
    }

    async fn get_album(&self, id: Uuid) -> Result<Option<Album>> {
        Ok(self.albums.lock().unwrap().get(&id).cloned())
    }

    async fn insert_album(&self, album: &Album) -> Result<()> {
        self.albums.lock().unwrap().insert(album.id, album.clone());
        Ok(())
    }
}

/// Object store holding only sizes, resolving keys to CDN URLs
#[derive(Default)]
pub struct FakeObjectStore {
    objects: Mutex<HashMap<String, u64>>,
    removed: Mutex<Vec<String>>,
}

impl FakeObjectStore {
    pub fn with_object(self, key: &str, size: u64) -> Self {
        self.objects.lock().unwrap().insert(key.to_string(), size);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }

    pub fn stored_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ObjectStore for FakeObjectStore {
    async fn put(&self, key: &str, source: &Path) -> Result<(), StorageError> {
        let size = std::fs::metadata(source)?.len();
        self.objects.lock().unwrap().insert(key.to_string(), size);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.removed.lock().unwrap().push(key.to_string());
        self.objects
            .lock()
            .unwrap()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn resolve(&self, location: &str) -> Result<AudioAsset, StorageError> {
        if is_absolute_url(location) {
            return Ok(AudioAsset::remote(location, 0));
        }
        let size = self
            .objects
            .lock()
            .unwrap()
            .get(location)
            .copied()
            .ok_or_else(|| StorageError::NotFound(location.to_string()))?;
        Ok(AudioAsset::remote(
            format!("https://cdn.test/music/{}", location),
            size,
        ))
    }
}

/// What the scripted decoder does for one file name
#[derive(Debug, Clone)]
pub enum Script {
    Duration(f64),
    Fail(DecodeError),
    /// Never finishes until cancelled
    Hang,
}

/// Decoder answering per file name, with a default for unknown names
pub struct ScriptedDecoder {
    default: Script,
    scripts: HashMap<String, Script>,
    calls: AtomicUsize,
}

impl ScriptedDecoder {
    pub fn new(default: Script) -> Self {
        Self {
            default,
            scripts: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn returning(seconds: f64) -> Self {
        Self::new(Script::Duration(seconds))
    }

    pub fn with_script(mut self, file_name: &str, script: Script) -> Self {
        self.scripts.insert(file_name.to_string(), script);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MediaDecoder for ScriptedDecoder {
    async fn decode_duration(
        &self,
        asset: &AudioAsset,
        cancel: CancellationToken,
    ) -> Result<f64, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .get(&asset.file_name)
            .unwrap_or(&self.default)
            .clone();

        match script {
            Script::Duration(seconds) => Ok(seconds),
            Script::Fail(e) => Err(e),
            Script::Hang => {
                cancel.cancelled().await;
                Err(DecodeError::Cancelled)
            }
        }
    }
}
