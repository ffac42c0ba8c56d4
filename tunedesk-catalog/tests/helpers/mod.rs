//! Test Helper Utilities
//!
//! Shared fakes and fixtures for the tunedesk-catalog integration tests

#![allow(dead_code)]

pub mod audio_generator;
pub mod fakes;

pub use audio_generator::generate_test_wav;
pub use fakes::{FakeObjectStore, InMemoryTrackStore, ScriptedDecoder};

use tunedesk_common::db::{NewTrack, Track};

/// Track stored under `location` with the given recorded duration
pub fn track_at(title: &str, location: &str, duration_secs: u32) -> Track {
    NewTrack {
        title: title.to_string(),
        uploader_id: "artist-1".to_string(),
        duration_secs,
        genre: "Unclassified".to_string(),
        year: Some(2026),
        audio_location: location.to_string(),
        album_id: None,
    }
    .into_track()
}

/// Single-connection in-memory pool with the tracks and albums tables
pub async fn memory_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    tunedesk_common::db::create_tracks_table(&pool)
        .await
        .expect("Failed to create tracks table");
    tunedesk_common::db::create_albums_table(&pool)
        .await
        .expect("Failed to create albums table");
    pool
}
