//! Track database operations

use super::{TrackQuery, TrackStore};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tunedesk_common::db::{Album, Track, TrackStatus, TrackUpdate};
use uuid::Uuid;

const TRACK_COLUMNS: &str = "id, title, uploader_id, duration_secs, genre, year, audio_location, \
     image_url, lyrics, plays, is_public, status, album_id, track_number, favorites, downloads, \
     created_at";

/// SQLite-backed [`TrackStore`]
#[derive(Debug, Clone)]
pub struct SqliteTrackStore {
    pool: SqlitePool,
}

impl SqliteTrackStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn track_from_row(row: &SqliteRow) -> Result<Track> {
    let id_str: String = row.get("id");
    let id = Uuid::parse_str(&id_str).with_context(|| format!("Invalid track id {}", id_str))?;

    let status_str: String = row.get("status");
    let status: TrackStatus = status_str.parse()?;

    let created_str: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_str)
        .with_context(|| format!("Invalid created_at {}", created_str))?
        .with_timezone(&Utc);

    let duration: i64 = row.get("duration_secs");

    Ok(Track {
        id,
        title: row.get("title"),
        uploader_id: row.get("uploader_id"),
        duration_secs: u32::try_from(duration).unwrap_or(0),
        genre: row.get("genre"),
        year: row.get("year"),
        audio_location: row.get("audio_location"),
        image_url: row.get("image_url"),
        lyrics: row.get("lyrics"),
        plays: row.get("plays"),
        is_public: row.get::<i64, _>("is_public") != 0,
        status,
        album_id: row.get("album_id"),
        track_number: row.get("track_number"),
        favorites: row.get("favorites"),
        downloads: row.get("downloads"),
        created_at,
    })
}

fn album_from_row(row: &SqliteRow) -> Result<Album> {
    let id_str: String = row.get("id");
    let id = Uuid::parse_str(&id_str).with_context(|| format!("Invalid album id {}", id_str))?;

    let created_str: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_str)
        .with_context(|| format!("Invalid created_at {}", created_str))?
        .with_timezone(&Utc);

    Ok(Album {
        id,
        title: row.get("title"),
        uploader_id: row.get("uploader_id"),
        year: row.get("year"),
        created_at,
    })
}

#[async_trait::async_trait]
impl TrackStore for SqliteTrackStore {
    async fn list_tracks(&self, query: &TrackQuery) -> Result<Vec<Track>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM tracks WHERE 1 = 1", TRACK_COLUMNS));

        if let Some(uploader) = &query.uploader_id {
            builder.push(" AND uploader_id = ").push_bind(uploader.clone());
        }
        if query.active_only {
            builder.push(" AND status = 'active'");
        }
        builder.push(" ORDER BY created_at DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(track_from_row).collect()
    }

    async fn tracks_with_duration(&self, seconds: u32) -> Result<Vec<Track>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tracks WHERE duration_secs = ? AND audio_location != '' \
             ORDER BY created_at DESC",
            TRACK_COLUMNS
        ))
        .bind(seconds as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(track_from_row).collect()
    }

    async fn get_track(&self, id: Uuid) -> Result<Option<Track>> {
        let row = sqlx::query(&format!("SELECT {} FROM tracks WHERE id = ?", TRACK_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(track_from_row).transpose()
    }

    async fn insert_track(&self, track: &Track) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tracks (
                id, title, uploader_id, duration_secs, genre, year, audio_location,
                image_url, lyrics, plays, is_public, status, album_id, track_number,
                favorites, downloads, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(track.id.to_string())
        .bind(&track.title)
        .bind(&track.uploader_id)
        .bind(track.duration_secs as i64)
        .bind(&track.genre)
        .bind(track.year)
        .bind(&track.audio_location)
        .bind(&track.image_url)
        .bind(&track.lyrics)
        .bind(track.plays)
        .bind(track.is_public as i64)
        .bind(track.status.as_str())
        .bind(&track.album_id)
        .bind(track.track_number)
        .bind(track.favorites)
        .bind(track.downloads)
        .bind(track.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_track(&self, id: Uuid, update: &TrackUpdate) -> Result<Option<Track>> {
        if update.is_empty() {
            return self.get_track(id).await;
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE tracks SET ");
        {
            let mut set = builder.separated(", ");
            if let Some(title) = &update.title {
                set.push("title = ").push_bind_unseparated(title.clone());
            }
            if let Some(genre) = &update.genre {
                set.push("genre = ").push_bind_unseparated(genre.clone());
            }
            if let Some(year) = update.year {
                set.push("year = ").push_bind_unseparated(year);
            }
            if let Some(status) = update.status {
                set.push("status = ").push_bind_unseparated(status.as_str());
            }
            if let Some(is_public) = update.is_public {
                set.push("is_public = ").push_bind_unseparated(is_public as i64);
            }
            if let Some(lyrics) = &update.lyrics {
                set.push("lyrics = ").push_bind_unseparated(lyrics.clone());
            }
            if let Some(album_id) = &update.album_id {
                set.push("album_id = ").push_bind_unseparated(album_id.clone());
            }
            if let Some(track_number) = update.track_number {
                set.push("track_number = ").push_bind_unseparated(track_number);
            }
            if let Some(image_url) = &update.image_url {
                set.push("image_url = ").push_bind_unseparated(image_url.clone());
            }
        }
        builder.push(" WHERE id = ").push_bind(id.to_string());

        let result = builder.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_track(id).await
    }

    async fn update_duration(&self, id: Uuid, seconds: u32) -> Result<bool> {
        let result = sqlx::query("UPDATE tracks SET duration_secs = ? WHERE id = ?")
            .bind(seconds as i64)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_track(&self, id: Uuid) -> Result<Option<Track>> {
        let existing = self.get_track(id).await?;
        if existing.is_none() {
            return Ok(None);
        }

        sqlx::query("DELETE FROM tracks WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(existing)
    }

    async fn list_albums(&self, uploader_id: &str) -> Result<Vec<Album>> {
        let rows = sqlx::query(
            "SELECT id, title, uploader_id, year, created_at FROM albums \
             WHERE uploader_id = ? ORDER BY title COLLATE NOCASE",
        )
        .bind(uploader_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(album_from_row).collect()
    }

    async fn get_album(&self, id: Uuid) -> Result<Option<Album>> {
        let row = sqlx::query(
            "SELECT id, title, uploader_id, year, created_at FROM albums WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(album_from_row).transpose()
    }

    async fn insert_album(&self, album: &Album) -> Result<()> {
        sqlx::query(
            "INSERT INTO albums (id, title, uploader_id, year, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(album.id.to_string())
        .bind(&album.title)
        .bind(&album.uploader_id)
        .bind(album.year)
        .bind(album.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
