//! Media decoding seam
//!
//! The estimator only needs a "decode or fail" capability. Production code uses
//! [`SymphoniaDecoder`]; tests substitute fakes.

pub mod symphonia_decoder;

pub use symphonia_decoder::SymphoniaDecoder;

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Where the bytes of an audio asset live
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "location", rename_all = "lowercase")]
pub enum AssetSource {
    /// Local file (fresh upload or locally mirrored bucket object)
    File(PathBuf),
    /// Dereferenceable URL of a stored object
    Url(String),
}

/// One audio file to estimate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioAsset {
    pub source: AssetSource,
    /// Size in bytes (0 when unknown)
    pub byte_size: u64,
    /// File name including extension; drives format hints
    pub file_name: String,
    /// Declared MIME type, if any
    pub mime_type: Option<String>,
    /// Duration previously written to the track record
    pub recorded_duration: Option<u32>,
}

impl AudioAsset {
    /// Describe a local file, reading its size and guessing its MIME type from the extension
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = guess_audio_mime(path);

        Ok(Self {
            source: AssetSource::File(path.to_path_buf()),
            byte_size: metadata.len(),
            file_name,
            mime_type,
            recorded_duration: None,
        })
    }

    /// Describe a remote object
    pub fn remote(url: impl Into<String>, byte_size: u64) -> Self {
        let url = url.into();
        let file_name = file_name_from_url(&url);
        let mime_type = guess_audio_mime(Path::new(&file_name));

        Self {
            source: AssetSource::Url(url),
            byte_size,
            file_name,
            mime_type,
            recorded_duration: None,
        }
    }

    pub fn with_recorded_duration(mut self, seconds: u32) -> Self {
        self.recorded_duration = Some(seconds);
        self
    }

    /// Lower-cased extension of the file name, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }
}

/// Guess the MIME type of an audio file from its extension
///
/// Containers that also carry video (`.mp4`, `.webm`) report their audio
/// type, and `.m4a` reports `audio/x-m4a` the way browsers do.
pub fn guess_audio_mime(path: &Path) -> Option<String> {
    let candidates: Vec<String> = mime_guess::from_path(path)
        .iter()
        .map(|m| normalize_audio_mime(m.essence_str()))
        .collect();

    candidates
        .iter()
        .find(|m| m.starts_with("audio/"))
        .or_else(|| candidates.first())
        .cloned()
}

fn normalize_audio_mime(mime: &str) -> String {
    match mime {
        "audio/m4a" | "audio/mp4a-latm" => "audio/x-m4a",
        "video/mp4" => "audio/mp4",
        "video/webm" => "audio/webm",
        other => other,
    }
    .to_string()
}

/// Last path segment of a URL, without query string or fragment
fn file_name_from_url(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .rsplit('/')
        .next()
        .unwrap_or(without_query)
        .to_string()
}

/// Reasons a decoder could not produce a duration
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Asset could not be opened or read
    #[error("I/O error: {0}")]
    Io(String),

    /// Remote asset could not be fetched
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Container or codec not recognised
    #[error("Unsupported format: {0}")]
    Unsupported(String),

    /// Container holds no decodable audio track
    #[error("No audio track found")]
    NoAudioTrack,

    /// Stream is corrupt or inconsistent
    #[error("Malformed stream: {0}")]
    Malformed(String),

    /// Decoding was abandoned because the estimation was decided
    #[error("Decode cancelled")]
    Cancelled,
}

/// Capability to read an asset's native duration
///
/// Implementations must release every resource they acquire (staged downloads,
/// open files, blocking tasks) once `cancel` fires, even if their future is
/// dropped before completing.
#[async_trait::async_trait]
pub trait MediaDecoder: Send + Sync {
    /// Read the native duration in seconds (may be NaN, zero or negative if the
    /// container reports nonsense; the caller validates the number)
    async fn decode_duration(
        &self,
        asset: &AudioAsset,
        cancel: CancellationToken,
    ) -> Result<f64, DecodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_asset_takes_name_from_url() {
        let asset = AudioAsset::remote("https://cdn.example.com/music/17-voice.opus?token=abc", 0);
        assert_eq!(asset.file_name, "17-voice.opus");
        assert_eq!(asset.extension().as_deref(), Some("opus"));
    }

    #[test]
    fn test_from_path_reads_size_and_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Song.MP3");
        std::fs::write(&path, vec![0u8; 1234]).unwrap();

        let asset = AudioAsset::from_path(&path).unwrap();
        assert_eq!(asset.byte_size, 1234);
        assert_eq!(asset.file_name, "Song.MP3");
        assert_eq!(asset.mime_type.as_deref(), Some("audio/mpeg"));
        assert_eq!(asset.extension().as_deref(), Some("mp3"));
        assert_eq!(asset.source, AssetSource::File(path));
    }

    #[test]
    fn test_guess_audio_mime_prefers_audio_types() {
        let guess = |name: &str| guess_audio_mime(Path::new(name));
        assert_eq!(guess("a.m4a").as_deref(), Some("audio/x-m4a"));
        assert_eq!(guess("a.mp4").as_deref(), Some("audio/mp4"));
        assert_eq!(guess("a.webm").as_deref(), Some("audio/webm"));
        assert_eq!(guess("a.wav").as_deref(), Some("audio/wav"));
        assert_eq!(guess("notes.txt").as_deref(), Some("text/plain"));
        assert_eq!(guess("noext"), None);
    }

    #[test]
    fn test_from_path_missing_file() {
        assert!(AudioAsset::from_path(Path::new("/nonexistent/file.mp3")).is_err());
    }
}
