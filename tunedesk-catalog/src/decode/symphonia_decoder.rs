//! Symphonia-backed duration probe
//!
//! Reads the frame count the container declares. Containers without one
//! (raw ADTS, some Ogg streams) are walked packet by packet; the walk checks
//! the cancellation token between packets so an abandoned estimation stops
//! consuming the blocking pool.

use super::{AssetSource, AudioAsset, DecodeError, MediaDecoder};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::{Time, TimeBase};
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Decoder reading durations from local files and fetched URLs
#[derive(Clone, Default)]
pub struct SymphoniaDecoder {
    http: reqwest::Client,
}

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Download a remote asset into a temp file removed when the handle drops
    async fn stage_remote(
        &self,
        url: &str,
        extension: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<NamedTempFile, DecodeError> {
        let mut response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DecodeError::Cancelled),
            response = self.http.get(url).send() => {
                response.map_err(|e| DecodeError::Fetch(e.to_string()))?
            }
        };

        if !response.status().is_success() {
            return Err(DecodeError::Fetch(format!("HTTP {} for {}", response.status(), url)));
        }

        let suffix = extension.map(|e| format!(".{}", e)).unwrap_or_default();
        let mut staged = tempfile::Builder::new()
            .prefix("tunedesk-probe-")
            .suffix(&suffix)
            .tempfile()
            .map_err(|e| DecodeError::Io(e.to_string()))?;

        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DecodeError::Cancelled),
                chunk = response.chunk() => chunk.map_err(|e| DecodeError::Fetch(e.to_string()))?,
            };
            match chunk {
                Some(bytes) => staged
                    .write_all(&bytes)
                    .map_err(|e| DecodeError::Io(e.to_string()))?,
                None => break,
            }
        }

        staged.flush().map_err(|e| DecodeError::Io(e.to_string()))?;
        debug!(url, staged = %staged.path().display(), "Staged remote asset");
        Ok(staged)
    }
}

#[async_trait::async_trait]
impl MediaDecoder for SymphoniaDecoder {
    async fn decode_duration(
        &self,
        asset: &AudioAsset,
        cancel: CancellationToken,
    ) -> Result<f64, DecodeError> {
        let extension = asset.extension();

        let (path, staged) = match &asset.source {
            AssetSource::File(path) => (path.clone(), None),
            AssetSource::Url(url) => {
                let staged = self.stage_remote(url, extension.as_deref(), &cancel).await?;
                (staged.path().to_path_buf(), Some(staged))
            }
        };

        // The staged file moves into the blocking task so it outlives any reader
        let task_cancel = cancel.clone();
        tokio::task::spawn_blocking(move || {
            let result = probe_duration(&path, extension.as_deref(), &task_cancel);
            drop(staged);
            result
        })
        .await
        .map_err(|e| DecodeError::Malformed(format!("Probe task failed: {}", e)))?
    }
}

/// Read the duration of a local file in seconds
pub fn probe_duration(
    path: &Path,
    extension: Option<&str>,
    cancel: &CancellationToken,
) -> Result<f64, DecodeError> {
    let file = File::open(path).map_err(|e| DecodeError::Io(e.to_string()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| DecodeError::Unsupported(e.to_string()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoAudioTrack)?;

    let track_id = track.id;
    let params = track.codec_params.clone();
    let time_base = params
        .time_base
        .or_else(|| params.sample_rate.map(|rate| TimeBase::new(1, rate)));

    if let (Some(n_frames), Some(tb)) = (params.n_frames, time_base) {
        return Ok(seconds(tb.calc_time(n_frames)));
    }

    let tb = time_base.ok_or_else(|| DecodeError::Malformed("No time base or sample rate".into()))?;

    let mut end_ts: u64 = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(DecodeError::Cancelled);
        }

        match format.next_packet() {
            Ok(packet) => {
                if packet.track_id() == track_id {
                    end_ts = end_ts.max(packet.ts() + packet.dur());
                }
            }
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(DecodeError::Malformed(e.to_string())),
        }
    }

    Ok(seconds(tb.calc_time(end_ts)))
}

fn seconds(time: Time) -> f64 {
    time.seconds as f64 + time.frac
}
