//! Tag extraction for upload drafts
//!
//! Extracts artist, title, album, genre and year with lofty. Files lofty
//! cannot read simply yield no tags.

use lofty::file::TaggedFileExt;
use lofty::prelude::*;
use lofty::probe::Probe;
use std::borrow::Cow;
use std::path::Path;

/// Tags found in an uploaded file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub year: Option<u32>,
}

/// Read the primary (or first) tag of an audio file
pub fn read_tags(file_path: &Path) -> TrackTags {
    let tagged_file = match Probe::open(file_path).and_then(|probe| probe.read()) {
        Ok(file) => file,
        Err(e) => {
            tracing::debug!(file = %file_path.display(), error = %e, "No readable tags");
            return TrackTags::default();
        }
    };

    let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
        return TrackTags::default();
    };

    TrackTags {
        title: non_empty(tag.title()),
        artist: non_empty(tag.artist()),
        album: non_empty(tag.album()),
        genre: non_empty(tag.genre()),
        year: tag.year(),
    }
}

fn non_empty(value: Option<Cow<'_, str>>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
