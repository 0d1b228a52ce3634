// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Track metadata and the contract for reading it.

use chrono::TimeDelta;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The kind of metadata that an ingestion session reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataKind {
    /// Descriptive metadata (title, artist, album, ...).
    #[default]
    Primary,
    /// Only the stream parameters needed for playback.
    PlaybackOnly,
}

/// Descriptive metadata of a track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimaryMetadata {
    /// Track title.
    pub title: Option<String>,
    /// Track artist.
    pub artist: Option<String>,
    /// Release title.
    pub album: Option<String>,
    /// Release artist.
    pub album_artist: Option<String>,
    /// Genre.
    pub genre: Option<String>,
    /// Track number on the disc.
    pub track_number: Option<u32>,
    /// Total number of tracks on the disc.
    pub total_tracks: Option<u32>,
    /// Disc number.
    pub disc_number: Option<u32>,
    /// Total number of discs.
    pub total_discs: Option<u32>,
    /// Release year.
    pub year: Option<String>,
    /// Track duration.
    pub duration: Option<TimeDelta>,
}

impl PrimaryMetadata {
    /// Use the file stem of `path` as title if no title is set.
    #[must_use]
    pub fn with_fallback_title(mut self, path: &Path) -> Self {
        if self.title.as_deref().is_none_or(str::is_empty) {
            self.title = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned());
        }
        self
    }
}

/// Stream parameters needed for playback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackMetadata {
    /// Short codec name (e.g. `flac`).
    pub codec: Option<String>,
    /// Sample rate in Hz.
    pub sample_rate: Option<u32>,
    /// Number of audio channels.
    pub channels: Option<usize>,
    /// Bits per sample.
    pub bits_per_sample: Option<u32>,
    /// Track duration.
    pub duration: Option<TimeDelta>,
}

/// Metadata read from a file, depending on the requested [`MetadataKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackMetadata {
    /// Descriptive metadata.
    Primary(PrimaryMetadata),
    /// Playback metadata.
    Playback(PlaybackMetadata),
}

impl TrackMetadata {
    /// The kind of this metadata.
    #[must_use]
    pub fn kind(&self) -> MetadataKind {
        match self {
            TrackMetadata::Primary(_) => MetadataKind::Primary,
            TrackMetadata::Playback(_) => MetadataKind::PlaybackOnly,
        }
    }

    /// The track duration, if known.
    #[must_use]
    pub fn duration(&self) -> Option<TimeDelta> {
        match self {
            TrackMetadata::Primary(metadata) => metadata.duration,
            TrackMetadata::Playback(metadata) => metadata.duration,
        }
    }

    /// Returns the descriptive metadata, if this is [`TrackMetadata::Primary`].
    #[must_use]
    pub fn as_primary(&self) -> Option<&PrimaryMetadata> {
        match self {
            TrackMetadata::Primary(metadata) => Some(metadata),
            TrackMetadata::Playback(_) => None,
        }
    }

    /// Returns the playback metadata, if this is [`TrackMetadata::Playback`].
    #[must_use]
    pub fn as_playback(&self) -> Option<&PlaybackMetadata> {
        match self {
            TrackMetadata::Primary(_) => None,
            TrackMetadata::Playback(metadata) => Some(metadata),
        }
    }
}

/// An error while reading metadata from a single file.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// I/O Error.
    #[error("Input/Output error ({:?})", .0)]
    Io(#[from] io::Error),
    /// The file type is not supported by the selected backend.
    #[error("File has unsupported file type")]
    UnsupportedFormat,
    /// Errors raised by the [`id3`] crate.
    #[cfg(feature = "id3")]
    #[error("Failed to read ID3 tag ({0})")]
    Id3(#[from] id3::Error),
    /// Errors raised by the [`metaflac`] crate.
    #[cfg(feature = "flac")]
    #[error("Failed to read FLAC tag ({0})")]
    Flac(#[from] metaflac::Error),
    /// Errors raised by [`symphonia`].
    #[error("Symphonia error ({0})")]
    Symphonia(#[from] symphonia::core::errors::Error),
    /// The container has no decodable audio track.
    #[error("No supported audio tracks")]
    NoSupportedAudioTracks,
    /// The reader panicked while processing the file.
    #[error("Metadata reader panicked")]
    ReaderPanicked,
    /// No result was recorded for the file.
    #[error("Metadata was not read")]
    NotRead,
}

/// A per-file read failure, as delivered to the track list.
#[derive(Error, Debug)]
#[error("Failed to read metadata from {}: {error}", .path.display())]
pub struct FileReadError {
    /// The file that could not be read.
    pub path: PathBuf,
    /// The underlying error.
    #[source]
    pub error: MetadataError,
}

impl FileReadError {
    /// Create a read error for the given file.
    #[must_use]
    pub fn new(path: PathBuf, error: MetadataError) -> Self {
        Self { path, error }
    }
}

/// The result of reading metadata from one file.
pub type MetadataResult = Result<TrackMetadata, FileReadError>;

/// A capability that reads metadata from a file.
///
/// Implementations are called concurrently from the worker pool, one call per file.
pub trait MetadataReader: Send + Sync {
    /// Read metadata of the requested kind from the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or decoded.
    fn read(&self, path: &Path, kind: MetadataKind) -> Result<TrackMetadata, MetadataError>;
}
