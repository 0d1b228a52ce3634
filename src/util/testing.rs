// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Testing utils.

use crate::config::Config;
use crate::expander::CandidateSink;
use crate::metadata::{
    MetadataError, MetadataKind, MetadataReader, MetadataResult, PlaybackMetadata,
    PrimaryMetadata, TrackMetadata,
};
use crate::session::{IngestionSession, Progress};
use crate::tracklist::TrackList;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Create a temporary directory and return it together with its canonical path.
pub fn canonical_tempdir() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    (dir, root)
}

/// Create an empty file, including its parent directories.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"").unwrap();
}

/// The default configuration with a fixed batch size and worker count.
pub fn test_config(batch_size: usize, workers: usize) -> Config {
    let mut config = Config::default();
    config.pipeline.batch_size = batch_size;
    config.pipeline.num_parallel_jobs = workers;
    config
}

/// Write a silent 16-bit mono PCM WAV file.
pub fn write_wav(path: &Path, sample_rate: u32, frames: u32) {
    let data_len = frames * 2;
    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // channels
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes()); // block align
    bytes.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(bytes.len() + data_len as usize, 0);
    fs::write(path, bytes).unwrap();
}

/// Write a file that only consists of an ID3v2.4 tag.
#[cfg(feature = "id3")]
pub fn write_tagged_mp3(path: &Path, title: &str, artist: &str, (track, total): (u32, u32)) {
    use id3::TagLike;

    fs::write(path, b"").unwrap();
    let mut tag = id3::Tag::new();
    tag.set_title(title);
    tag.set_artist(artist);
    tag.set_track(track);
    tag.set_total_tracks(total);
    tag.write_to_path(path, id3::Version::Id3v24).unwrap();
}

/// Metadata reader that does not touch the file system.
///
/// Behaviour is configured per file name. Successful reads return the file name as title.
#[derive(Debug, Default)]
pub struct FakeReader {
    /// Time to sleep before returning.
    delays: HashMap<String, Duration>,
    /// Files that fail with [`MetadataError::UnsupportedFormat`].
    failing: HashSet<String>,
    /// Files that make the reader panic.
    panicking: HashSet<String>,
}

impl FakeReader {
    /// Sleep for `delay` when reading `name`.
    pub fn with_delay(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(name.to_string(), delay);
        self
    }

    /// Fail when reading `name`.
    pub fn failing_on(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Panic when reading `name`.
    pub fn panicking_on(mut self, name: &str) -> Self {
        self.panicking.insert(name.to_string());
        self
    }
}

impl MetadataReader for FakeReader {
    fn read(&self, path: &Path, kind: MetadataKind) -> Result<TrackMetadata, MetadataError> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Some(delay) = self.delays.get(&name) {
            std::thread::sleep(*delay);
        }
        assert!(!self.panicking.contains(&name), "reader panicked on {name}");
        if self.failing.contains(&name) {
            return Err(MetadataError::UnsupportedFormat);
        }

        Ok(match kind {
            MetadataKind::Primary => TrackMetadata::Primary(PrimaryMetadata {
                title: Some(name),
                ..Default::default()
            }),
            MetadataKind::PlaybackOnly => TrackMetadata::Playback(PlaybackMetadata::default()),
        })
    }
}

/// Candidate sink that records every pushed file.
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// Files rejected by `should_load`.
    rejected: HashSet<PathBuf>,
    /// Pushed files, in order.
    pub pushed: Vec<PathBuf>,
}

impl RecordingSink {
    /// Create a sink that rejects the given files.
    pub fn rejecting(paths: &[PathBuf]) -> Self {
        Self {
            rejected: paths.iter().cloned().collect(),
            pushed: Vec::new(),
        }
    }
}

impl CandidateSink for RecordingSink {
    fn should_load(&self, path: &Path) -> bool {
        !self.rejected.contains(path)
    }

    fn push(&mut self, path: PathBuf, session: &mut IngestionSession) -> crate::Result<()> {
        self.pushed.push(path.clone());
        session.add_file(path);
        Ok(())
    }
}

/// Track list that records every delivered batch.
#[derive(Debug, Default)]
pub struct RecordingTrackList {
    /// Paths of every delivered batch.
    pub batches: Vec<Vec<PathBuf>>,
    /// Successfully read files.
    pub loaded: Vec<PathBuf>,
    /// Files that could not be read.
    pub failed: Vec<PathBuf>,
    /// Progress updates.
    pub progress: Vec<Progress>,
}

impl TrackList for RecordingTrackList {
    fn should_load(&self, _path: &Path) -> bool {
        true
    }

    fn accept_batch(&mut self, batch: Vec<(PathBuf, MetadataResult)>) {
        self.batches
            .push(batch.iter().map(|(path, _)| path.clone()).collect());
        for (path, result) in batch {
            if result.is_ok() {
                self.loaded.push(path);
            } else {
                self.failed.push(path);
            }
        }
    }

    fn on_progress(&mut self, progress: Progress) {
        self.progress.push(progress);
    }
}
