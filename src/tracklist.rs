// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The consumer side of an ingestion session.

use crate::metadata::{FileReadError, MetadataResult, TrackMetadata};
use crate::session::Progress;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Receives the batches of an ingestion session.
///
/// The track list owns the deduplication policy: [`TrackList::should_load`] is asked once for
/// every candidate file before it is queued, and the state updated in
/// [`TrackList::accept_batch`] is visible to the `should_load` calls for the next batch.
pub trait TrackList {
    /// Returns `true` if the file should be read and delivered.
    fn should_load(&self, path: &Path) -> bool;

    /// Accept a batch of results, in the order the files were discovered.
    fn accept_batch(&mut self, batch: Vec<(PathBuf, MetadataResult)>);

    /// Called after every delivered batch.
    fn on_progress(&mut self, _progress: Progress) {}
}

/// A track that has been loaded into a [`LoadedTrackList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Canonical path of the file.
    pub path: PathBuf,
    /// Metadata read from the file.
    pub metadata: TrackMetadata,
}

/// In-memory track list that skips files it already contains.
///
/// Files that failed to load are not remembered, so they are tried again in a later session.
#[derive(Debug, Default)]
pub struct LoadedTrackList {
    /// Loaded tracks, in delivery order.
    tracks: Vec<Track>,
    /// Files that could not be read.
    failures: Vec<FileReadError>,
    /// Paths of all loaded tracks.
    loaded: HashSet<PathBuf>,
}

impl LoadedTrackList {
    /// Create an empty track list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loaded tracks, in delivery order.
    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Files that could not be read.
    #[must_use]
    pub fn failures(&self) -> &[FileReadError] {
        &self.failures
    }

    /// Number of loaded tracks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Returns `true` if no tracks are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Returns `true` if the file is loaded.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.loaded.contains(path)
    }
}

impl TrackList for LoadedTrackList {
    fn should_load(&self, path: &Path) -> bool {
        !self.contains(path)
    }

    fn accept_batch(&mut self, batch: Vec<(PathBuf, MetadataResult)>) {
        for (path, result) in batch {
            match result {
                Ok(metadata) => {
                    if !self.loaded.insert(path.clone()) {
                        log::debug!("Skipping already loaded track {}", path.display());
                        continue;
                    }
                    self.tracks.push(Track { path, metadata });
                }
                Err(err) => {
                    log::warn!("{err}");
                    self.failures.push(err);
                }
            }
        }
    }
}
