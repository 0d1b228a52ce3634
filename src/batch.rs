// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Fixed-capacity batches of files that are read together.

use crate::metadata::{FileReadError, MetadataError, MetadataResult};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared handle to the result map of a [`Batch`].
///
/// Workers hold a clone and record their result when done. The lock is only held for a single
/// map insert.
#[derive(Debug, Clone, Default)]
pub struct BatchResults(Arc<Mutex<HashMap<PathBuf, MetadataResult>>>);

impl BatchResults {
    /// Record the result for `path`. Only the first result for a path is kept.
    pub fn record(&self, path: PathBuf, result: MetadataResult) {
        let mut results = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        match results.entry(path) {
            Entry::Occupied(entry) => {
                log::error!("Duplicate metadata result for {}", entry.key().display());
            }
            Entry::Vacant(entry) => {
                entry.insert(result);
            }
        }
    }

    /// Remove and return all recorded results.
    fn take(&self) -> HashMap<PathBuf, MetadataResult> {
        mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// An ordered, fixed-capacity set of files plus their metadata results.
#[derive(Debug)]
pub struct Batch {
    /// Maximum number of files.
    capacity: usize,
    /// Appended files, in insertion order.
    paths: Vec<PathBuf>,
    /// Results recorded by the workers.
    results: BatchResults,
}

impl Batch {
    /// Create an empty batch. A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            paths: Vec::with_capacity(capacity),
            results: BatchResults::default(),
        }
    }

    /// Maximum number of files in this batch.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of appended files.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns `true` if no files have been appended.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Returns `true` if the batch is at capacity and must be flushed.
    pub fn is_full(&self) -> bool {
        self.paths.len() >= self.capacity
    }

    /// Appended files, in insertion order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Returns `true` if `path` has already been appended.
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|appended| appended == path)
    }

    /// Append a file. Returns `false` if the file is already part of this batch.
    ///
    /// # Panics
    ///
    /// Panics if the batch is full. Full batches must be flushed before appending.
    pub fn append(&mut self, path: PathBuf) -> bool {
        assert!(
            !self.is_full(),
            "Appending {} to a full batch of {} files",
            path.display(),
            self.capacity
        );

        if self.contains(&path) {
            return false;
        }

        self.paths.push(path);
        true
    }

    /// Handle for the workers to record results.
    pub fn results(&self) -> BatchResults {
        self.results.clone()
    }

    /// Take the results in insertion order and clear the batch for reuse.
    ///
    /// A file without a recorded result gets a [`MetadataError::NotRead`] error.
    pub fn drain(&mut self) -> Vec<(PathBuf, MetadataResult)> {
        let mut results = self.results.take();
        let drained = mem::take(&mut self.paths)
            .into_iter()
            .map(|path| {
                let result = results.remove(&path).unwrap_or_else(|| {
                    log::error!("No metadata result recorded for {}", path.display());
                    Err(FileReadError::new(path.clone(), MetadataError::NotRead))
                });
                (path, result)
            })
            .collect();

        for path in results.keys() {
            log::error!("Discarding metadata result for unknown file {}", path.display());
        }

        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{PrimaryMetadata, TrackMetadata};

    fn ok() -> MetadataResult {
        Ok(TrackMetadata::Primary(PrimaryMetadata::default()))
    }

    #[test]
    fn test_append_and_capacity() {
        let mut batch = Batch::new(2);
        assert_eq!(batch.capacity(), 2);
        assert!(batch.is_empty());
        assert!(batch.append(PathBuf::from("/a.mp3")));
        assert!(!batch.append(PathBuf::from("/a.mp3")));
        assert_eq!(batch.len(), 1);
        assert!(!batch.is_full());
        assert!(batch.append(PathBuf::from("/b.mp3")));
        assert!(batch.is_full());
        assert!(batch.contains(Path::new("/b.mp3")));
    }

    #[test]
    fn test_zero_capacity_is_one() {
        let batch = Batch::new(0);
        assert_eq!(batch.capacity(), 1);
    }

    #[test]
    #[should_panic(expected = "full batch")]
    fn test_append_to_full_batch_panics() {
        let mut batch = Batch::new(1);
        let _ = batch.append(PathBuf::from("/a.mp3"));
        let _ = batch.append(PathBuf::from("/b.mp3"));
    }

    #[test]
    fn test_drain_preserves_insertion_order() {
        let mut batch = Batch::new(3);
        for name in ["/c.mp3", "/a.mp3", "/b.mp3"] {
            assert!(batch.append(PathBuf::from(name)));
        }

        let results = batch.results();
        results.record(PathBuf::from("/b.mp3"), ok());
        results.record(PathBuf::from("/a.mp3"), ok());
        results.record(
            PathBuf::from("/c.mp3"),
            Err(FileReadError::new(
                PathBuf::from("/c.mp3"),
                MetadataError::UnsupportedFormat,
            )),
        );

        let drained = batch.drain();
        let paths: Vec<_> = drained.iter().map(|(path, _)| path.as_path()).collect();
        assert_eq!(paths, [Path::new("/c.mp3"), Path::new("/a.mp3"), Path::new("/b.mp3")]);
        assert!(drained[0].1.is_err());
        assert!(drained[1].1.is_ok());
        assert!(drained[2].1.is_ok());

        assert!(batch.is_empty());
        assert!(batch.drain().is_empty());
    }

    #[test]
    fn test_drain_marks_missing_results() {
        let mut batch = Batch::new(2);
        assert!(batch.append(PathBuf::from("/a.mp3")));
        assert!(batch.append(PathBuf::from("/b.mp3")));
        batch.results().record(PathBuf::from("/a.mp3"), ok());

        let drained = batch.drain();
        assert!(drained[0].1.is_ok());
        assert!(matches!(
            drained[1].1,
            Err(FileReadError {
                error: MetadataError::NotRead,
                ..
            })
        ));
    }

    #[test]
    fn test_first_result_wins() {
        let mut batch = Batch::new(1);
        assert!(batch.append(PathBuf::from("/a.mp3")));
        let results = batch.results();
        results.record(PathBuf::from("/a.mp3"), ok());
        results.record(
            PathBuf::from("/a.mp3"),
            Err(FileReadError::new(PathBuf::from("/a.mp3"), MetadataError::NotRead)),
        );

        let drained = batch.drain();
        assert_eq!(drained.len(), 1);
        assert!(drained[0].1.is_ok());
    }
}
