// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Bounded worker pool that reads the metadata of a batch in parallel.

use crate::batch::Batch;
use crate::metadata::{
    FileReadError, MetadataError, MetadataKind, MetadataReader, MetadataResult,
};
use futures::executor::{block_on, ThreadPool};
use futures::future::join_all;
use futures::task::SpawnExt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

/// Prefix for worker thread names.
const THREAD_NAME_PREFIX: &str = "trackloader-reader-";

/// A fixed-size pool of metadata reader threads, created once and reused for every batch.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    /// The underlying thread pool.
    pool: ThreadPool,
    /// Number of worker threads.
    size: usize,
}

impl WorkerPool {
    /// Create a pool with `size` threads (at least 1).
    pub fn new(size: usize) -> crate::Result<Self> {
        let size = size.max(1);
        let pool = ThreadPool::builder()
            .pool_size(size)
            .name_prefix(THREAD_NAME_PREFIX)
            .create()?;
        log::debug!("Started worker pool with {size} threads");
        Ok(Self { pool, size })
    }

    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Read the metadata of every file in the batch and record the results in it.
    ///
    /// Blocks until all reads of the batch have completed.
    pub fn read_batch(
        &self,
        batch: &Batch,
        reader: &Arc<dyn MetadataReader>,
        kind: MetadataKind,
    ) -> crate::Result<()> {
        log::debug!(
            "Reading {} of {} files on {} workers",
            batch.len(),
            batch.capacity(),
            self.size
        );
        let handles = batch
            .paths()
            .iter()
            .cloned()
            .map(|path| {
                let reader = Arc::clone(reader);
                let results = batch.results();
                self.pool.spawn_with_handle(async move {
                    let result = read_file(reader.as_ref(), &path, kind);
                    results.record(path, result);
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let _ = block_on(join_all(handles));
        Ok(())
    }
}

/// Read a single file, turning errors and panics into a per-file error.
fn read_file(reader: &dyn MetadataReader, path: &Path, kind: MetadataKind) -> MetadataResult {
    panic::catch_unwind(AssertUnwindSafe(|| reader.read(path, kind)))
        .unwrap_or_else(|_| {
            log::error!("Metadata reader panicked on {}", path.display());
            Err(MetadataError::ReaderPanicked)
        })
        .map_err(|err| {
            log::warn!("Failed to read metadata from {}: {err}", path.display());
            FileReadError::new(path.to_path_buf(), err)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing::FakeReader;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_read_batch_fills_all_results() {
        let pool = WorkerPool::new(3).unwrap();
        assert_eq!(pool.size(), 3);

        let reader: Arc<dyn MetadataReader> = Arc::new(
            FakeReader::default()
                .with_delay("a.mp3", Duration::from_millis(60))
                .with_delay("b.mp3", Duration::from_millis(30))
                .failing_on("c.mp3")
                .panicking_on("d.mp3"),
        );

        let mut batch = Batch::new(5);
        for name in ["a.mp3", "b.mp3", "c.mp3", "d.mp3", "e.mp3"] {
            assert!(batch.append(PathBuf::from("/music").join(name)));
        }

        pool.read_batch(&batch, &reader, MetadataKind::Primary).unwrap();
        let drained = batch.drain();

        let names: Vec<_> = drained
            .iter()
            .map(|(path, _)| path.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.mp3", "b.mp3", "c.mp3", "d.mp3", "e.mp3"]);
        assert!(drained[0].1.is_ok());
        assert!(drained[1].1.is_ok());
        assert!(matches!(
            drained[2].1,
            Err(FileReadError {
                error: MetadataError::UnsupportedFormat,
                ..
            })
        ));
        assert!(matches!(
            drained[3].1,
            Err(FileReadError {
                error: MetadataError::ReaderPanicked,
                ..
            })
        ));
        assert!(drained[4].1.is_ok());
    }

    #[test]
    fn test_zero_size_pool() {
        let pool = WorkerPool::new(0).unwrap();
        assert_eq!(pool.size(), 1);
    }

    #[test]
    fn test_read_batch_runs_in_parallel() {
        let pool = WorkerPool::new(4).unwrap();
        let reader: Arc<dyn MetadataReader> = Arc::new(
            ["a.mp3", "b.mp3", "c.mp3", "d.mp3"]
                .into_iter()
                .fold(FakeReader::default(), |reader, name| {
                    reader.with_delay(name, Duration::from_millis(200))
                }),
        );

        let mut batch = Batch::new(4);
        for name in ["a.mp3", "b.mp3", "c.mp3", "d.mp3"] {
            assert!(batch.append(PathBuf::from(name)));
        }

        let start = std::time::Instant::now();
        pool.read_batch(&batch, &reader, MetadataKind::Primary).unwrap();
        assert!(start.elapsed() < Duration::from_millis(750));
        assert!(batch.drain().iter().all(|(_, result)| result.is_ok()));
    }
}
