// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The ingestion pipeline.
//!
//! A [`Pipeline`] is created once with its collaborators and runs one ingestion session at a
//! time. During a session, input paths are expanded into candidate files that are appended to a
//! batch. Whenever the batch is full (and once more at the end), the metadata of all files in the
//! batch is read in parallel and the results are handed to the [`TrackList`] in discovery order.

use crate::backend::BackendSelector;
use crate::batch::Batch;
use crate::config::{Config, ExpansionConfig};
use crate::expander::{CandidateSink, PathExpander};
use crate::metadata::{MetadataKind, MetadataReader, MetadataResult};
use crate::playlist::{FilePlaylistReader, PlaylistReader};
use crate::pool::WorkerPool;
use crate::session::{IngestionSession, Progress, SessionReport};
use crate::tracklist::TrackList;
use crate::util::ExtensionSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;

/// Observable state of a [`Pipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    /// No session is running.
    #[default]
    Idle,
    /// Input paths are being expanded.
    Expanding,
    /// A batch is being read and delivered.
    FlushingBatch,
    /// All batches have been delivered and the session report is being assembled.
    Finalizing,
}

/// Concurrent track ingestion pipeline.
pub struct Pipeline {
    /// Audio file extensions.
    audio_extensions: ExtensionSet,
    /// Playlist file extensions.
    playlist_extensions: ExtensionSet,
    /// Path expansion configuration.
    expansion: ExpansionConfig,
    /// Number of files per batch.
    batch_size: usize,
    /// Metadata reader used by the workers.
    reader: Arc<dyn MetadataReader>,
    /// Playlist parser.
    playlists: Box<dyn PlaylistReader>,
    /// Worker pool, shared by all sessions.
    pool: WorkerPool,
    /// Set while a session is running.
    active: AtomicBool,
    /// Current state.
    state: Mutex<PipelineState>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("audio_extensions", &self.audio_extensions)
            .field("playlist_extensions", &self.playlist_extensions)
            .field("expansion", &self.expansion)
            .field("batch_size", &self.batch_size)
            .field("pool", &self.pool)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Create a pipeline with the default metadata backends and playlist reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker pool cannot be started.
    pub fn new(config: &Config) -> crate::Result<Self> {
        let reader = Arc::new(BackendSelector::new(&config.formats.native));
        Self::with_collaborators(config, reader, Box::new(FilePlaylistReader))
    }

    /// Create a pipeline with a custom metadata reader and playlist reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker pool cannot be started.
    pub fn with_collaborators(
        config: &Config,
        reader: Arc<dyn MetadataReader>,
        playlists: Box<dyn PlaylistReader>,
    ) -> crate::Result<Self> {
        let pool = WorkerPool::new(config.pipeline.worker_count())?;
        let batch_size = config.pipeline.batch_size();
        log::debug!("Using batch size {batch_size}");
        Ok(Self {
            audio_extensions: config.formats.audio.iter().collect(),
            playlist_extensions: config.formats.playlist.iter().collect(),
            expansion: config.expansion,
            batch_size,
            reader,
            playlists,
            pool,
            active: AtomicBool::new(false),
            state: Mutex::new(PipelineState::Idle),
        })
    }

    /// Number of worker threads.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.pool.size()
    }

    /// Number of files per batch.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` while a session is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Transition to the given state.
    fn set_state(&self, state: PipelineState) {
        let mut current = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != state {
            log::debug!("Pipeline state: {:?} -> {state:?}", *current);
            *current = state;
        }
    }

    /// Claim the session slot.
    fn begin_session(&self) -> crate::Result<SessionGuard<'_>> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                log::warn!("Rejecting ingestion request, another session is active");
                crate::Error::SessionActive
            })?;
        Ok(SessionGuard { pipeline: self })
    }

    /// Expander for a session.
    fn expander(&self) -> PathExpander<'_> {
        PathExpander::new(
            &self.audio_extensions,
            &self.playlist_extensions,
            self.playlists.as_ref(),
            self.expansion.max_depth,
            self.expansion.sort_order,
        )
    }

    /// Run an ingestion session on the calling thread.
    ///
    /// The `inputs` are expanded in order. Files accepted by [`TrackList::should_load`] are read
    /// in batches and every batch is delivered with [`TrackList::accept_batch`] before expansion
    /// continues. Missing inputs and unreadable directories are reported in the returned
    /// [`SessionReport`]; per-file read errors are delivered with the batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionActive`](crate::Error::SessionActive) if another session is
    /// running on this pipeline, or an error if reads cannot be handed to the worker pool.
    pub fn load(
        &self,
        inputs: &[PathBuf],
        kind: MetadataKind,
        consumer: &mut dyn TrackList,
    ) -> crate::Result<SessionReport> {
        let _session_guard = self.begin_session()?;
        log::info!("Loading {} input path(s)", inputs.len());

        let mut session = IngestionSession::new(kind);
        let mut run = SessionRun {
            pipeline: self,
            batch: Batch::new(self.batch_size),
            consumer,
        };

        self.set_state(PipelineState::Expanding);
        self.expander().expand(inputs, &mut session, &mut run)?;
        run.flush(&mut session)?;

        self.set_state(PipelineState::Finalizing);
        let report = session.into_report();
        log::info!(
            "Processed {} of {} files in {} batch(es) with {} error(s)",
            report.files_processed,
            report.files_discovered,
            report.batches_delivered,
            report.errors.len()
        );
        Ok(report)
    }

    /// Run an ingestion session on a blocking thread of the tokio runtime.
    ///
    /// Progress is pushed to the returned handle after every batch. The consumer is handed back
    /// together with the report by [`IngestHandle::finish`].
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn spawn<C>(
        self: &Arc<Self>,
        inputs: Vec<PathBuf>,
        kind: MetadataKind,
        consumer: C,
    ) -> IngestHandle<C>
    where
        C: TrackList + Send + 'static,
    {
        let (progress_tx, progress_rx) = async_channel::unbounded();
        let pipeline = Arc::clone(self);
        let task = tokio::task::spawn_blocking(move || -> crate::Result<(C, SessionReport)> {
            let mut forwarder = ProgressForwarder {
                inner: consumer,
                progress_tx,
            };
            let report = pipeline.load(&inputs, kind, &mut forwarder)?;
            Ok((forwarder.inner, report))
        });

        IngestHandle {
            progress_rx,
            task,
        }
    }
}

/// Releases the session slot and returns the pipeline to [`PipelineState::Idle`] when dropped.
struct SessionGuard<'a> {
    /// The pipeline running the session.
    pipeline: &'a Pipeline,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.pipeline.set_state(PipelineState::Idle);
        self.pipeline.active.store(false, Ordering::Release);
    }
}

/// The open batch and the consumer of a running session.
struct SessionRun<'a> {
    /// The pipeline running the session.
    pipeline: &'a Pipeline,
    /// The open batch.
    batch: Batch,
    /// The track list that receives the batches.
    consumer: &'a mut dyn TrackList,
}

impl SessionRun<'_> {
    /// Read and deliver the open batch, if it is not empty.
    fn flush(&mut self, session: &mut IngestionSession) -> crate::Result<()> {
        if self.batch.is_empty() {
            return Ok(());
        }

        self.pipeline.set_state(PipelineState::FlushingBatch);
        self.pipeline
            .pool
            .read_batch(&self.batch, &self.pipeline.reader, session.kind())?;
        let results = self.batch.drain();
        session.mark_batch_delivered(results.len());
        self.consumer.accept_batch(results);
        self.consumer.on_progress(session.progress());
        self.pipeline.set_state(PipelineState::Expanding);
        Ok(())
    }
}

impl CandidateSink for SessionRun<'_> {
    fn should_load(&self, path: &Path) -> bool {
        self.consumer.should_load(path)
    }

    fn push(&mut self, path: PathBuf, session: &mut IngestionSession) -> crate::Result<()> {
        if !self.batch.append(path.clone()) {
            log::debug!("Skipping {} (already queued)", path.display());
            return Ok(());
        }

        session.add_file(path);
        if self.batch.is_full() {
            self.flush(session)?;
        }
        Ok(())
    }
}

/// Track list wrapper that also pushes progress to a channel.
struct ProgressForwarder<C> {
    /// The wrapped track list.
    inner: C,
    /// Progress channel.
    progress_tx: async_channel::Sender<Progress>,
}

impl<C: TrackList> TrackList for ProgressForwarder<C> {
    fn should_load(&self, path: &Path) -> bool {
        self.inner.should_load(path)
    }

    fn accept_batch(&mut self, batch: Vec<(PathBuf, MetadataResult)>) {
        self.inner.accept_batch(batch);
    }

    fn on_progress(&mut self, progress: Progress) {
        self.inner.on_progress(progress);
        if let Err(err) = self.progress_tx.try_send(progress) {
            log::debug!("Progress receiver dropped: {err}");
        }
    }
}

/// Handle to a session started with [`Pipeline::spawn`].
#[derive(Debug)]
pub struct IngestHandle<C> {
    /// Progress updates, one per delivered batch.
    progress_rx: async_channel::Receiver<Progress>,
    /// The background task.
    task: JoinHandle<crate::Result<(C, SessionReport)>>,
}

impl<C> IngestHandle<C> {
    /// Wait for the next progress update. Returns `None` once the session has finished.
    pub async fn recv_progress(&self) -> Option<Progress> {
        self.progress_rx.recv().await.ok()
    }

    /// A receiver for the progress updates.
    #[must_use]
    pub fn progress(&self) -> async_channel::Receiver<Progress> {
        self.progress_rx.clone()
    }

    /// Wait for the session to finish and return the track list and the report.
    ///
    /// # Errors
    ///
    /// Returns the session error, or [`Error::Join`](crate::Error::Join) if the background task
    /// panicked.
    pub async fn finish(self) -> crate::Result<(C, SessionReport)> {
        self.task.await?
    }
}
