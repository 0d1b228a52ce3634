// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! State of a single ingestion run.

use crate::metadata::MetadataKind;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A session-level error encountered while expanding the input paths.
///
/// These errors never abort the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The path does not exist (this includes dangling symbolic links).
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    /// The path exists but could not be resolved or listed.
    #[error("Failed to read {}: {reason}", .path.display())]
    Unreadable {
        /// The affected path.
        path: PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },
}

impl SessionError {
    /// Build a session error from an I/O error for `path`.
    pub(crate) fn from_io(path: &Path, err: &io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            SessionError::NotFound(path.to_path_buf())
        } else {
            SessionError::Unreadable {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }
        }
    }

    /// The path this error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            SessionError::NotFound(path) | SessionError::Unreadable { path, .. } => path,
        }
    }
}

/// Progress of a session, reported after every delivered batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    /// Number of files whose results have been delivered.
    pub files_processed: usize,
    /// Number of files queued for reading so far.
    pub files_discovered: usize,
}

impl Progress {
    /// Percentage of discovered files that have been processed, `0.0` if nothing was discovered.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn percentage(&self) -> f64 {
        if self.files_discovered == 0 {
            0.0
        } else {
            self.files_processed as f64 * 100.0 / self.files_discovered as f64
        }
    }
}

/// Summary of a finished session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// The metadata kind that was read.
    pub kind: MetadataKind,
    /// Top-level inputs that contributed to the session (directories, playlists, files).
    pub history: Vec<PathBuf>,
    /// Expansion errors.
    pub errors: Vec<SessionError>,
    /// Number of files queued for reading.
    pub files_discovered: usize,
    /// Number of files whose results were delivered.
    pub files_processed: usize,
    /// Number of delivered batches.
    pub batches_delivered: usize,
}

/// Mutable state of one ingestion run, threaded through expansion and scheduling.
#[derive(Debug)]
pub(crate) struct IngestionSession {
    /// Requested metadata kind.
    kind: MetadataKind,
    /// Files queued for reading, in order.
    files: Vec<PathBuf>,
    /// Top-level inputs.
    history: Vec<PathBuf>,
    /// Expansion errors.
    errors: Vec<SessionError>,
    /// Number of files whose results were delivered.
    files_processed: usize,
    /// Number of delivered batches.
    batches_delivered: usize,
    /// Canonical directories and playlists that have already been expanded.
    visited: HashSet<PathBuf>,
}

impl IngestionSession {
    /// Start a new session.
    pub fn new(kind: MetadataKind) -> Self {
        Self {
            kind,
            files: Vec::new(),
            history: Vec::new(),
            errors: Vec::new(),
            files_processed: 0,
            batches_delivered: 0,
            visited: HashSet::new(),
        }
    }

    /// Requested metadata kind.
    pub fn kind(&self) -> MetadataKind {
        self.kind
    }

    /// Queue a file.
    pub fn add_file(&mut self, path: PathBuf) {
        self.files.push(path);
    }

    /// Files queued so far.
    #[cfg(test)]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Record a top-level input.
    pub fn add_history_item(&mut self, path: PathBuf) {
        log::debug!("Adding history item {}", path.display());
        self.history.push(path);
    }

    /// Top-level inputs recorded so far.
    #[cfg(test)]
    pub fn history(&self) -> &[PathBuf] {
        &self.history
    }

    /// Record an expansion error.
    pub fn add_error(&mut self, error: SessionError) {
        log::warn!("{error}");
        self.errors.push(error);
    }

    /// Expansion errors recorded so far.
    #[cfg(test)]
    pub fn errors(&self) -> &[SessionError] {
        &self.errors
    }

    /// Mark a canonical directory or playlist as expanded. Returns `false` if it was already
    /// expanded during this session.
    pub fn mark_visited(&mut self, path: &Path) -> bool {
        self.visited.insert(path.to_path_buf())
    }

    /// Account for a delivered batch of `files` results.
    pub fn mark_batch_delivered(&mut self, files: usize) {
        self.files_processed += files;
        self.batches_delivered += 1;
    }

    /// Current progress.
    pub fn progress(&self) -> Progress {
        Progress {
            files_processed: self.files_processed,
            files_discovered: self.files.len(),
        }
    }

    /// Finish the session.
    pub fn into_report(self) -> SessionReport {
        SessionReport {
            kind: self.kind,
            files_discovered: self.files.len(),
            files_processed: self.files_processed,
            batches_delivered: self.batches_delivered,
            history: self.history,
            errors: self.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage() {
        assert!(Progress::default().percentage().abs() < f64::EPSILON);
        let progress = Progress {
            files_processed: 1,
            files_discovered: 4,
        };
        assert!((progress.percentage() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_session_error_from_io() {
        let path = Path::new("/music/missing.mp3");
        let error = SessionError::from_io(path, &io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(error, SessionError::NotFound(path.to_path_buf()));
        assert_eq!(error.path(), path);
        assert_eq!(error.to_string(), "File not found: /music/missing.mp3");

        let error = SessionError::from_io(path, &io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(error, SessionError::Unreadable { .. }));
        assert_eq!(error.path(), path);
    }

    #[test]
    fn test_session_report() {
        let mut session = IngestionSession::new(MetadataKind::PlaybackOnly);
        assert_eq!(session.kind(), MetadataKind::PlaybackOnly);
        session.add_history_item(PathBuf::from("/music"));
        session.add_file(PathBuf::from("/music/a.mp3"));
        session.add_file(PathBuf::from("/music/b.mp3"));
        session.add_error(SessionError::NotFound(PathBuf::from("/music/c.mp3")));
        assert!(session.mark_visited(Path::new("/music")));
        assert!(!session.mark_visited(Path::new("/music")));
        session.mark_batch_delivered(2);

        assert_eq!(
            session.progress(),
            Progress {
                files_processed: 2,
                files_discovered: 2
            }
        );
        assert_eq!(session.files().len(), 2);

        let report = session.into_report();
        assert_eq!(report.kind, MetadataKind::PlaybackOnly);
        assert_eq!(report.history, [PathBuf::from("/music")]);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.files_discovered, 2);
        assert_eq!(report.files_processed, 2);
        assert_eq!(report.batches_delivered, 1);
    }
}
