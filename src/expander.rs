// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Expansion of input paths into candidate audio files.
//!
//! Expansion is depth-first: directories are listed in name order and playlists in entry order.
//! Every candidate is handed to a [`CandidateSink`] as soon as it is found.

use crate::config::SortOrder;
use crate::playlist::PlaylistReader;
use crate::session::{IngestionSession, SessionError};
use crate::util::{list_dir_sorted, ExtensionSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Receives the candidate files found during expansion.
pub trait CandidateSink {
    /// Returns `true` if the (canonical) file should be queued.
    fn should_load(&self, path: &Path) -> bool;

    /// Queue a file. The sink may flush queued files before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if queued files could not be read. This aborts the expansion.
    fn push(&mut self, path: PathBuf, session: &mut IngestionSession) -> crate::Result<()>;
}

/// Recursively resolves input paths into audio files.
pub struct PathExpander<'a> {
    /// Audio file extensions.
    audio: &'a ExtensionSet,
    /// Playlist file extensions.
    playlist: &'a ExtensionSet,
    /// Playlist parser.
    playlists: &'a dyn PlaylistReader,
    /// Maximum nesting depth of directories and playlists.
    max_depth: usize,
    /// Order of directory entries.
    sort_order: SortOrder,
}

impl<'a> PathExpander<'a> {
    /// Create an expander.
    pub fn new(
        audio: &'a ExtensionSet,
        playlist: &'a ExtensionSet,
        playlists: &'a dyn PlaylistReader,
        max_depth: usize,
        sort_order: SortOrder,
    ) -> Self {
        Self {
            audio,
            playlist,
            playlists,
            max_depth,
            sort_order,
        }
    }

    /// Expand the caller-supplied `inputs` in order.
    ///
    /// # Errors
    ///
    /// Only errors from the sink are returned. Expansion errors are recorded on the session.
    pub fn expand(
        &self,
        inputs: &[PathBuf],
        session: &mut IngestionSession,
        sink: &mut dyn CandidateSink,
    ) -> crate::Result<()> {
        for input in inputs {
            self.expand_path(input, 0, session, sink)?;
        }
        Ok(())
    }

    /// Expand a single path found at the given nesting depth (0 for top-level inputs).
    fn expand_path(
        &self,
        path: &Path,
        depth: usize,
        session: &mut IngestionSession,
        sink: &mut dyn CandidateSink,
    ) -> crate::Result<()> {
        let is_top_level = depth == 0;
        let resolved = match fs::canonicalize(path) {
            Ok(resolved) => resolved,
            Err(err) => {
                session.add_error(SessionError::from_io(path, &err));
                return Ok(());
            }
        };
        let is_dir = match fs::metadata(&resolved) {
            Ok(metadata) => metadata.is_dir(),
            Err(err) => {
                session.add_error(SessionError::from_io(path, &err));
                return Ok(());
            }
        };

        if is_dir {
            self.expand_directory(resolved, depth, session, sink)
        } else if self.playlist.matches(&resolved) {
            self.expand_playlist(resolved, depth, session, sink)
        } else if self.audio.matches(&resolved) {
            if !sink.should_load(&resolved) {
                log::debug!("Skipping {} (rejected by track list)", resolved.display());
                return Ok(());
            }
            if is_top_level {
                session.add_history_item(resolved.clone());
            }
            sink.push(resolved, session)
        } else {
            log::debug!("Skipping {} (unsupported file type)", resolved.display());
            Ok(())
        }
    }

    /// Check that a directory or playlist may be expanded and record it.
    fn enter(&self, resolved: &Path, depth: usize, session: &mut IngestionSession) -> bool {
        if depth > self.max_depth {
            log::warn!(
                "Skipping {} (nested deeper than {} levels)",
                resolved.display(),
                self.max_depth
            );
            return false;
        }

        if depth == 0 {
            session.add_history_item(resolved.to_path_buf());
        }

        if !session.mark_visited(resolved) {
            log::debug!("Skipping {} (already expanded)", resolved.display());
            return false;
        }
        true
    }

    /// Expand the entries of a directory in name order.
    fn expand_directory(
        &self,
        resolved: PathBuf,
        depth: usize,
        session: &mut IngestionSession,
        sink: &mut dyn CandidateSink,
    ) -> crate::Result<()> {
        if !self.enter(&resolved, depth, session) {
            return Ok(());
        }

        let entries = match list_dir_sorted(&resolved, self.sort_order) {
            Ok(entries) => entries,
            Err(err) => {
                session.add_error(SessionError::from_io(&resolved, &err));
                return Ok(());
            }
        };
        log::debug!("Expanding directory {} ({} entries)", resolved.display(), entries.len());

        for entry in entries {
            self.expand_path(&entry, depth + 1, session, sink)?;
        }
        Ok(())
    }

    /// Expand the entries of a playlist in order.
    fn expand_playlist(
        &self,
        resolved: PathBuf,
        depth: usize,
        session: &mut IngestionSession,
        sink: &mut dyn CandidateSink,
    ) -> crate::Result<()> {
        if !self.enter(&resolved, depth, session) {
            return Ok(());
        }

        let entries = match self.playlists.read_playlist(&resolved) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("Failed to read playlist {}: {err}", resolved.display());
                return Ok(());
            }
        };
        log::debug!("Expanding playlist {} ({} entries)", resolved.display(), entries.len());

        for entry in entries {
            self.expand_path(&entry, depth + 1, session, sink)?;
        }
        Ok(())
    }
}
