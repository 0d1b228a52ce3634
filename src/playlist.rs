// Copyright (c) 2025 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Playlist file parsing.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// A capability that turns a playlist file into the ordered list of its member paths.
pub trait PlaylistReader: Send + Sync {
    /// Read the member paths of the playlist at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the playlist cannot be read.
    fn read_playlist(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Reads M3U/M3U8 and PLS playlists from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilePlaylistReader;

/// Byte order mark that some editors put at the start of M3U8 files.
const BYTE_ORDER_MARK: char = '\u{feff}';

impl FilePlaylistReader {
    /// Parse the content of an M3U/M3U8 playlist.
    fn parse_m3u(content: &str) -> impl Iterator<Item = &str> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
    }

    /// Parse the content of a PLS playlist, ordered by entry number.
    fn parse_pls(content: &str) -> impl Iterator<Item = &str> {
        let mut entries = content
            .lines()
            .filter_map(|line| line.trim().split_once('='))
            .filter_map(|(key, value)| {
                let number = key
                    .trim()
                    .get(..4)
                    .filter(|prefix| prefix.eq_ignore_ascii_case("file"))
                    .and_then(|_| key.trim()[4..].parse::<usize>().ok())?;
                Some((number, value.trim()))
            })
            .filter(|(_, value)| !value.is_empty())
            .collect::<Vec<_>>();
        entries.sort_by_key(|&(number, _)| number);
        entries.into_iter().map(|(_, value)| value)
    }

    /// Resolve a playlist entry relative to the playlist directory.
    ///
    /// Returns `None` for URLs that do not point to a local file.
    fn resolve_entry(base_dir: &Path, entry: &str) -> Option<PathBuf> {
        match Url::parse(entry) {
            // Windows drive letters parse as one-letter schemes.
            Ok(url) if url.scheme().len() > 1 => {
                if url.scheme() != "file" {
                    log::debug!("Skipping non-local playlist entry {entry}");
                    return None;
                }
                url.to_file_path()
                    .inspect_err(|_| log::debug!("Skipping remote playlist entry {entry}"))
                    .ok()
            }
            _ => {
                let path = PathBuf::from(entry);
                Some(if path.is_absolute() {
                    path
                } else {
                    base_dir.join(path)
                })
            }
        }
    }
}

impl PlaylistReader for FilePlaylistReader {
    fn read_playlist(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let bytes = fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);
        let content = content.trim_start_matches(BYTE_ORDER_MARK);
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

        let is_pls = path
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|extension| extension.eq_ignore_ascii_case("pls"));
        let entries: Vec<&str> = if is_pls {
            Self::parse_pls(content).collect()
        } else {
            Self::parse_m3u(content).collect()
        };

        let paths: Vec<PathBuf> = entries
            .into_iter()
            .filter_map(|entry| Self::resolve_entry(base_dir, entry))
            .collect();
        log::debug!("Read {} entries from playlist {}", paths.len(), path.display());
        Ok(paths)
    }
}
