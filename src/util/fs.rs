// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Filesystem-related utility functions.

use crate::config::SortOrder;
use itertools::Itertools;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A set of lowercase file extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionSet(HashSet<String>);

impl ExtensionSet {
    /// Normalize an extension (strip a leading dot, lowercase).
    fn normalize(extension: &str) -> String {
        extension.trim_start_matches('.').to_ascii_lowercase()
    }

    /// Returns `true` if the extension is part of this set.
    pub fn contains(&self, extension: &str) -> bool {
        self.0.contains(&Self::normalize(extension))
    }

    /// Returns `true` if the path has an extension that is part of this set.
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .is_some_and(|extension| self.contains(extension))
    }

    /// Keep only the extensions that satisfy the predicate.
    #[must_use]
    pub fn filtered(mut self, predicate: impl Fn(&str) -> bool) -> Self {
        self.0.retain(|extension| predicate(extension));
        self
    }

    /// Returns `true` if the set is empty.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ExtensionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|extension| Self::normalize(extension.as_ref()))
                .filter(|extension| !extension.is_empty())
                .collect(),
        )
    }
}

/// Lists the immediate entries of a directory, sorted by file name.
pub fn list_dir_sorted(path: &Path, sort_order: SortOrder) -> io::Result<Vec<PathBuf>> {
    let entries = fs::read_dir(path)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<io::Result<Vec<PathBuf>>>()?;
    Ok(entries
        .into_iter()
        .sorted_by(|a, b| {
            sort_order.compare(
                a.file_name().unwrap_or_default(),
                b.file_name().unwrap_or_default(),
            )
        })
        .collect())
}
