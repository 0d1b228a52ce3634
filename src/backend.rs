// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Per-file selection of the metadata backend.

use crate::metadata::{MetadataError, MetadataKind, MetadataReader, TrackMetadata};
use crate::probe::ProbeReader;
use crate::tag::NativeTagReader;
use crate::util::ExtensionSet;
use std::path::Path;

/// A metadata backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Dedicated tag library for natively supported formats.
    Native,
    /// Generic container probe.
    Probe,
}

impl MetadataReader for Backend {
    fn read(&self, path: &Path, kind: MetadataKind) -> Result<TrackMetadata, MetadataError> {
        match self {
            Backend::Native => NativeTagReader.read(path, kind),
            Backend::Probe => ProbeReader.read(path, kind),
        }
    }
}

/// Chooses the backend for a file based on its extension.
///
/// This is the default [`MetadataReader`] of a [`Pipeline`](crate::Pipeline).
#[derive(Debug, Clone)]
pub struct BackendSelector {
    /// Extensions that are read by the native backend.
    native_extensions: ExtensionSet,
}

impl BackendSelector {
    /// Create a selector for the given natively supported extensions.
    ///
    /// Extensions that the native backend cannot read with the enabled crate features are read by
    /// the probe backend instead.
    #[must_use]
    pub fn new<S: AsRef<str>>(native_extensions: impl IntoIterator<Item = S>) -> Self {
        let native_extensions = native_extensions
            .into_iter()
            .collect::<ExtensionSet>()
            .filtered(|extension| {
                let supported = NativeTagReader::supports(extension);
                if !supported {
                    log::warn!("Native metadata reading is not available for {extension:?} files");
                }
                supported
            });
        Self { native_extensions }
    }

    /// The backend to use for the file at `path`.
    #[must_use]
    pub fn backend_for(&self, path: &Path) -> Backend {
        if self.native_extensions.matches(path) {
            Backend::Native
        } else {
            Backend::Probe
        }
    }
}

impl MetadataReader for BackendSelector {
    fn read(&self, path: &Path, kind: MetadataKind) -> Result<TrackMetadata, MetadataError> {
        let backend = self.backend_for(path);
        log::debug!("Reading {kind:?} metadata from {} using {backend:?}", path.display());
        backend.read(path, kind).map(|metadata| match metadata {
            TrackMetadata::Primary(primary) => {
                TrackMetadata::Primary(primary.with_fallback_title(path))
            }
            playback @ TrackMetadata::Playback(_) => playback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing::write_wav;

    #[test]
    fn test_backend_for() {
        let selector = BackendSelector::new(["mp3", "flac"]);
        assert_eq!(
            selector.backend_for(Path::new("/music/a.MP3")),
            if cfg!(feature = "id3") { Backend::Native } else { Backend::Probe }
        );
        assert_eq!(
            selector.backend_for(Path::new("/music/b.flac")),
            if cfg!(feature = "flac") { Backend::Native } else { Backend::Probe }
        );
        assert_eq!(selector.backend_for(Path::new("/music/c.ogg")), Backend::Probe);
        assert_eq!(selector.backend_for(Path::new("/music/noext")), Backend::Probe);
    }

    #[test]
    fn test_unsupported_native_extensions_are_probed() {
        let selector = BackendSelector::new(["ogg"]);
        assert_eq!(selector.backend_for(Path::new("c.ogg")), Backend::Probe);
    }

    #[test]
    fn test_read_falls_back_to_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("07 Untitled.wav");
        write_wav(&path, 8_000, 800);

        let selector = BackendSelector::new(["mp3", "flac"]);
        let metadata = selector.read(&path, MetadataKind::Primary).unwrap();
        assert_eq!(
            metadata.as_primary().and_then(|m| m.title.as_deref()),
            Some("07 Untitled")
        );

        let metadata = selector.read(&path, MetadataKind::PlaybackOnly).unwrap();
        assert_eq!(metadata.kind(), MetadataKind::PlaybackOnly);
    }
}
