// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Support for ID3 tags.

use crate::metadata::MetadataError;
use crate::tag::{Tag, TagKey, TagType};
use id3::TagLike;
use std::path::Path;

/// ID3 tag (version 2).
#[derive(Debug)]
pub struct ID3v2Tag {
    /// The underlying tag data.
    data: id3::Tag,
}

impl ID3v2Tag {
    /// Read the ID3 tag from the path
    pub fn read_from_path(path: impl AsRef<Path>) -> Result<Self, MetadataError> {
        let data = id3::Tag::read_from_path(path)?;
        Ok(ID3v2Tag { data })
    }

    /// Get the ID3 text frame for a tag key.
    ///
    /// Totals are stored in the `TRCK` and `TPOS` frames as `N/M`, so they have no frame of
    /// their own. ID3v2.2 frames are converted to their ID3v2.3 equivalents when reading.
    fn tag_key_to_frame(&self, key: TagKey) -> Option<&'static str> {
        match key {
            TagKey::Album => "TALB".into(),
            TagKey::AlbumArtist => "TPE2".into(),
            TagKey::Artist => "TPE1".into(),
            TagKey::DiscNumber => "TPOS".into(),
            TagKey::Genre => "TCON".into(),
            TagKey::ReleaseDate => match self.data.version() {
                id3::Version::Id3v22 | id3::Version::Id3v23 => None,
                id3::Version::Id3v24 => "TDRC".into(),
            },
            TagKey::ReleaseYear => match self.data.version() {
                id3::Version::Id3v22 | id3::Version::Id3v23 => "TYER".into(),
                id3::Version::Id3v24 => None,
            },
            TagKey::TotalDiscs | TagKey::TotalTracks => None,
            TagKey::TrackNumber => "TRCK".into(),
            TagKey::TrackTitle => "TIT2".into(),
        }
    }

    /// Get the content of a text frame as string.
    fn get_frames<'a>(&'a self, frame_id: &'a str) -> impl Iterator<Item = &'a str> {
        self.data
            .get(frame_id)
            .and_then(|frame| frame.content().text_values())
            .into_iter()
            .flatten()
    }
}

impl Tag for ID3v2Tag {
    fn tag_type(&self) -> TagType {
        match self.data.version() {
            id3::Version::Id3v22 => TagType::ID3v22,
            id3::Version::Id3v23 => TagType::ID3v23,
            id3::Version::Id3v24 => TagType::ID3v24,
        }
    }

    fn get(&self, key: TagKey) -> Option<&str> {
        self.tag_key_to_frame(key)
            .and_then(|frame_id| self.get_frames(frame_id).next())
    }
}
