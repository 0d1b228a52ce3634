// Copyright (c) 2022 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Support for FLAC tags.

use crate::metadata::{MetadataError, PlaybackMetadata};
use crate::tag::{Tag, TagKey, TagType};
use crate::util::duration_from_samples;
use metaflac::block::StreamInfo;
use std::path::Path;

/// FLAC tag.
pub struct FlacTag {
    /// The underlying tag data.
    data: metaflac::Tag,
}

impl FlacTag {
    /// Read the FLAC tag from the path
    pub fn read_from_path(path: impl AsRef<Path>) -> Result<Self, MetadataError> {
        let data = metaflac::Tag::read_from_path(path)?;
        Ok(FlacTag { data })
    }

    /// Get the vorbis key names for a tag key, in order of preference.
    fn tag_key_to_frames(key: TagKey) -> &'static [&'static str] {
        match key {
            TagKey::Album => &["ALBUM"],
            TagKey::AlbumArtist => &["ALBUMARTIST"],
            TagKey::Artist => &["ARTIST"],
            TagKey::DiscNumber => &["DISCNUMBER"],
            TagKey::Genre => &["GENRE"],
            TagKey::ReleaseDate => &["DATE"],
            TagKey::ReleaseYear => &[],
            TagKey::TotalDiscs => &["DISCTOTAL", "TOTALDISCS"],
            TagKey::TotalTracks => &["TRACKTOTAL", "TOTALTRACKS"],
            TagKey::TrackNumber => &["TRACKNUMBER"],
            TagKey::TrackTitle => &["TITLE"],
        }
    }
}

impl Tag for FlacTag {
    fn tag_type(&self) -> TagType {
        TagType::Flac
    }

    fn get(&self, key: TagKey) -> Option<&str> {
        Self::tag_key_to_frames(key)
            .iter()
            .filter_map(|key| self.data.get_vorbis(key))
            .find_map(|mut iterator| iterator.next())
    }
}

/// Convert the STREAMINFO block into playback metadata.
fn playback_metadata_from_stream_info(info: &StreamInfo) -> PlaybackMetadata {
    PlaybackMetadata {
        codec: Some("flac".to_string()),
        sample_rate: Some(info.sample_rate).filter(|&rate| rate != 0),
        channels: Some(usize::from(info.num_channels)),
        bits_per_sample: Some(u32::from(info.bits_per_sample)),
        duration: Some(info.total_samples)
            .filter(|&samples| samples != 0)
            .and_then(|samples| duration_from_samples(samples, info.sample_rate)),
    }
}

/// Read the stream parameters of a FLAC file from its STREAMINFO block.
pub fn read_stream_info(path: &Path) -> Result<PlaybackMetadata, MetadataError> {
    let data = metaflac::Tag::read_from_path(path)?;
    data.get_streaminfo()
        .map(playback_metadata_from_stream_info)
        .ok_or(MetadataError::NoSupportedAudioTracks)
}
