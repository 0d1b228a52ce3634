// Copyright (c) 2022 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Native tag reading for formats that have a dedicated tag library.

#[cfg(feature = "flac")]
mod flac;
#[cfg(feature = "id3")]
mod id3;

use crate::metadata::{
    MetadataError, MetadataKind, MetadataReader, PlaybackMetadata, PrimaryMetadata, TrackMetadata,
};
use crate::probe::ProbeReader;
use crate::util::parse_year_from_str;
use std::ffi::OsStr;
use std::path::Path;

/// A tag key describes the kind of information in a generic, format-independent way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKey {
    /// Title of the release.
    Album,
    /// Artist(s) primarily credited on the release.
    AlbumArtist,
    /// Track Artist Name(s).
    Artist,
    /// Number of the disc in this release that contains this track.
    DiscNumber,
    /// Genre Name(s) of the track.
    Genre,
    /// Release Date (YYYY-MM-DD) - the date that the release was issued.
    ReleaseDate,
    /// Release Year (YYYY) - the year that the release was issued.
    ReleaseYear,
    /// Total number of discs in this release.
    TotalDiscs,
    /// Total tracks on this disc.
    TotalTracks,
    /// Track number on the disc.
    TrackNumber,
    /// Track Title.
    TrackTitle,
}

/// The tag type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    /// ID3v2.2 tag
    ID3v22,
    /// ID3v2.3 tag
    ID3v23,
    /// ID3v2.4 tag
    ID3v24,
    /// Vorbis tag from a FLAC file
    Flac,
}

/// A tag tag can be used for reading.
pub trait Tag {
    /// Get the tag type.
    fn tag_type(&self) -> TagType;
    /// Get the string value for the tag key.
    fn get(&self, key: TagKey) -> Option<&str>;
}

/// Parse a number field of the form `N` or `N/M`.
pub fn parse_number_pair(value: &str) -> (Option<u32>, Option<u32>) {
    let mut parts = value.splitn(2, '/');
    let number = parts.next().and_then(|part| part.trim().parse().ok());
    let total = parts.next().and_then(|part| part.trim().parse().ok());
    (number, total)
}

/// Read all tags that are present in the file.
fn read_tags_from_path(path: &Path, extension: &str) -> Result<Vec<Box<dyn Tag>>, MetadataError> {
    match extension {
        #[cfg(feature = "id3")]
        "mp3" => match self::id3::ID3v2Tag::read_from_path(path) {
            Ok(tag) => {
                let tag: Box<dyn Tag> = Box::new(tag);
                Ok(vec![tag])
            }
            Err(MetadataError::Id3(err)) if matches!(err.kind, ::id3::ErrorKind::NoTag) => {
                log::debug!("No ID3 tag in {}", path.display());
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        },
        #[cfg(feature = "flac")]
        "flac" => self::flac::FlacTag::read_from_path(path).map(|tag| {
            let tag: Box<dyn Tag> = Box::new(tag);
            vec![tag]
        }),
        ext => {
            log::debug!("No native tag support for file extension {ext:?}");
            Err(MetadataError::UnsupportedFormat)
        }
    }
}

/// Build descriptive metadata from the first non-empty value of each field across `tags`.
fn primary_metadata_from_tags(tags: &[Box<dyn Tag>]) -> PrimaryMetadata {
    let get = |key: TagKey| {
        tags.iter()
            .filter_map(|tag| tag.get(key))
            .map(str::trim)
            .find(|value| !value.is_empty())
    };
    let get_string = |key: TagKey| get(key).map(ToString::to_string);
    let get_number = |key: TagKey| get(key).and_then(|value| parse_number_pair(value).0);

    let (track_number, track_total) = get(TagKey::TrackNumber).map_or((None, None), parse_number_pair);
    let (disc_number, disc_total) = get(TagKey::DiscNumber).map_or((None, None), parse_number_pair);

    PrimaryMetadata {
        title: get_string(TagKey::TrackTitle),
        artist: get_string(TagKey::Artist),
        album: get_string(TagKey::Album),
        album_artist: get_string(TagKey::AlbumArtist),
        genre: get_string(TagKey::Genre),
        track_number,
        total_tracks: track_total.or_else(|| get_number(TagKey::TotalTracks)),
        disc_number,
        total_discs: disc_total.or_else(|| get_number(TagKey::TotalDiscs)),
        year: get(TagKey::ReleaseDate)
            .or_else(|| get(TagKey::ReleaseYear))
            .and_then(parse_year_from_str),
        duration: None,
    }
}

/// Reader for formats with a dedicated tag library (ID3 for MP3, Vorbis comments for FLAC).
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeTagReader;

impl NativeTagReader {
    /// Returns `true` if the (lowercase) extension can be read natively with the enabled features.
    pub fn supports(extension: &str) -> bool {
        match extension {
            #[cfg(feature = "id3")]
            "mp3" => true,
            #[cfg(feature = "flac")]
            "flac" => true,
            _ => false,
        }
    }

    /// Read the stream parameters of the file.
    fn playback_metadata(path: &Path, extension: &str) -> Result<PlaybackMetadata, MetadataError> {
        match extension {
            #[cfg(feature = "flac")]
            "flac" => self::flac::read_stream_info(path),
            _ => ProbeReader::read_playback(path),
        }
    }
}

impl MetadataReader for NativeTagReader {
    fn read(&self, path: &Path, kind: MetadataKind) -> Result<TrackMetadata, MetadataError> {
        let extension = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase)
            .ok_or(MetadataError::UnsupportedFormat)?;

        match kind {
            MetadataKind::Primary => {
                let tags = read_tags_from_path(path, &extension)?;
                for tag in &tags {
                    log::debug!("Read {:?} tag from {}", tag.tag_type(), path.display());
                }
                let mut metadata = primary_metadata_from_tags(&tags);
                metadata.duration = Self::playback_metadata(path, &extension)
                    .inspect_err(|err| {
                        log::debug!("No duration for {}: {err}", path.display());
                    })
                    .ok()
                    .and_then(|playback| playback.duration);
                Ok(TrackMetadata::Primary(metadata))
            }
            MetadataKind::PlaybackOnly => {
                Self::playback_metadata(path, &extension).map(TrackMetadata::Playback)
            }
        }
    }
}
