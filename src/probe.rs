// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Generic metadata reading by probing the container format.

use crate::metadata::{
    MetadataError, MetadataKind, MetadataReader, PlaybackMetadata, PrimaryMetadata, TrackMetadata,
};
use crate::tag::parse_number_pair;
use crate::util::{duration_from_parts, parse_year_from_str};
use chrono::TimeDelta;
use std::ffi::OsStr;
use std::fs::File;
use std::path::Path;

use symphonia::core::codecs::{CodecParameters, CODEC_TYPE_NULL};
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::{MetadataOptions, MetadataRevision, StandardTagKey};
use symphonia::core::probe::{Hint, ProbedMetadata};

/// Reader that probes the container and reads whatever metadata it carries.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbeReader;

impl ProbeReader {
    /// Read only the stream parameters.
    pub fn read_playback(path: &Path) -> Result<PlaybackMetadata, MetadataError> {
        ProbedFile::open(path).map(|file| file.playback_metadata())
    }
}

impl MetadataReader for ProbeReader {
    fn read(&self, path: &Path, kind: MetadataKind) -> Result<TrackMetadata, MetadataError> {
        let mut file = ProbedFile::open(path)?;
        let metadata = match kind {
            MetadataKind::Primary => {
                let mut metadata = file.primary_metadata();
                metadata.duration = file.duration();
                TrackMetadata::Primary(metadata)
            }
            MetadataKind::PlaybackOnly => TrackMetadata::Playback(file.playback_metadata()),
        };
        Ok(metadata)
    }
}

/// A probed media file.
struct ProbedFile {
    /// Audio format reader.
    format: Box<dyn FormatReader>,
    /// Metadata found while probing, outside of the container (e.g. a leading ID3 tag).
    probed_metadata: ProbedMetadata,
    /// Track ID of the first decodable track.
    track_id: u32,
}

impl ProbedFile {
    /// Probe the file at the given path.
    fn open(path: &Path) -> Result<Self, MetadataError> {
        let src = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(src), MediaSourceStreamOptions::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(OsStr::to_str) {
            hint.with_extension(ext);
        }

        let meta_opts: MetadataOptions = MetadataOptions::default();
        let fmt_opts: FormatOptions = FormatOptions::default();

        let probed = symphonia::default::get_probe().format(&hint, mss, &fmt_opts, &meta_opts)?;
        let format = probed.format;

        let track_id = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .map(|track| track.id)
            .ok_or(MetadataError::NoSupportedAudioTracks)?;

        Ok(Self {
            format,
            probed_metadata: probed.metadata,
            track_id,
        })
    }

    /// Get the codec parameters.
    fn codec_params(&self) -> Option<&CodecParameters> {
        self.format
            .tracks()
            .iter()
            .find_map(|track| (track.id == self.track_id).then_some(&track.codec_params))
    }

    /// Track duration, calculated from the time base and the number of frames.
    fn duration(&self) -> Option<TimeDelta> {
        self.codec_params().and_then(|codec_params| {
            codec_params
                .time_base
                .zip(codec_params.n_frames)
                .map(|(time_base, n_frames)| time_base.calc_time(n_frames))
                .and_then(|time| duration_from_parts(time.seconds, time.frac))
        })
    }

    /// Stream parameters of the selected track.
    fn playback_metadata(&self) -> PlaybackMetadata {
        let Some(codec_params) = self.codec_params() else {
            return PlaybackMetadata::default();
        };

        PlaybackMetadata {
            codec: symphonia::default::get_codecs()
                .get_codec(codec_params.codec)
                .map(|descriptor| descriptor.short_name.to_string()),
            sample_rate: codec_params.sample_rate,
            channels: codec_params.channels.map(|channels| channels.count()),
            bits_per_sample: codec_params.bits_per_sample,
            duration: self.duration(),
        }
    }

    /// Descriptive metadata from the newest revision in the container, then the one found while
    /// probing.
    fn primary_metadata(&mut self) -> PrimaryMetadata {
        let mut metadata = PrimaryMetadata::default();
        if let Some(revision) = self.format.metadata().current() {
            apply_revision(&mut metadata, revision);
        }
        if let Some(probed) = self.probed_metadata.get() {
            if let Some(revision) = probed.current() {
                apply_revision(&mut metadata, revision);
            }
        }
        metadata
    }
}

/// Fill the fields of `metadata` that are still unset from the standard tags of a revision.
fn apply_revision(metadata: &mut PrimaryMetadata, revision: &MetadataRevision) {
    for tag in revision.tags() {
        let value = tag.value.to_string();
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        let text = || Some(value.to_string());
        let number = || parse_number_pair(value);
        match tag.std_key {
            Some(StandardTagKey::TrackTitle) => metadata.title = metadata.title.take().or_else(text),
            Some(StandardTagKey::Artist) => metadata.artist = metadata.artist.take().or_else(text),
            Some(StandardTagKey::Album) => metadata.album = metadata.album.take().or_else(text),
            Some(StandardTagKey::AlbumArtist) => {
                metadata.album_artist = metadata.album_artist.take().or_else(text);
            }
            Some(StandardTagKey::Genre) => metadata.genre = metadata.genre.take().or_else(text),
            Some(StandardTagKey::TrackNumber) => {
                let (track_number, total_tracks) = number();
                metadata.track_number = metadata.track_number.or(track_number);
                metadata.total_tracks = metadata.total_tracks.or(total_tracks);
            }
            Some(StandardTagKey::TrackTotal) => {
                metadata.total_tracks = metadata.total_tracks.or(number().0);
            }
            Some(StandardTagKey::DiscNumber) => {
                let (disc_number, total_discs) = number();
                metadata.disc_number = metadata.disc_number.or(disc_number);
                metadata.total_discs = metadata.total_discs.or(total_discs);
            }
            Some(StandardTagKey::DiscTotal) => {
                metadata.total_discs = metadata.total_discs.or(number().0);
            }
            Some(StandardTagKey::Date | StandardTagKey::ReleaseDate) => {
                metadata.year = metadata.year.take().or_else(|| parse_year_from_str(value));
            }
            _ => (),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing::write_wav;

    #[test]
    fn test_read_playback_metadata_from_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 8_000, 16_000);

        let metadata = ProbeReader.read(&path, MetadataKind::PlaybackOnly).unwrap();
        let metadata = metadata.as_playback().unwrap();
        assert_eq!(metadata.sample_rate, Some(8_000));
        assert_eq!(metadata.channels, Some(1));
        assert_eq!(metadata.bits_per_sample, Some(16));
        assert!(metadata.codec.is_some());
        assert_eq!(metadata.duration, Some(TimeDelta::seconds(2)));
    }

    #[test]
    fn test_read_primary_metadata_from_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 8_000, 4_000);

        let metadata = ProbeReader.read(&path, MetadataKind::Primary).unwrap();
        let metadata = metadata.as_primary().unwrap();
        assert_eq!(metadata.title, None);
        assert_eq!(metadata.duration, TimeDelta::new(0, 500_000_000));
    }

    #[test]
    fn test_read_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"this is not audio").unwrap();
        assert!(ProbeReader.read(&path, MetadataKind::Primary).is_err());
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ProbeReader::read_playback(&dir.path().join("missing.ogg"));
        assert!(matches!(result, Err(MetadataError::Io(_))));
    }
}
