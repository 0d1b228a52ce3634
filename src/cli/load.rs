// Copyright (c) 2025 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Module for the `load` CLI subcommand.

use crate::util::FormattedDuration;
use crate::{Config, LoadedTrackList, MetadataKind, Pipeline, Track, TrackMetadata};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

/// Command line arguments for the `load` CLI command.
#[derive(Parser, Debug)]
pub struct Args {
    /// Only read stream properties (codec, sample rate, duration) instead of tags.
    #[arg(long)]
    playback_only: bool,
    /// Audio files, directories or playlists to load.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

impl Args {
    /// The metadata kind to read.
    fn metadata_kind(&self) -> MetadataKind {
        if self.playback_only {
            MetadataKind::PlaybackOnly
        } else {
            MetadataKind::Primary
        }
    }
}

/// Format a track for display.
fn describe(track: &Track) -> String {
    let duration = track
        .metadata
        .duration()
        .map_or_else(|| "?:??".to_string(), |duration| duration.formatted_duration());
    match &track.metadata {
        TrackMetadata::Primary(metadata) => format!(
            "{artist} - {title} [{duration}]",
            artist = metadata.artist.as_deref().unwrap_or("[unknown artist]"),
            title = metadata.title.as_deref().unwrap_or("[unknown title]"),
        ),
        TrackMetadata::Playback(metadata) => format!(
            "{path} ({codec}, {sample_rate} Hz, {channels} ch) [{duration}]",
            path = track.path.display(),
            codec = metadata.codec.as_deref().unwrap_or("unknown codec"),
            sample_rate = metadata
                .sample_rate
                .map_or_else(|| "?".to_string(), |rate| rate.to_string()),
            channels = metadata
                .channels
                .map_or_else(|| "?".to_string(), |channels| channels.to_string()),
        ),
    }
}

/// Run the `load` command.
pub async fn run(config: &Config, args: Args) -> crate::Result<()> {
    let pipeline = Arc::new(Pipeline::new(config)?);
    log::debug!(
        "Loading with {} workers and batch size {}",
        pipeline.worker_count(),
        pipeline.batch_size()
    );

    let kind = args.metadata_kind();
    let handle = pipeline.spawn(args.paths, kind, LoadedTrackList::new());
    while let Some(progress) = handle.recv_progress().await {
        log::info!(
            "Processed {processed}/{discovered} files ({percentage:.0}%)",
            processed = progress.files_processed,
            discovered = progress.files_discovered,
            percentage = progress.percentage(),
        );
    }

    let (tracks, report) = handle.finish().await?;
    for track in tracks.tracks() {
        println!("{}", describe(track));
    }
    for failure in tracks.failures() {
        println!("Unreadable: {failure}");
    }
    for error in &report.errors {
        println!("Error: {error}");
    }
    for path in &report.history {
        println!("Input: {}", path.display());
    }

    println!(
        "Loaded {loaded} tracks from {inputs} inputs ({failed} unreadable, {errors} errors)",
        loaded = tracks.len(),
        inputs = report.history.len(),
        failed = tracks.failures().len(),
        errors = report.errors.len(),
    );

    Ok(())
}
