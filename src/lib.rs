// Copyright (c) 2022 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Concurrent track ingestion.
//!
//! Turns a list of user-supplied paths (audio files, directories and playlists) into batches of
//! tracks with metadata. Paths are expanded depth-first, metadata is read by a bounded pool of
//! workers and results are handed to a [`TrackList`] one batch at a time.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::missing_docs_in_private_items)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
#![deny(absolute_paths_not_starting_with_crate)]
#![deny(elided_lifetimes_in_paths)]
#![deny(explicit_outlives_requirements)]
#![deny(keyword_idents)]
#![deny(macro_use_extern_crate)]
#![deny(meta_variable_misuse)]
#![deny(missing_abi)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]
#![deny(non_ascii_idents)]
#![deny(noop_method_call)]
#![deny(rust_2021_incompatible_closure_captures)]
#![deny(rust_2021_prefixes_incompatible_syntax)]
#![deny(rust_2021_prelude_collisions)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(unstable_features)]
#![deny(unused_extern_crates)]
#![deny(unused_import_braces)]
#![deny(unused_lifetimes)]
#![deny(unused_macro_rules)]

mod backend;
mod batch;
pub mod cli;
pub mod config;
mod error;
mod expander;
pub mod metadata;
pub mod pipeline;
pub mod playlist;
mod pool;
mod probe;
pub mod session;
mod tag;
pub mod tracklist;
mod util;

pub use backend::{Backend, BackendSelector};
pub use crate::config::Config;
pub use error::{ErrorType as Error, Result};
pub use metadata::{
    FileReadError, MetadataError, MetadataKind, MetadataReader, MetadataResult, PlaybackMetadata,
    PrimaryMetadata, TrackMetadata,
};
pub use pipeline::{IngestHandle, Pipeline, PipelineState};
pub use playlist::{FilePlaylistReader, PlaylistReader};
pub use session::{Progress, SessionError, SessionReport};
pub use tracklist::{LoadedTrackList, Track, TrackList};
