// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Error and result types.

use std::io;
use thiserror::Error;

/// Main error type.
///
/// Per-file metadata errors are not part of this type, they are delivered with the batch (see
/// [`MetadataError`](crate::MetadataError)).
#[derive(Error, Debug)]
pub enum ErrorType {
    /// Configuration error.
    #[error("Configuration Error ({0})")]
    Config(#[from] crate::config::ConfigError),
    /// I/O Error.
    #[error("Input/Output error ({:?})", .0)]
    Io(#[from] io::Error),
    /// A metadata read could not be handed to the worker pool.
    #[error("Failed to spawn metadata reader task: {0}")]
    Spawn(#[from] futures::task::SpawnError),
    /// An ingestion session is already running on this pipeline.
    #[error("Another ingestion session is already active")]
    SessionActive,
    /// The background ingestion task did not finish.
    #[error("Background ingestion task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    /// The logger could not be installed.
    #[error("Failed to initialize logger: {0}")]
    Logger(#[from] log::SetLoggerError),
    /// The configuration could not be serialized.
    #[error("Failed to serialize configuration: {0}")]
    SerializeConfig(#[from] toml::ser::Error),
}

/// Convenience type.
pub type Result<T> = std::result::Result<T, ErrorType>;
