// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Configuration utils.
//!
//! The embedded default configuration is layered below an optional user file and environment
//! variables of the form `TRACKLOADER__<SECTION>__<KEY>` (e.g. `TRACKLOADER__PIPELINE__BATCH_SIZE`).

use ::config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ffi::OsStr;
use std::path::Path;
use thiserror::Error;

/// Encountered when the configuration cannot be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The embedded default configuration is malformed.
    #[error("Malformed default configuration: {0}")]
    Default(#[from] toml::de::Error),
    /// A configuration source could not be read or merged.
    #[error("{0}")]
    Source(#[from] ::config::ConfigError),
}

/// Default configuration TOML string.
const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "TRACKLOADER";

/// Separator between prefix, section and key in environment variable names.
const ENV_SEPARATOR: &str = "__";

/// Worker pool and batching configuration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Number of files per batch. Use `0` to use the number of workers.
    pub batch_size: usize,
    /// Number of metadata reader threads. Use `0` to derive it from the number of CPU cores.
    pub num_parallel_jobs: usize,
    /// Worker threads per CPU core, used if `num_parallel_jobs` is `0`.
    pub parallel_jobs_per_core: f64,
}

impl PipelineConfig {
    /// Number of worker threads to use for reading metadata.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        Some(self.num_parallel_jobs)
            .filter(|&n| n != 0)
            .unwrap_or_else(|| jobs_for_cores(num_cpus::get(), self.parallel_jobs_per_core))
    }

    /// Number of files per batch.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        Some(self.batch_size)
            .filter(|&n| n != 0)
            .unwrap_or_else(|| self.worker_count())
    }
}

/// Number of jobs for the given core count, rounded and at least 1.
#[expect(clippy::cast_precision_loss)]
#[expect(clippy::cast_possible_truncation)]
#[expect(clippy::cast_sign_loss)]
fn jobs_for_cores(cores: usize, jobs_per_core: f64) -> usize {
    let jobs = (cores as f64 * jobs_per_core).round();
    if jobs.is_finite() && jobs >= 1.0 {
        jobs as usize
    } else {
        1
    }
}

/// Order of directory entries during expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Compare lowercased names first, then fall back to a case-sensitive comparison.
    #[default]
    CaseInsensitive,
    /// Compare names byte-wise.
    CaseSensitive,
}

impl SortOrder {
    /// Compare two file names.
    #[must_use]
    pub fn compare(self, a: &OsStr, b: &OsStr) -> Ordering {
        match self {
            SortOrder::CaseSensitive => a.cmp(b),
            SortOrder::CaseInsensitive => a
                .to_string_lossy()
                .to_lowercase()
                .cmp(&b.to_string_lossy().to_lowercase())
                .then_with(|| a.cmp(b)),
        }
    }
}

/// Path expansion configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExpansionConfig {
    /// Directories and playlists nested deeper than this are skipped.
    pub max_depth: usize,
    /// Order of directory entries.
    pub sort_order: SortOrder,
}

/// Supported file extensions (without leading dot, case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FormatsConfig {
    /// Audio file extensions.
    pub audio: Vec<String>,
    /// Playlist file extensions.
    pub playlist: Vec<String>,
    /// Audio formats handled by the native tag reader instead of the generic probe.
    pub native: Vec<String>,
}

/// The main configuration struct.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Worker pool and batching configuration.
    pub pipeline: PipelineConfig,
    /// Path expansion configuration.
    pub expansion: ExpansionConfig,
    /// Supported file extensions.
    pub formats: FormatsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::load_default().expect("Failed to load default config")
    }
}

impl Config {
    /// Load the configuration from a string slice.
    fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        let config = toml::from_str(text)?;
        Ok(config)
    }

    /// Load the default configuration.
    fn load_default() -> Result<Self, ConfigError> {
        Self::load_from_str(DEFAULT_CONFIG)
    }

    /// Load the configuration by layering the user file at `path` (if any) and environment
    /// variables on top of the defaults.
    ///
    /// # Errors
    ///
    /// This method can fail if the file cannot be accessed or if any source contains malformed
    /// configuration markup.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));
        if let Some(path) = path {
            log::debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pipeline.batch_size, 0);
        assert_eq!(config.pipeline.num_parallel_jobs, 0);
        assert_eq!(config.expansion.max_depth, 64);
        assert_eq!(config.expansion.sort_order, SortOrder::CaseInsensitive);
        assert!(config.formats.audio.iter().any(|ext| ext == "mp3"));
        assert!(config.formats.playlist.iter().any(|ext| ext == "m3u"));
        assert_eq!(config.formats.native, vec!["mp3", "flac"]);
    }

    #[test]
    fn test_worker_count() {
        assert_eq!(jobs_for_cores(4, 1.5), 6);
        assert_eq!(jobs_for_cores(1, 1.5), 2);
        assert_eq!(jobs_for_cores(3, 0.1), 1);
        assert_eq!(jobs_for_cores(0, 1.5), 1);
        assert_eq!(jobs_for_cores(8, f64::NAN), 1);

        let mut pipeline = Config::default().pipeline;
        assert!(pipeline.worker_count() >= 1);
        pipeline.num_parallel_jobs = 3;
        assert_eq!(pipeline.worker_count(), 3);
    }

    #[test]
    fn test_batch_size_defaults_to_worker_count() {
        let mut pipeline = Config::default().pipeline;
        pipeline.num_parallel_jobs = 5;
        assert_eq!(pipeline.batch_size(), 5);
        pipeline.batch_size = 2;
        assert_eq!(pipeline.batch_size(), 2);
    }

    #[test]
    fn test_sort_order() {
        let mut names = vec![OsStr::new("b.flac"), OsStr::new("Live"), OsStr::new("a.mp3")];
        names.sort_by(|a, b| SortOrder::CaseInsensitive.compare(a, b));
        assert_eq!(names, ["a.mp3", "b.flac", "Live"]);

        names.sort_by(|a, b| SortOrder::CaseSensitive.compare(a, b));
        assert_eq!(names, ["Live", "a.mp3", "b.flac"]);

        let mut names = vec![OsStr::new("abc"), OsStr::new("ABC")];
        names.sort_by(|a, b| SortOrder::CaseInsensitive.compare(a, b));
        assert_eq!(names, ["ABC", "abc"]);
    }

    #[test]
    fn test_load_user_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[pipeline]\nbatch_size = 7\n\n[expansion]\nsort_order = \"case-sensitive\""
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.pipeline.batch_size, 7);
        assert_eq!(config.expansion.sort_order, SortOrder::CaseSensitive);
        assert_eq!(config.expansion.max_depth, 64);
        assert_eq!(config.formats, Config::default().formats);
    }

    #[test]
    fn test_load_missing_user_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(dir.path().join("missing.toml").as_path())).is_err());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::load_from_str(&text).unwrap(), config);
    }
}
