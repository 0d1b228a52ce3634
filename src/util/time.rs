// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Time-related utility functions.

use chrono::{
    format::{parse, Parsed, StrftimeItems},
    NaiveDate, TimeDelta,
};
use float_eq::float_eq;

/// Number of nanoseconds per second.
const NANOSECONDS_PER_SECOND: f64 = 1_000_000_000.0;

/// Indicates that a value can be represent a duration as a formatted string.
pub trait FormattedDuration {
    /// Format the duration as a string, either in the form `M:SS` or `H:MM:SS`.
    fn formatted_duration(&self) -> String;
}

impl FormattedDuration for TimeDelta {
    fn formatted_duration(&self) -> String {
        let hours = self.num_hours();
        let minutes = self.num_minutes() - hours * 60;
        let seconds = self.num_seconds() - hours * 60 * 60 - minutes * 60;
        if hours > 0 {
            format!("{hours}:{minutes:02}:{seconds:02}")
        } else {
            format!("{minutes}:{seconds:02}")
        }
    }
}

/// Build a duration from whole seconds and a fractional second in `[0, 1)`.
pub fn duration_from_parts(seconds: u64, frac: f64) -> Option<TimeDelta> {
    i64::try_from(seconds)
        .ok()
        .zip(f64_to_u32((frac * NANOSECONDS_PER_SECOND).trunc()))
        .and_then(|(secs, nanos)| TimeDelta::new(secs, nanos))
}

/// Build a duration from a sample count at the given sample rate.
pub fn duration_from_samples(samples: u64, sample_rate: u32) -> Option<TimeDelta> {
    if sample_rate == 0 {
        return None;
    }

    let rate = u64::from(sample_rate);
    let remainder = samples % rate;
    let nanos = u32::try_from(remainder * 1_000_000_000 / rate).ok()?;
    TimeDelta::new(i64::try_from(samples / rate).ok()?, nanos)
}

/// Convert an `f64` to `u32` (if possible).
#[expect(clippy::cast_sign_loss)]
#[expect(clippy::cast_possible_truncation)]
fn f64_to_u32(value: f64) -> Option<u32> {
    let intvalue = value as u32;
    if float_eq!(f64::from(intvalue), value, abs <= 0.000_1) {
        Some(intvalue)
    } else {
        None
    }
}

/// Allowed date formats (as specified in a tag field).
const PARTIAL_DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y-%m", "%Y%m%d", "%Y%m", "%Y"];

/// Parse a date from a [`str`] slice by trying various common formats.
fn parse_partial_date_from_str(value: impl AsRef<str>) -> Option<NaiveDate> {
    for fmt in PARTIAL_DATE_FORMATS {
        let mut parsed = Parsed::new();
        if parse(&mut parsed, value.as_ref(), StrftimeItems::new(fmt)).is_err() {
            continue;
        }

        if let Some(date) = parsed
            .year()
            .map(|year| {
                parsed
                    .month
                    .map_or((year, 1, 1), |month| (year, month, parsed.day.unwrap_or(1)))
            })
            .and_then(|(year, month, day)| NaiveDate::from_ymd_opt(year, month, day))
        {
            return Some(date);
        }
    }

    None
}

/// Parse the year from a [`str`] slice and return a [`String`] if found.
pub fn parse_year_from_str(value: &str) -> Option<String> {
    parse_partial_date_from_str(value.trim()).map(|date| date.format("%Y").to_string())
}
