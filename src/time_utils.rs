// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for timestamps, elapsed time and speed.

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;

const MPS_TO_KMH: f64 = 3.6;

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time for ledger records.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Elapsed time truncated to whole seconds.
pub fn whole_seconds(elapsed: Duration) -> u64 {
    elapsed.as_secs()
}

/// Speed in km/h, rounded to two decimals. Zero seconds yields 0.
pub fn speed_kmh(distance_meters: f64, seconds: u64) -> f64 {
    if seconds == 0 {
        return 0.0;
    }
    round_hundredths(distance_meters / seconds as f64 * MPS_TO_KMH)
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
