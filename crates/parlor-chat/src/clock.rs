// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamp helpers matching the storage layer's RFC 3339 format.
//!
//! SQLite stamps rows with `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')`; these
//! helpers produce the identical millisecond format so stamps from either
//! source compare correctly as strings.

use chrono::{Duration, Utc};

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Current UTC time as an RFC 3339 string with millisecond precision.
pub fn now() -> String {
    Utc::now().format(FORMAT).to_string()
}

/// UTC time `secs` seconds in the past.
pub fn secs_ago(secs: u64) -> String {
    (Utc::now() - Duration::seconds(secs as i64))
        .format(FORMAT)
        .to_string()
}

/// UTC time `days` days in the past.
pub fn days_ago(days: u32) -> String {
    (Utc::now() - Duration::days(i64::from(days)))
        .format(FORMAT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_matches_sqlite_format() {
        let ts = now();
        // e.g. 2026-03-01T12:34:56.789Z
        assert_eq!(ts.len(), 24);
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "T");
        assert_eq!(&ts[19..20], ".");
    }

    #[test]
    fn cutoffs_sort_before_now() {
        assert!(secs_ago(60) < now());
        assert!(days_ago(30) < secs_ago(60));
    }
}
