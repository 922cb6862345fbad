//! Conversion of Gogs unix timestamps.

use chrono::DateTime;

/// Gogs stores this value as the deadline when none was set.
const NO_DEADLINE_SENTINEL: i64 = 253_402_210_800;

const GITHUB_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const HUMAN_FORMAT: &str = "%A %d %B %Y at %H:%M:%S";

/// Formats a unix timestamp as GitHub expects it (`YYYY-MM-DDTHH:MM:SSZ`).
///
/// Returns `None` for unset (zero or negative) timestamps and for the Gogs
/// "no deadline" sentinel.
#[must_use]
pub fn unix_to_github_time(unix: i64) -> Option<String> {
    format_unix(unix, GITHUB_FORMAT)
}

/// Formats a unix timestamp for display in migrated bodies, e.g.
/// `Tuesday 01 March 2016 at 12:00:00`.
#[must_use]
pub fn unix_to_human_time(unix: i64) -> Option<String> {
    format_unix(unix, HUMAN_FORMAT)
}

fn format_unix(unix: i64, format: &str) -> Option<String> {
    if unix <= 0 || unix >= NO_DEADLINE_SENTINEL {
        return None;
    }
    DateTime::from_timestamp(unix, 0).map(|t| t.format(format).to_string())
}
