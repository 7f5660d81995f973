//! Time and Timezone Utilities Module
//!
//! Parsing for the simulated date-time inputs, timezone resolution for the
//! session, and formatting for the status bar.

use chrono::{DateTime, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;
use iana_time_zone::get_timezone;
use std::sync::OnceLock;
use tzf_rs::DefaultFinder;

use crate::error::{Result, TwinError};

// tzf-rs DefaultFinder is pre-compiled and very fast
static TZF_FINDER: OnceLock<DefaultFinder> = OnceLock::new();

/// Layouts accepted by the date-time field. The first one is what a browser
/// `datetime-local` input produces.
const DATETIME_LOCAL_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

// ===================== TIME PARSING =====================

/// Parse a time string in HH:MM[:SS[.fffffffff]] format.
///
/// # Returns
/// Tuple of (hours, minutes, seconds, nanoseconds)
pub fn parse_time_ns(s: &str) -> Result<(u32, u32, u32, u32)> {
    let formats = ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];

    for fmt in formats {
        if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
            return Ok((t.hour(), t.minute(), t.second(), t.nanosecond()));
        }
    }
    Err(TwinError::InvalidTime(s.to_string()))
}

/// Parse the value of a `datetime-local` style field (`YYYY-MM-DDTHH:MM`) in
/// the given time zone.
pub fn parse_datetime_local(s: &str, tz: Tz) -> Result<DateTime<Tz>> {
    let trimmed = s.trim();
    let naive = DATETIME_LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| TwinError::InvalidDateTime(s.to_string()))?;
    resolve_local(tz, naive)
}

/// Resolve a wall-clock time against a time zone exactly once.
///
/// Ambiguous times (fall back) resolve to the earlier instant; times inside a
/// DST gap are an error.
pub fn resolve_local(tz: Tz, naive: NaiveDateTime) -> Result<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => Ok(t),
        LocalResult::Ambiguous(t1, t2) => {
            log::warn!(
                "Time {} is ambiguous (DST transition). Using early option: {} (vs {})",
                naive,
                t1.format("%H:%M:%S %Z"),
                t2.format("%H:%M:%S %Z")
            );
            Ok(t1)
        }
        LocalResult::None => Err(TwinError::NonexistentLocalTime(naive.to_string(), tz.to_string())),
    }
}

// ===================== TIMEZONE UTILITIES =====================

/// Get the system's configured timezone, falling back to UTC.
pub fn system_timezone() -> Tz {
    get_timezone().ok().and_then(|s| s.parse().ok()).unwrap_or(Tz::UTC)
}

/// Resolve timezone from geographic coordinates, or UTC if resolution fails.
pub fn resolve_timezone(lon: f64, lat: f64) -> Tz {
    let finder = TZF_FINDER.get_or_init(DefaultFinder::new);
    let tzid = finder.get_tz_name(lon, lat);
    tzid.parse::<Tz>().unwrap_or(Tz::UTC)
}

/// Pick the session time zone from a CLI selector ("system", "location", or
/// an IANA name). Unknown names fall back to UTC.
pub fn select_timezone(selector: &str, lon: f64, lat: f64) -> Tz {
    match selector {
        "system" => system_timezone(),
        "location" => resolve_timezone(lon, lat),
        other => other.parse().unwrap_or_else(|_| {
            log::warn!("Unknown time zone '{}', using UTC", other);
            Tz::UTC
        }),
    }
}

// ===================== FORMATTING =====================

/// Format a duration in seconds as "Xh Ym Zs".
pub fn format_hms(seconds: i64) -> String {
    let total_seconds = seconds.abs();
    if total_seconds == 0 {
        return "0s".to_string();
    }

    let h = total_seconds / 3600;
    let m = (total_seconds % 3600) / 60;
    let s = total_seconds % 60;

    let mut parts = Vec::new();
    if h > 0 {
        parts.push(format!("{}h", h));
    }
    if m > 0 {
        parts.push(format!("{}m", m));
    }
    if s > 0 {
        parts.push(format!("{}s", s));
    }

    parts.join(" ")
}

/// Status bar rendering of the simulated time, e.g. "Mar 20, 07:06 AM".
pub fn format_status_time(dt: &DateTime<Tz>) -> String {
    dt.format("%b %-d, %I:%M %p").to_string()
}

/// Inverse of [`parse_datetime_local`]: the value shown in the date-time field.
pub fn format_datetime_local(dt: &DateTime<Tz>) -> String {
    dt.format("%Y-%m-%dT%H:%M").to_string()
}

// ===================== TESTS =====================
