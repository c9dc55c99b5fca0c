//! Departure-relative time arithmetic.
//!
//! Route durations are fractional minutes. ETAs are carried as UTC instants
//! and only formatted to strings at the API boundary.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Add a fractional number of minutes to an instant.
///
/// Precision is one millisecond.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use stop_server::domain::add_minutes;
///
/// let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
/// let eta = add_minutes(start, 90.5);
/// assert_eq!(eta, Utc.with_ymd_and_hms(2024, 5, 1, 1, 30, 30).unwrap());
/// ```
pub fn add_minutes(base: DateTime<Utc>, minutes: f64) -> DateTime<Utc> {
    if !minutes.is_finite() {
        return base;
    }
    base + Duration::milliseconds((minutes * 60_000.0).round() as i64)
}

/// Minutes elapsed from `start` to `end` (negative if `end` is earlier).
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 60_000.0
}

/// Format an instant as RFC 3339 UTC with millisecond precision.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use stop_server::domain::format_iso;
///
/// let t = Utc.with_ymd_and_hms(2024, 5, 1, 2, 30, 0).unwrap();
/// assert_eq!(format_iso(t), "2024-05-01T02:30:00.000Z");
/// ```
pub fn format_iso(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 timestamp with any offset into UTC.
pub fn parse_iso(input: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(input.trim()).map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn add_whole_minutes() {
        assert_eq!(
            add_minutes(start(), 240.0),
            Utc.with_ymd_and_hms(2024, 5, 1, 4, 0, 0).unwrap()
        );
    }

    #[test]
    fn add_non_finite_is_identity() {
        assert_eq!(add_minutes(start(), f64::NAN), start());
        assert_eq!(add_minutes(start(), f64::INFINITY), start());
    }

    #[test]
    fn minutes_between_round_trips_add() {
        let eta = add_minutes(start(), 123.4);
        assert!((minutes_between(start(), eta) - 123.4).abs() < 1e-6);
    }

    #[test]
    fn minutes_between_negative() {
        let earlier = Utc.with_ymd_and_hms(2024, 4, 30, 23, 0, 0).unwrap();
        assert_eq!(minutes_between(start(), earlier), -60.0);
    }

    #[test]
    fn parse_with_offset_normalizes_to_utc() {
        let t = parse_iso("2024-05-01T09:00:00+09:00").unwrap();
        assert_eq!(t, start());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_iso("tomorrow morning").is_err());
        assert!(parse_iso("2024-05-01").is_err());
    }

    #[test]
    fn format_uses_z_suffix() {
        assert_eq!(format_iso(start()), "2024-05-01T00:00:00.000Z");
    }
}
