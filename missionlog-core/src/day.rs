//! Calendar-day normalization.
//!
//! Every date that reaches the ledger or the aggregator is reduced to one
//! canonical [`NaiveDate`] in the deployment's reference offset. Date-only
//! strings are taken as that calendar day as written; they are never routed
//! through a UTC-midnight instant, which would shift them a day for offsets
//! west of UTC.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime};

use crate::clock::Clock;
use crate::error::{Error, Result};

pub const MIN_YEAR: i32 = 1970;
pub const MAX_YEAR: i32 = 2100;

const LOCAL_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Resolve an optional date parameter to its canonical day, defaulting to
/// the clock's today.
pub fn normalize_day(input: Option<&str>, clock: &dyn Clock) -> Result<NaiveDate> {
    match input.map(str::trim) {
        None | Some("") => Ok(clock.today()),
        Some(raw) => parse_day(raw, clock.offset()),
    }
}

/// Like [`normalize_day`] but keeps "not supplied" distinct.
pub fn parse_optional_day(input: Option<&str>, offset: FixedOffset) -> Result<Option<NaiveDate>> {
    match input.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_day(raw, offset).map(Some),
    }
}

pub fn parse_day(raw: &str, offset: FixedOffset) -> Result<NaiveDate> {
    let raw = raw.trim();
    let day = if is_date_only(raw) {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    } else if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        Some(instant.with_timezone(&offset).date_naive())
    } else {
        // No offset given: already local wall time.
        LOCAL_TIMESTAMP_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(|local| local.date())
    };

    let day = day.ok_or_else(|| Error::invalid("Invalid date format"))?;
    check_bounds(day)
}

pub(crate) fn check_bounds(day: NaiveDate) -> Result<NaiveDate> {
    if day.year() < MIN_YEAR || day.year() > MAX_YEAR {
        return Err(Error::invalid(format!(
            "Date must be between {} and {}",
            MIN_YEAR, MAX_YEAR
        )));
    }
    Ok(day)
}

fn is_date_only(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// `YYYY-MM-DD` form used in responses and storage.
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Every day from `start` to `end`, both included. Empty when `start > end`.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn offset(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    #[test]
    fn date_only_is_the_written_calendar_day() {
        // West of UTC a UTC-midnight parse would land on March 9.
        assert_eq!(parse_day("2025-03-10", offset(-8)).unwrap(), ymd(2025, 3, 10));
        assert_eq!(parse_day("2025-03-10", offset(9)).unwrap(), ymd(2025, 3, 10));
    }

    #[test]
    fn timestamps_truncate_to_the_local_day() {
        let local = offset(2);
        assert_eq!(
            parse_day("2025-03-10T23:59:59+02:00", local).unwrap(),
            ymd(2025, 3, 10)
        );
        // 22:30 UTC is already the 11th at +02:00.
        assert_eq!(
            parse_day("2025-03-10T22:30:00Z", local).unwrap(),
            ymd(2025, 3, 11)
        );
        assert_eq!(
            parse_day("2025-03-10T00:00:00.000Z", offset(-5)).unwrap(),
            ymd(2025, 3, 9)
        );
    }

    #[test]
    fn offsetless_timestamps_are_local_wall_time() {
        assert_eq!(
            parse_day("2025-03-10T23:59:59", offset(-8)).unwrap(),
            ymd(2025, 3, 10)
        );
        assert_eq!(
            parse_day("2025-03-10 06:15:00.250", offset(5)).unwrap(),
            ymd(2025, 3, 10)
        );
    }

    #[test]
    fn rejects_garbage_and_impossible_dates() {
        for raw in ["", "tomorrow", "2025-02-30", "2025/03/10", "2025-3-10"] {
            let err = parse_day(raw, offset(0)).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "{raw} should be invalid");
        }
    }

    #[test]
    fn rejects_years_outside_bounds() {
        assert!(parse_day("1969-12-31", offset(0)).is_err());
        assert!(parse_day("2101-01-01", offset(0)).is_err());
        assert!(parse_day("1970-01-01", offset(0)).is_ok());
        assert!(parse_day("2100-12-31", offset(0)).is_ok());
    }

    #[test]
    fn missing_input_defaults_to_clock_today() {
        let clock = FixedClock::at_day(ymd(2025, 6, 1), offset(-3));
        assert_eq!(normalize_day(None, &clock).unwrap(), ymd(2025, 6, 1));
        assert_eq!(normalize_day(Some("  "), &clock).unwrap(), ymd(2025, 6, 1));
        assert_eq!(parse_optional_day(None, offset(0)).unwrap(), None);
    }

    #[test]
    fn inclusive_day_iteration() {
        let days: Vec<_> = days_inclusive(ymd(2025, 2, 27), ymd(2025, 3, 2)).collect();
        assert_eq!(days.len(), 4);
        assert_eq!(days[3], ymd(2025, 3, 2));
        assert_eq!(days_inclusive(ymd(2025, 3, 2), ymd(2025, 3, 1)).count(), 0);
        assert_eq!(day_key(ymd(2025, 3, 2)), "2025-03-02");
    }
}
