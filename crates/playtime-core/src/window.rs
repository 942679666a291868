//! Time window evaluation.
//!
//! Pure functions shared by every rule: the start of a trailing usage window,
//! and whether an instant falls inside a restricted local-hour range.
//!
//! Hour-of-day checks fail open. A timezone that cannot be resolved is logged
//! and treated as "not restricted" so that a configuration mistake never locks
//! a child out of all content.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::CoreError;

/// Start of the trailing window of `interval_seconds` ending at `now`.
///
/// Intervals too large to represent saturate to the earliest instant.
#[must_use]
pub fn window_start(now: DateTime<Utc>, interval_seconds: u64) -> DateTime<Utc> {
    i64::try_from(interval_seconds)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .and_then(|interval| now.checked_sub_signed(interval))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Resolve the local hour (0–23) of `now` in an IANA timezone.
///
/// # Errors
///
/// Returns `CoreError::InvalidTimeZone` if the name is not a known zone.
pub fn local_hour(now: DateTime<Utc>, time_zone: &str) -> Result<u32, CoreError> {
    let tz: Tz = time_zone
        .parse()
        .map_err(|_| CoreError::InvalidTimeZone(time_zone.to_string()))?;
    Ok(now.with_timezone(&tz).hour())
}

/// Whether `hour` lies in `[start, end)`, wrapping past midnight when
/// `start > end`. An empty range (`start == end`) contains no hour.
#[must_use]
pub fn hour_in_range(hour: u32, start: u8, end: u8) -> bool {
    let (start, end) = (u32::from(start), u32::from(end));
    if start < end {
        hour >= start && hour < end
    } else if start > end {
        hour >= start || hour < end
    } else {
        false
    }
}

/// Whether `now` falls inside the restricted hours `start..end` in `time_zone`.
///
/// Missing bounds or `start == end` mean no restriction. Timezone errors fail
/// open.
#[must_use]
pub fn is_within_restricted_hours(
    now: DateTime<Utc>,
    time_zone: &str,
    start: Option<u8>,
    end: Option<u8>,
) -> bool {
    let (Some(start), Some(end)) = (start, end) else {
        return false;
    };
    if start == end {
        return false;
    }

    match local_hour(now, time_zone) {
        Ok(hour) => hour_in_range(hour, start, end),
        Err(e) => {
            tracing::warn!(
                time_zone = %time_zone,
                error = %e,
                "Could not resolve local hour, skipping restricted hours check"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, h, m, 0).unwrap()
    }

    #[test]
    fn window_start_subtracts_interval() {
        assert_eq!(window_start(utc(12, 0), 3600), utc(11, 0));
    }

    #[test]
    fn window_start_saturates() {
        assert_eq!(window_start(utc(12, 0), u64::MAX), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn wrapping_range_blocks_late_and_early_hours() {
        assert!(is_within_restricted_hours(utc(23, 0), "UTC", Some(22), Some(6)));
        assert!(is_within_restricted_hours(utc(2, 0), "UTC", Some(22), Some(6)));
        assert!(!is_within_restricted_hours(utc(10, 0), "UTC", Some(22), Some(6)));
    }

    #[test]
    fn plain_range_is_half_open() {
        assert!(is_within_restricted_hours(utc(13, 0), "UTC", Some(13), Some(15)));
        assert!(is_within_restricted_hours(utc(14, 59), "UTC", Some(13), Some(15)));
        assert!(!is_within_restricted_hours(utc(15, 0), "UTC", Some(13), Some(15)));
    }

    #[test]
    fn missing_bound_never_restricts() {
        assert!(!is_within_restricted_hours(utc(23, 0), "UTC", Some(22), None));
        assert!(!is_within_restricted_hours(utc(23, 0), "UTC", None, Some(6)));
    }

    #[test]
    fn local_hour_uses_time_zone() {
        // 03:00 UTC in January is 22:00 the previous day in New York (EST).
        assert_eq!(local_hour(utc(3, 0), "America/New_York").unwrap(), 22);
        assert!(is_within_restricted_hours(
            utc(3, 0),
            "America/New_York",
            Some(21),
            Some(7)
        ));
    }

    #[test]
    fn unknown_time_zone_fails_open() {
        assert!(local_hour(utc(23, 0), "Not/AZone").is_err());
        assert!(!is_within_restricted_hours(utc(23, 0), "Not/AZone", Some(22), Some(6)));
    }

    proptest! {
        #[test]
        fn equal_bounds_never_restrict(hour in 0u32..24, bound in 0u8..24) {
            prop_assert!(!is_within_restricted_hours(utc(hour, 30), "UTC", Some(bound), Some(bound)));
        }

        #[test]
        fn wrapped_range_is_complement_of_plain_range(hour in 0u32..24, a in 0u8..24, b in 0u8..24) {
            prop_assume!(a < b);
            prop_assert_eq!(hour_in_range(hour, b, a), !hour_in_range(hour, a, b));
        }
    }
}
