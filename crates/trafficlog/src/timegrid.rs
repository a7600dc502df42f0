//! Time-of-day grid for survey intervals.
//!
//! Surveys start at an `HH:MM` time of day and are split into equal
//! intervals. Slot boundaries wrap around midnight.

use chrono::{Duration, NaiveTime};

use crate::error::{Error, Result};

/// Format used for start times and slot labels.
pub const TIME_FORMAT: &str = "%H:%M";

const MINUTES_PER_DAY: u64 = 24 * 60;

/// Parse an `HH:MM` time of day.
///
/// # Errors
///
/// Returns a validation error if the input is empty or not a valid time.
pub fn parse_time(input: &str) -> Result<NaiveTime> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("startTime is required"));
    }
    NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
        .map_err(|_| Error::validation(format!("startTime must be HH:MM, got {trimmed:?}")))
}

/// Format a time of day as `HH:MM`.
#[must_use]
pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Time of day `offset_minutes` after `start`, wrapping past midnight.
#[must_use]
pub fn offset(start: NaiveTime, offset_minutes: u64) -> NaiveTime {
    let wrapped = offset_minutes % MINUTES_PER_DAY;
    // wrapped < 1440, so the conversion cannot fail
    let minutes = i64::try_from(wrapped).unwrap_or_default();
    start + Duration::minutes(minutes)
}

/// Labels of the form `"HH:MM-HH:MM"` for `count` consecutive slots of
/// `interval_minutes` each, starting at `start`.
#[must_use]
pub fn slot_labels(start: NaiveTime, interval_minutes: u32, count: u32) -> Vec<String> {
    let step = u64::from(interval_minutes);
    (0..u64::from(count))
        .map(|i| {
            let from = offset(start, i * step);
            let to = offset(start, (i + 1) * step);
            format!("{}-{}", format_time(from), format_time(to))
        })
        .collect()
}

/// Serde adapter storing a [`NaiveTime`] as `HH:MM`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as `HH:MM`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_time(*time))
    }

    /// Deserialize from `HH:MM`.
    ///
    /// # Errors
    ///
    /// Fails when the string is not a valid `HH:MM` time.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        parse_time(s).unwrap()
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(t("07:00"), NaiveTime::from_hms_opt(7, 0, 0).unwrap());
        assert_eq!(t(" 23:59 "), NaiveTime::from_hms_opt(23, 59, 0).unwrap());
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        assert!(parse_time("").unwrap_err().is_validation());
        assert!(parse_time("25:00").unwrap_err().is_validation());
        assert!(parse_time("seven").unwrap_err().is_validation());
    }

    #[test]
    fn test_slot_labels() {
        let labels = slot_labels(t("07:00"), 10, 3);
        assert_eq!(labels, vec!["07:00-07:10", "07:10-07:20", "07:20-07:30"]);
    }

    #[test]
    fn test_slot_labels_wrap_past_midnight() {
        let labels = slot_labels(t("23:40"), 15, 3);
        assert_eq!(labels, vec!["23:40-23:55", "23:55-00:10", "00:10-00:25"]);
    }

    #[test]
    fn test_offset_wraps_full_days() {
        assert_eq!(offset(t("06:30"), 24 * 60), t("06:30"));
        assert_eq!(offset(t("06:30"), 3 * 24 * 60 + 45), t("07:15"));
    }

    #[test]
    fn test_slot_labels_empty_for_zero_count() {
        assert!(slot_labels(t("07:00"), 10, 0).is_empty());
    }
}
