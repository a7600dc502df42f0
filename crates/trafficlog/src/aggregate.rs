//! Dataset aggregation.
//!
//! Turns a researcher's [`DatasetPayload`] into a [`DatasetDraft`] with every
//! derived field filled in. Nothing here touches storage.

use chrono::NaiveDate;

use crate::classify::TrafficLevel;
use crate::dataset::{DatasetDraft, DatasetPayload, IntervalSample};
use crate::error::{Error, Result};
use crate::timegrid;

/// Date format accepted in payloads.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Totals over a sequence of interval counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Sum of the counts.
    pub total: u64,
    /// Mean count, rounded half up.
    pub average: u64,
    /// Largest count.
    pub peak: u64,
}

/// Total, rounded average and peak of `counts`.
///
/// # Errors
///
/// Returns a validation error for an empty slice or when the counts sum past
/// `u64::MAX`.
pub fn summarize(counts: &[u64]) -> Result<Summary> {
    let peak = counts
        .iter()
        .copied()
        .max()
        .ok_or_else(|| Error::validation("samples are missing"))?;
    let total = counts
        .iter()
        .try_fold(0u64, |acc, c| acc.checked_add(*c))
        .ok_or_else(|| Error::validation("vehicle counts too large"))?;
    let n = u64::try_from(counts.len()).map_err(|_| Error::internal("sample count overflow"))?;
    Ok(Summary {
        total,
        average: rounded_mean(total, n),
        peak,
    })
}

/// `round(total / n)` with halves rounded up, in integer arithmetic.
fn rounded_mean(total: u64, n: u64) -> u64 {
    let quotient = total / n;
    let remainder = total % n;
    if remainder >= n - remainder {
        quotient + 1
    } else {
        quotient
    }
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns a validation error for empty or malformed input.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("date is required"));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| Error::validation(format!("date must be YYYY-MM-DD, got {trimmed:?}")))
}

/// Validate a payload and compute the derived fields of a dataset.
///
/// # Errors
///
/// Returns a validation error when the location or date is empty, the time
/// grid is invalid, the sample list does not match the grid, or any interval
/// lacks a recorded count.
pub fn aggregate(payload: &DatasetPayload) -> Result<DatasetDraft> {
    let location = payload.location.trim();
    if location.is_empty() {
        return Err(Error::validation("location is required"));
    }
    let date = parse_date(&payload.date)?;
    let start_time = timegrid::parse_time(&payload.start_time)?;

    if payload.interval_minutes == 0 {
        return Err(Error::validation("intervalMinutes must be greater than 0"));
    }
    if payload.interval_count == 0 {
        return Err(Error::validation("intervalCount must be greater than 0"));
    }
    if payload.samples.is_empty() {
        return Err(Error::validation("samples are missing"));
    }
    if payload.samples.len() != payload.interval_count as usize {
        return Err(Error::validation(format!(
            "expected one sample per interval ({}), got {}",
            payload.interval_count,
            payload.samples.len()
        )));
    }

    let time_slots =
        timegrid::slot_labels(start_time, payload.interval_minutes, payload.interval_count);

    let mut samples = Vec::with_capacity(payload.samples.len());
    for (entry, slot) in payload.samples.iter().zip(&time_slots) {
        let Some(vehicle_count) = entry.vehicle_count else {
            return Err(Error::validation(format!(
                "no vehicle count recorded for interval {slot}"
            )));
        };
        let note = match entry.note.as_deref().map(str::trim) {
            Some(note) if !note.is_empty() => note.to_string(),
            _ => TrafficLevel::classify(vehicle_count).note_label(),
        };
        samples.push(IntervalSample {
            vehicle_count,
            note,
        });
    }

    let counts: Vec<u64> = samples.iter().map(|s| s.vehicle_count).collect();
    let summary = summarize(&counts)?;

    Ok(DatasetDraft {
        location: location.to_string(),
        date,
        start_time,
        interval_minutes: payload.interval_minutes,
        interval_count: payload.interval_count,
        time_slots,
        samples,
        total_vehicles: summary.total,
        average_vehicles: summary.average,
        peak_vehicles: summary.peak,
        classification: TrafficLevel::classify(summary.average),
    })
}
