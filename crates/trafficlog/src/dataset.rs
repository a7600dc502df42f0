//! Core dataset types for trafficlog.
//!
//! A [`Dataset`] is one saved survey session: where and when the counts were
//! taken, the time grid, one [`IntervalSample`] per slot, and the statistics
//! derived from them. Field names serialize in camelCase, which is also the
//! on-disk layout of the JSON store.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::TrafficLevel;
use crate::error::{Error, Result};

/// One measured time slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalSample {
    /// Vehicles observed during the interval.
    pub vehicle_count: u64,
    /// Free-text annotation.
    #[serde(default)]
    pub note: String,
}

/// A dataset whose derived fields are computed but which has not been stored.
///
/// Produced by [`crate::aggregate::aggregate`]; the store turns it into a
/// [`Dataset`] by assigning an id and creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetDraft {
    /// Place name.
    pub location: String,
    /// Calendar date of the survey.
    pub date: NaiveDate,
    /// Start of the first slot.
    #[serde(with = "crate::timegrid::hhmm")]
    pub start_time: NaiveTime,
    /// Length of each slot.
    pub interval_minutes: u32,
    /// Number of slots.
    pub interval_count: u32,
    /// `"HH:MM-HH:MM"` slot labels, index-aligned with `samples`.
    pub time_slots: Vec<String>,
    /// One sample per slot.
    pub samples: Vec<IntervalSample>,
    /// Sum of all sample counts.
    pub total_vehicles: u64,
    /// Rounded mean count per slot.
    pub average_vehicles: u64,
    /// Highest sample count.
    pub peak_vehicles: u64,
    /// Level derived from `average_vehicles`.
    pub classification: TrafficLevel,
}

/// One persisted survey session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    /// Unique identifier assigned by the store.
    pub id: String,
    /// Place name.
    pub location: String,
    /// Calendar date of the survey.
    pub date: NaiveDate,
    /// Start of the first slot.
    #[serde(with = "crate::timegrid::hhmm")]
    pub start_time: NaiveTime,
    /// Length of each slot.
    pub interval_minutes: u32,
    /// Number of slots.
    pub interval_count: u32,
    /// `"HH:MM-HH:MM"` slot labels, index-aligned with `samples`.
    pub time_slots: Vec<String>,
    /// One sample per slot.
    pub samples: Vec<IntervalSample>,
    /// Sum of all sample counts.
    pub total_vehicles: u64,
    /// Rounded mean count per slot.
    pub average_vehicles: u64,
    /// Highest sample count.
    pub peak_vehicles: u64,
    /// Level derived from `average_vehicles`.
    pub classification: TrafficLevel,
    /// When the dataset was persisted.
    pub created_at: DateTime<Utc>,
}

/// The busiest slot of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakInfo {
    /// Slot index.
    pub index: usize,
    /// Slot label.
    pub time_slot: String,
    /// Vehicles counted in that slot.
    pub vehicle_count: u64,
    /// The slot's note.
    pub note: String,
}

impl Dataset {
    /// Attach an id and creation time to a draft.
    #[must_use]
    pub fn from_draft(draft: DatasetDraft, id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            location: draft.location,
            date: draft.date,
            start_time: draft.start_time,
            interval_minutes: draft.interval_minutes,
            interval_count: draft.interval_count,
            time_slots: draft.time_slots,
            samples: draft.samples,
            total_vehicles: draft.total_vehicles,
            average_vehicles: draft.average_vehicles,
            peak_vehicles: draft.peak_vehicles,
            classification: draft.classification,
            created_at,
        }
    }

    /// The first slot holding the highest count, if the dataset has any slot.
    #[must_use]
    pub fn peak(&self) -> Option<PeakInfo> {
        let mut best: Option<(usize, &IntervalSample)> = None;
        for (index, sample) in self.samples.iter().enumerate() {
            if best.map_or(true, |(_, b)| sample.vehicle_count > b.vehicle_count) {
                best = Some((index, sample));
            }
        }
        best.map(|(index, sample)| PeakInfo {
            index,
            time_slot: self.time_slots.get(index).cloned().unwrap_or_default(),
            vehicle_count: sample.vehicle_count,
            note: sample.note.clone(),
        })
    }

    /// Per-slot congestion level, index-aligned with `samples`.
    #[must_use]
    pub fn slot_levels(&self) -> Vec<TrafficLevel> {
        self.samples
            .iter()
            .map(|s| TrafficLevel::classify(s.vehicle_count))
            .collect()
    }
}

/// One interval as submitted by a researcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SampleEntry {
    /// Counted vehicles; `None` when the interval was left blank.
    pub vehicle_count: Option<u64>,
    /// Optional annotation; filled from the classification when empty.
    pub note: Option<String>,
}

impl SampleEntry {
    /// A recorded count without a note.
    #[must_use]
    pub fn count(vehicle_count: u64) -> Self {
        Self {
            vehicle_count: Some(vehicle_count),
            note: None,
        }
    }
}

/// A dataset submission, before validation and aggregation.
///
/// Every field defaults to empty so that missing input surfaces as a
/// validation error naming the field rather than a parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatasetPayload {
    /// Place name.
    pub location: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM`.
    pub start_time: String,
    /// Slot length in minutes.
    pub interval_minutes: u32,
    /// Number of slots.
    pub interval_count: u32,
    /// One entry per slot.
    pub samples: Vec<SampleEntry>,
}

impl DatasetPayload {
    /// Parse a payload from JSON.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the JSON is malformed or a field has the
    /// wrong type (for example a negative vehicle count).
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input)
            .map_err(|e| Error::validation(format!("malformed dataset payload: {e}")))
    }
}
