//! Cross-dataset statistics.
//!
//! Recomputed from the full collection on every call; nothing is cached.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::classify::TrafficLevel;
use crate::dataset::Dataset;

/// Aggregate figures over every stored dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Number of datasets.
    pub total_datasets: usize,
    /// Number of distinct location strings.
    pub total_locations: usize,
    /// Sum of every dataset's `total_vehicles`, saturating at `u64::MAX`.
    pub total_vehicles: u64,
    /// Dataset count per classification; every level is present.
    pub by_condition: BTreeMap<TrafficLevel, usize>,
}

impl Stats {
    /// Number of datasets with the given classification.
    #[must_use]
    pub fn count_for(&self, level: TrafficLevel) -> usize {
        self.by_condition.get(&level).copied().unwrap_or(0)
    }
}

/// Compute [`Stats`] over `datasets`.
#[must_use]
pub fn compute_stats(datasets: &[Dataset]) -> Stats {
    let mut by_condition: BTreeMap<TrafficLevel, usize> =
        TrafficLevel::ALL.into_iter().map(|level| (level, 0)).collect();
    for dataset in datasets {
        *by_condition.entry(dataset.classification).or_default() += 1;
    }

    let locations: HashSet<&str> = datasets.iter().map(|d| d.location.as_str()).collect();

    Stats {
        total_datasets: datasets.len(),
        total_locations: locations.len(),
        total_vehicles: datasets
            .iter()
            .fold(0u64, |acc, d| acc.saturating_add(d.total_vehicles)),
        by_condition,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::draft;
    use chrono::Utc;

    fn dataset(id: &str, location: &str, counts: &[u64]) -> Dataset {
        Dataset::from_draft(draft(location, counts), id.to_string(), Utc::now())
    }

    #[test]
    fn test_empty_collection() {
        let stats = compute_stats(&[]);
        assert_eq!(stats.total_datasets, 0);
        assert_eq!(stats.total_locations, 0);
        assert_eq!(stats.total_vehicles, 0);
        assert_eq!(stats.by_condition.len(), 4);
        assert!(stats.by_condition.values().all(|c| *c == 0));
    }

    #[test]
    fn test_severe_and_free_flowing_at_two_locations() {
        let datasets = vec![
            dataset("ds_1", "Jalan Sudirman", &[600, 700]),
            dataset("ds_2", "Jalan Thamrin", &[20, 40]),
        ];
        let stats = compute_stats(&datasets);

        assert_eq!(stats.total_datasets, 2);
        assert_eq!(stats.total_locations, 2);
        assert_eq!(stats.total_vehicles, 1360);
        assert_eq!(stats.count_for(TrafficLevel::SevereCongestion), 1);
        assert_eq!(stats.count_for(TrafficLevel::FreeFlowing), 1);
        assert_eq!(stats.count_for(TrafficLevel::Congested), 0);
        assert_eq!(stats.count_for(TrafficLevel::Moderate), 0);
    }

    #[test]
    fn test_repeated_location_counted_once() {
        let datasets = vec![
            dataset("ds_1", "Jalan Sudirman", &[10]),
            dataset("ds_2", "Jalan Sudirman", &[20]),
            dataset("ds_3", "jalan sudirman", &[30]),
        ];
        let stats = compute_stats(&datasets);
        assert_eq!(stats.total_datasets, 3);
        // distinct by exact string
        assert_eq!(stats.total_locations, 2);
    }

    #[test]
    fn test_total_vehicles_saturates() {
        let datasets = vec![
            dataset("ds_1", "A", &[u64::MAX]),
            dataset("ds_2", "B", &[1]),
        ];
        let stats = compute_stats(&datasets);
        assert_eq!(stats.total_vehicles, u64::MAX);
        assert_eq!(stats.total_datasets, 2);
    }

    #[test]
    fn test_serialized_shape() {
        let stats = compute_stats(&[dataset("ds_1", "A", &[600])]);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalDatasets"], 1);
        assert_eq!(json["totalLocations"], 1);
        assert_eq!(json["totalVehicles"], 600);
        assert_eq!(json["byCondition"]["SEVERE_CONGESTION"], 1);
        assert_eq!(json["byCondition"]["FREE_FLOWING"], 0);
    }
}
