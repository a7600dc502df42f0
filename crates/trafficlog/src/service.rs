//! The operations exposed to researchers and the public.
//!
//! [`TrafficService`] ties validation, aggregation, storage, statistics and
//! filtering together over an injected [`DatasetStore`]. It has no notion of
//! who is calling; access control, if any, belongs to the caller.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::aggregate;
use crate::dataset::{Dataset, DatasetPayload};
use crate::error::Result;
use crate::filter::DatasetFilter;
use crate::stats::{compute_stats, Stats};
use crate::storage::{DatasetStore, MemoryStore};

/// Response of the listing operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetList {
    /// Number of datasets returned.
    pub count: usize,
    /// The datasets.
    pub datasets: Vec<Dataset>,
}

impl DatasetList {
    fn new(datasets: Vec<Dataset>) -> Self {
        Self {
            count: datasets.len(),
            datasets,
        }
    }
}

/// Response of [`TrafficService::create_dataset`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedDataset {
    /// Id assigned to the new dataset.
    pub id: String,
}

/// Dataset operations over a store.
#[derive(Debug)]
pub struct TrafficService {
    store: Box<dyn DatasetStore>,
}

impl TrafficService {
    /// Create a service over `store`.
    #[must_use]
    pub fn new(store: Box<dyn DatasetStore>) -> Self {
        Self { store }
    }

    /// A service over a fresh [`MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &dyn DatasetStore {
        self.store.as_ref()
    }

    /// Every stored dataset.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot be read.
    pub fn list_datasets(&self) -> Result<DatasetList> {
        Ok(DatasetList::new(self.store.list()?))
    }

    /// Stored datasets matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot be read.
    pub fn find_datasets(&self, filter: &DatasetFilter) -> Result<DatasetList> {
        let all = self.store.list()?;
        let matched = filter.apply(&all);
        debug!("Filter matched {} of {} datasets", matched.len(), all.len());
        Ok(DatasetList::new(matched))
    }

    /// Validate, aggregate and persist a payload.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the payload is incomplete or malformed,
    /// in which case nothing is stored, or a storage error if the write fails.
    pub fn create_dataset(&mut self, payload: &DatasetPayload) -> Result<CreatedDataset> {
        let draft = aggregate(payload).map_err(|e| {
            warn!("Rejected dataset for {:?}: {}", payload.location, e);
            e
        })?;
        let classification = draft.classification;
        let id = self.store.insert(draft)?;
        info!("Created dataset {} ({})", id, classification);
        Ok(CreatedDataset { id })
    }

    /// Fetch one dataset.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unknown id.
    pub fn get_dataset(&self, id: &str) -> Result<Dataset> {
        self.store.get(id)
    }

    /// Delete one dataset.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unknown id.
    pub fn delete_dataset(&mut self, id: &str) -> Result<()> {
        self.store.delete(id)
    }

    /// Statistics over every stored dataset.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot be read.
    pub fn get_stats(&self) -> Result<Stats> {
        Ok(compute_stats(&self.store.list()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::TrafficLevel;
    use crate::dataset::SampleEntry;
    use crate::storage::JsonFileStore;
    use chrono::NaiveDate;

    fn payload(location: &str, date: &str, counts: &[u64]) -> DatasetPayload {
        DatasetPayload {
            location: location.to_string(),
            date: date.to_string(),
            start_time: "07:00".to_string(),
            interval_minutes: 10,
            interval_count: u32::try_from(counts.len()).unwrap(),
            samples: counts.iter().copied().map(SampleEntry::count).collect(),
        }
    }

    #[test]
    fn test_create_then_get() {
        let mut service = TrafficService::in_memory();
        let created = service
            .create_dataset(&payload("Jalan Sudirman", "2024-01-01", &[100, 400, 600]))
            .unwrap();

        let ds = service.get_dataset(&created.id).unwrap();
        assert_eq!(ds.id, created.id);
        assert_eq!(ds.location, "Jalan Sudirman");
        assert_eq!(ds.total_vehicles, 1100);
        assert_eq!(ds.average_vehicles, 367);
        assert_eq!(ds.peak_vehicles, 600);
        assert_eq!(ds.classification, TrafficLevel::Congested);
        assert_eq!(
            ds.time_slots,
            vec!["07:00-07:10", "07:10-07:20", "07:20-07:30"]
        );
    }

    #[test]
    fn test_invalid_payload_stores_nothing() {
        let mut service = TrafficService::in_memory();

        let err = service
            .create_dataset(&payload("", "2024-01-01", &[1]))
            .unwrap_err();
        assert!(err.is_validation());

        let err = service
            .create_dataset(&payload("Jalan Sudirman", "2024-01-01", &[]))
            .unwrap_err();
        assert!(err.is_validation());

        assert_eq!(service.list_datasets().unwrap().count, 0);
    }

    #[test]
    fn test_delete_twice_is_not_found() {
        let mut service = TrafficService::in_memory();
        let id = service
            .create_dataset(&payload("A", "2024-01-01", &[1]))
            .unwrap()
            .id;

        service.delete_dataset(&id).unwrap();
        assert!(service.delete_dataset(&id).unwrap_err().is_not_found());
        assert!(service.get_dataset(&id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_count_matches() {
        let mut service = TrafficService::in_memory();
        for i in 0..3 {
            service
                .create_dataset(&payload(&format!("Loc {i}"), "2024-01-01", &[i]))
                .unwrap();
        }
        let list = service.list_datasets().unwrap();
        assert_eq!(list.count, 3);
        assert_eq!(list.datasets.len(), 3);
    }

    #[test]
    fn test_find_datasets() {
        let mut service = TrafficService::in_memory();
        service
            .create_dataset(&payload("Jalan Sudirman", "2024-01-01", &[600]))
            .unwrap();
        service
            .create_dataset(&payload("Jalan Thamrin", "2024-01-02", &[10]))
            .unwrap();
        service
            .create_dataset(&payload("Simpang Lima", "2024-01-01", &[10]))
            .unwrap();

        let filter = DatasetFilter::new()
            .with_search_text("jalan")
            .with_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let found = service.find_datasets(&filter).unwrap();
        assert_eq!(found.count, 1);
        assert_eq!(found.datasets[0].location, "Jalan Sudirman");
    }

    #[test]
    fn test_stats_after_create_and_delete() {
        let mut service = TrafficService::in_memory();
        let severe = service
            .create_dataset(&payload("Jalan Sudirman", "2024-01-01", &[600, 700]))
            .unwrap()
            .id;
        service
            .create_dataset(&payload("Jalan Thamrin", "2024-01-01", &[20, 40]))
            .unwrap();

        let stats = service.get_stats().unwrap();
        assert_eq!(stats.total_datasets, 2);
        assert_eq!(stats.total_locations, 2);
        assert_eq!(stats.total_vehicles, 1360);
        assert_eq!(stats.count_for(TrafficLevel::SevereCongestion), 1);
        assert_eq!(stats.count_for(TrafficLevel::FreeFlowing), 1);

        service.delete_dataset(&severe).unwrap();
        let stats = service.get_stats().unwrap();
        assert_eq!(stats.total_datasets, 1);
        assert_eq!(stats.count_for(TrafficLevel::SevereCongestion), 0);
    }

    #[test]
    fn test_end_to_end_over_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datasets.json");

        let id = {
            let mut service = TrafficService::new(Box::new(JsonFileStore::open(&path).unwrap()));
            service
                .create_dataset(&payload("Jalan Sudirman", "2024-01-01", &[100, 400, 600]))
                .unwrap()
                .id
        };

        let mut service = TrafficService::new(Box::new(JsonFileStore::open(&path).unwrap()));
        assert_eq!(service.store().backend_name(), "json");
        assert_eq!(service.get_dataset(&id).unwrap().peak_vehicles, 600);
        service.delete_dataset(&id).unwrap();
        assert_eq!(service.list_datasets().unwrap().count, 0);
    }

    #[test]
    fn test_list_serializes_with_count() {
        let mut service = TrafficService::in_memory();
        service
            .create_dataset(&payload("A", "2024-01-01", &[1]))
            .unwrap();
        let json = serde_json::to_value(service.list_datasets().unwrap()).unwrap();
        assert_eq!(json["count"], 1);
        assert_eq!(json["datasets"][0]["location"], "A");
    }
}
