//! Storage layer for trafficlog.
//!
//! [`DatasetStore`] is the single source of truth for saved datasets. Three
//! backends implement it:
//!
//! - [`JsonFileStore`]: the whole collection in one JSON document, rewritten
//!   on every mutation.
//! - [`SqliteStore`]: one row per dataset in a `SQLite` database.
//! - [`MemoryStore`]: nothing persisted; used in tests.
//!
//! Writers are not serialized against each other across processes; the last
//! write wins.

pub mod json;
pub mod memory;
pub mod schema;
pub mod sqlite;

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::{Config, StorageBackend};
use crate::dataset::{Dataset, DatasetDraft};
use crate::error::{Error, Result};

pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Prefix of every dataset id.
pub const ID_PREFIX: &str = "ds_";

/// Persistence for datasets.
///
/// Implementations own the canonical copy of each dataset and hand out
/// clones only.
pub trait DatasetStore: std::fmt::Debug {
    /// Short backend name for logging.
    fn backend_name(&self) -> &'static str;

    /// Persist a draft, assigning its id and creation time.
    ///
    /// Returns the assigned id.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the collection cannot be read or written.
    /// Nothing is persisted on failure.
    fn insert(&mut self, draft: DatasetDraft) -> Result<String>;

    /// Snapshot of every stored dataset, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the collection cannot be read.
    fn list(&self) -> Result<Vec<Dataset>>;

    /// Fetch one dataset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no dataset has this id, or a storage
    /// error if the collection cannot be read.
    fn get(&self, id: &str) -> Result<Dataset>;

    /// Remove one dataset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no dataset has this id, or a storage
    /// error if the collection cannot be read or written.
    fn delete(&mut self, id: &str) -> Result<()>;
}

/// Pick a fresh id for a dataset created at `now`.
///
/// Ids are `ds_<unix millis>`; when that is already taken a numeric suffix
/// is appended until `is_taken` reports a free id.
///
/// # Errors
///
/// Propagates errors from `is_taken`.
pub fn assign_id(
    now: DateTime<Utc>,
    mut is_taken: impl FnMut(&str) -> Result<bool>,
) -> Result<String> {
    let base = format!("{ID_PREFIX}{}", now.timestamp_millis());
    if !is_taken(&base)? {
        return Ok(base);
    }
    for n in 1..=u32::MAX {
        let candidate = format!("{base}_{n}");
        if !is_taken(&candidate)? {
            return Ok(candidate);
        }
    }
    Err(Error::internal(format!("no free dataset id for {base}")))
}

/// Open the store selected by the configuration.
///
/// # Errors
///
/// Returns an error if the backing file or database cannot be opened.
pub fn open(config: &Config) -> Result<Box<dyn DatasetStore>> {
    let store: Box<dyn DatasetStore> = match config.storage.backend {
        StorageBackend::Json => Box::new(JsonFileStore::open(config.storage_path())?),
        StorageBackend::Sqlite => Box::new(SqliteStore::open(config.storage_path())?),
        StorageBackend::Memory => Box::new(MemoryStore::new()),
    };
    info!("Using {} dataset store", store.backend_name());
    Ok(store)
}

/// Create the parent directory of `path` if it does not exist.
fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{NaiveDate, NaiveTime};

    use crate::classify::TrafficLevel;
    use crate::dataset::{DatasetDraft, IntervalSample};

    /// A small valid draft for store tests.
    pub fn draft(location: &str, counts: &[u64]) -> DatasetDraft {
        let start = NaiveTime::from_hms_opt(7, 0, 0).unwrap();
        let n = u32::try_from(counts.len()).unwrap();
        let total: u64 = counts.iter().sum();
        let average = if counts.is_empty() {
            0
        } else {
            total / u64::from(n)
        };
        DatasetDraft {
            location: location.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            start_time: start,
            interval_minutes: 10,
            interval_count: n,
            time_slots: crate::timegrid::slot_labels(start, 10, n),
            samples: counts
                .iter()
                .map(|c| IntervalSample {
                    vehicle_count: *c,
                    note: TrafficLevel::classify(*c).note_label(),
                })
                .collect(),
            total_vehicles: total,
            average_vehicles: average,
            peak_vehicles: counts.iter().copied().max().unwrap_or(0),
            classification: TrafficLevel::classify(average),
        }
    }
}
