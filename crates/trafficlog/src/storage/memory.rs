//! In-memory dataset store.

use chrono::Utc;
use tracing::debug;

use super::{assign_id, DatasetStore};
use crate::dataset::{Dataset, DatasetDraft};
use crate::error::{Error, Result};

/// A [`DatasetStore`] that keeps datasets in a `Vec` and persists nothing.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    datasets: Vec<Dataset>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with datasets.
    #[must_use]
    pub fn with_datasets(datasets: Vec<Dataset>) -> Self {
        Self { datasets }
    }
}

impl DatasetStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn insert(&mut self, draft: DatasetDraft) -> Result<String> {
        let now = Utc::now();
        let id = assign_id(now, |candidate| {
            Ok(self.datasets.iter().any(|d| d.id == candidate))
        })?;
        self.datasets
            .push(Dataset::from_draft(draft, id.clone(), now));
        debug!("Inserted dataset {} in memory", id);
        Ok(id)
    }

    fn list(&self) -> Result<Vec<Dataset>> {
        Ok(self.datasets.clone())
    }

    fn get(&self, id: &str) -> Result<Dataset> {
        self.datasets
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found(id))
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        let before = self.datasets.len();
        self.datasets.retain(|d| d.id != id);
        if self.datasets.len() == before {
            return Err(Error::not_found(id));
        }
        Ok(())
    }
}
