//! JSON file dataset store.
//!
//! The whole collection lives in one document of the form
//! `{"datasets": [...]}`. Every mutation reads the file, changes the
//! collection in memory and writes it back through a temporary file that is
//! renamed over the original, so a reader sees either the old or the new
//! collection and never a partial one.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{assign_id, ensure_parent_dir, DatasetStore};
use crate::dataset::{Dataset, DatasetDraft};
use crate::error::{Error, Result};

/// On-disk document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Collection {
    #[serde(default)]
    datasets: Vec<Dataset>,
}

/// A [`DatasetStore`] backed by a single JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Open the store at `path`, creating an empty collection if the file
    /// does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory or the initial file cannot be
    /// created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_parent_dir(&path)?;

        let store = Self { path };
        if store.path.exists() {
            debug!("Opened dataset file at {}", store.path.display());
        } else {
            store.write(&Collection::default())?;
            info!("Created dataset file at {}", store.path.display());
        }
        Ok(store)
    }

    /// Path to the JSON file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Prefix of the temporary files written next to the store file.
    fn temp_prefix(&self) -> OsString {
        let mut prefix = OsString::from(".");
        if let Some(name) = self.path.file_name() {
            prefix.push(name);
        }
        prefix.push(".");
        prefix
    }

    fn read(&self) -> Result<Collection> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Collection::default());
            }
            Err(source) => {
                return Err(Error::StoreRead {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&contents).map_err(|source| Error::StoreDecode {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the file with `collection`.
    ///
    /// Each call writes and syncs its own uniquely named temp file, then
    /// renames it over the store file.
    fn write(&self, collection: &Collection) -> Result<()> {
        let serialized = serde_json::to_vec_pretty(collection)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = tempfile::Builder::new()
            .prefix(&self.temp_prefix())
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|source| Error::StoreWrite {
                path: dir.to_path_buf(),
                source,
            })?;
        let written = temp
            .write_all(&serialized)
            .and_then(|()| temp.as_file().sync_all());
        if let Err(source) = written {
            return Err(Error::StoreWrite {
                path: temp.path().to_path_buf(),
                source,
            });
        }

        temp.persist(&self.path).map_err(|e| Error::StoreWrite {
            path: self.path.clone(),
            source: e.error,
        })?;
        Ok(())
    }
}

impl DatasetStore for JsonFileStore {
    fn backend_name(&self) -> &'static str {
        "json"
    }

    fn insert(&mut self, draft: DatasetDraft) -> Result<String> {
        let mut collection = self.read()?;
        let now = Utc::now();
        let id = assign_id(now, |candidate| {
            Ok(collection.datasets.iter().any(|d| d.id == candidate))
        })?;
        collection
            .datasets
            .push(Dataset::from_draft(draft, id.clone(), now));
        self.write(&collection)?;
        info!(
            "Saved dataset {} ({} total) to {}",
            id,
            collection.datasets.len(),
            self.path.display()
        );
        Ok(id)
    }

    fn list(&self) -> Result<Vec<Dataset>> {
        let collection = self.read()?;
        debug!("Loaded {} datasets", collection.datasets.len());
        Ok(collection.datasets)
    }

    fn get(&self, id: &str) -> Result<Dataset> {
        self.read()?
            .datasets
            .into_iter()
            .find(|d| d.id == id)
            .ok_or_else(|| Error::not_found(id))
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        let mut collection = self.read()?;
        let before = collection.datasets.len();
        collection.datasets.retain(|d| d.id != id);
        if collection.datasets.len() == before {
            return Err(Error::not_found(id));
        }
        self.write(&collection)?;
        info!("Deleted dataset {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::draft;

    fn open_temp() -> (tempfile::TempDir, JsonFileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("datasets.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_creates_empty_collection() {
        let (_dir, store) = open_temp();
        let contents = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["datasets"], serde_json::json!([]));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("datasets.json");
        JsonFileStore::open(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_insert_then_get_round_trip() {
        let (_dir, mut store) = open_temp();
        let d = draft("Jalan Sudirman", &[100, 400, 600]);
        let id = store.insert(d.clone()).unwrap();

        let got = store.get(&id).unwrap();
        assert_eq!(got.id, id);
        assert_eq!(got, Dataset::from_draft(d, id.clone(), got.created_at));
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datasets.json");
        let id = JsonFileStore::open(&path)
            .unwrap()
            .insert(draft("Jalan Thamrin", &[5]))
            .unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get(&id).unwrap().location, "Jalan Thamrin");
    }

    #[test]
    fn test_file_layout_is_camel_case() {
        let (_dir, mut store) = open_temp();
        store.insert(draft("A", &[10, 20])).unwrap();
        let contents = fs::read_to_string(store.path()).unwrap();
        assert!(contents.contains("\"totalVehicles\""));
        assert!(contents.contains("\"timeSlots\""));
        assert!(contents.contains("\"vehicleCount\""));
        assert!(contents.contains("\"createdAt\""));
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let (dir, mut store) = open_temp();
        store.insert(draft("A", &[1])).unwrap();
        store.insert(draft("B", &[2])).unwrap();
        assert_eq!(dir_entries(dir.path()), vec!["datasets.json"]);
    }

    #[test]
    fn test_parallel_writers_never_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datasets.json");
        JsonFileStore::open(&path).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let mut store = JsonFileStore::open(&path).unwrap();
                    (0..30)
                        .map(|i| store.insert(draft(&format!("T{t}-{i}"), &[1])))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            for result in handle.join().unwrap() {
                assert!(result.is_ok(), "insert failed: {:?}", result.err());
            }
        }

        // last writer wins, but the file is always a whole collection
        let store = JsonFileStore::open(&path).unwrap();
        let datasets = store.list().unwrap();
        assert!(!datasets.is_empty());
        assert!(datasets.len() <= 120);
        assert_eq!(dir_entries(dir.path()), vec!["datasets.json"]);
    }

    #[test]
    fn test_delete() {
        let (_dir, mut store) = open_temp();
        let keep = store.insert(draft("Keep", &[1])).unwrap();
        let gone = store.insert(draft("Gone", &[1])).unwrap();

        store.delete(&gone).unwrap();
        assert!(store.get(&gone).unwrap_err().is_not_found());
        assert!(store.get(&keep).is_ok());
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_unknown_id_leaves_file_untouched() {
        let (_dir, mut store) = open_temp();
        store.insert(draft("A", &[1])).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        assert!(store.delete("ds_missing").unwrap_err().is_not_found());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let (_dir, mut store) = open_temp();
        fs::write(store.path(), "{ not json").unwrap();

        let err = store.list().unwrap_err();
        assert!(matches!(err, Error::StoreDecode { .. }));
        assert!(err.is_storage());

        // the corrupt file must not be overwritten
        assert!(store.insert(draft("A", &[1])).is_err());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "{ not json");
    }

    #[test]
    fn test_missing_file_after_open_reads_as_empty() {
        let (_dir, store) = open_temp();
        fs::remove_file(store.path()).unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_sequential_writers_see_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datasets.json");
        let mut a = JsonFileStore::open(&path).unwrap();
        let mut b = JsonFileStore::open(&path).unwrap();

        let first = a.insert(draft("A", &[1])).unwrap();
        let second = b.insert(draft("B", &[2])).unwrap();

        let all = a.list().unwrap();
        assert!(all.iter().any(|d| d.id == first));
        assert!(all.iter().any(|d| d.id == second));
    }
}
