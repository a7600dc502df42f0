//! `SQLite` dataset store.
//!
//! Each dataset is one row of the `datasets` table. Every write is a single
//! statement, so readers never observe a partially written dataset.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension};
use tracing::{debug, info};

use super::schema::{DATASET_COLUMNS, SCHEMA_STATEMENTS};
use super::{assign_id, ensure_parent_dir, DatasetStore};
use crate::classify::TrafficLevel;
use crate::dataset::{Dataset, DatasetDraft, IntervalSample};
use crate::error::{Error, Result};
use crate::timegrid;

/// A [`DatasetStore`] backed by a `SQLite` database.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist
    /// and makes sure the schema is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema cannot
    /// be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_parent_dir(&path)?;

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // WAL lets readers proceed while a write is in flight
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory database, for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored datasets.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM datasets", [], |row| row.get(0))?;
        Ok(count)
    }

    fn exists(&self, id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM datasets WHERE id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Convert a database row to a [`Dataset`].
    fn row_to_dataset(row: &rusqlite::Row) -> rusqlite::Result<Dataset> {
        let date: String = row.get(2)?;
        let start_time: String = row.get(3)?;
        let time_slots: String = row.get(6)?;
        let samples: String = row.get(7)?;
        let classification: String = row.get(11)?;
        let created_at: String = row.get(12)?;

        let classification = TrafficLevel::from_code(&classification).ok_or_else(|| {
            conversion_error(11, format!("unknown classification {classification:?}"))
        })?;

        Ok(Dataset {
            id: row.get(0)?,
            location: row.get(1)?,
            date: NaiveDate::parse_from_str(&date, crate::aggregate::DATE_FORMAT)
                .map_err(|e| conversion_error(2, e))?,
            start_time: timegrid::parse_time(&start_time)
                .map_err(|e| conversion_error(3, e.to_string()))?,
            interval_minutes: from_sql_int(row, 4)?,
            interval_count: from_sql_int(row, 5)?,
            time_slots: serde_json::from_str(&time_slots).map_err(|e| conversion_error(6, e))?,
            samples: serde_json::from_str::<Vec<IntervalSample>>(&samples)
                .map_err(|e| conversion_error(7, e))?,
            total_vehicles: from_sql_int(row, 8)?,
            average_vehicles: from_sql_int(row, 9)?,
            peak_vehicles: from_sql_int(row, 10)?,
            classification,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| conversion_error(12, e))?
                .with_timezone(&Utc),
        })
    }
}

/// Create tables and indexes if they don't exist.
fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }
    Ok(())
}

fn conversion_error(
    column: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, err.into())
}

/// Read an integer column into an unsigned Rust integer.
fn from_sql_int<T: TryFrom<i64>>(row: &rusqlite::Row, column: usize) -> rusqlite::Result<T>
where
    T::Error: std::error::Error + Send + Sync + 'static,
{
    let value: i64 = row.get(column)?;
    T::try_from(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, Type::Integer, Box::new(e))
    })
}

fn to_sql_int(value: u64, field: &str) -> Result<i64> {
    i64::try_from(value).map_err(|_| Error::validation(format!("{field} is too large to store")))
}

impl DatasetStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn insert(&mut self, draft: DatasetDraft) -> Result<String> {
        let now = Utc::now();
        let id = assign_id(now, |candidate| self.exists(candidate))?;
        let dataset = Dataset::from_draft(draft, id.clone(), now);

        self.conn.execute(
            r"
            INSERT INTO datasets (id, location, date, start_time, interval_minutes,
                interval_count, time_slots, samples, total_vehicles, average_vehicles,
                peak_vehicles, classification, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ",
            params![
                dataset.id,
                dataset.location,
                dataset.date.format(crate::aggregate::DATE_FORMAT).to_string(),
                timegrid::format_time(dataset.start_time),
                dataset.interval_minutes,
                dataset.interval_count,
                serde_json::to_string(&dataset.time_slots)?,
                serde_json::to_string(&dataset.samples)?,
                to_sql_int(dataset.total_vehicles, "totalVehicles")?,
                to_sql_int(dataset.average_vehicles, "averageVehicles")?,
                to_sql_int(dataset.peak_vehicles, "peakVehicles")?,
                dataset.classification.code(),
                dataset.created_at.to_rfc3339(),
            ],
        )?;

        info!("Inserted dataset {} into {}", id, self.path.display());
        Ok(id)
    }

    fn list(&self) -> Result<Vec<Dataset>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {DATASET_COLUMNS} FROM datasets"))?;
        let datasets = stmt
            .query_map([], Self::row_to_dataset)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!("Loaded {} datasets", datasets.len());
        Ok(datasets)
    }

    fn get(&self, id: &str) -> Result<Dataset> {
        self.conn
            .query_row(
                &format!("SELECT {DATASET_COLUMNS} FROM datasets WHERE id = ?1"),
                [id],
                Self::row_to_dataset,
            )
            .optional()?
            .ok_or_else(|| Error::not_found(id))
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM datasets WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(Error::not_found(id));
        }
        info!("Deleted dataset {}", id);
        Ok(())
    }
}
