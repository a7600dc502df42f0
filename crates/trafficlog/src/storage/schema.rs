//! `SQLite` schema definitions for trafficlog.
//!
//! Statements are idempotent and run every time a database is opened.
//! Slot labels and samples are stored as JSON arrays in text columns.

/// SQL statement to create the datasets table.
pub const CREATE_DATASETS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS datasets (
    id TEXT PRIMARY KEY,
    location TEXT NOT NULL,
    date TEXT NOT NULL,
    start_time TEXT NOT NULL,
    interval_minutes INTEGER NOT NULL,
    interval_count INTEGER NOT NULL,
    time_slots TEXT NOT NULL,
    samples TEXT NOT NULL,
    total_vehicles INTEGER NOT NULL,
    average_vehicles INTEGER NOT NULL,
    peak_vehicles INTEGER NOT NULL,
    classification TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create an index on `location` for filtering.
pub const CREATE_LOCATION_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_datasets_location ON datasets(location)
";

/// SQL statement to create an index on `date` for filtering.
pub const CREATE_DATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_datasets_date ON datasets(date)
";

/// SQL statement to create an index on `classification` for stats.
pub const CREATE_CLASSIFICATION_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_datasets_classification ON datasets(classification)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_DATASETS_TABLE,
    CREATE_LOCATION_INDEX,
    CREATE_DATE_INDEX,
    CREATE_CLASSIFICATION_INDEX,
];

/// Columns selected when loading a dataset, in `row_to_dataset` order.
pub const DATASET_COLUMNS: &str = "id, location, date, start_time, interval_minutes, \
     interval_count, time_slots, samples, total_vehicles, average_vehicles, \
     peak_vehicles, classification, created_at";
