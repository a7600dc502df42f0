//! `trafficlog` - Traffic survey recording and reporting
//!
//! Researchers record vehicle counts over fixed time intervals at a location.
//! This library validates those surveys, derives totals, averages, peaks and a
//! congestion classification, persists them, and answers listing, filtering
//! and statistics queries over the saved collection.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod aggregate;
pub mod classify;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod logging;
pub mod service;
pub mod stats;
pub mod storage;
pub mod timegrid;

pub use aggregate::aggregate;
pub use classify::TrafficLevel;
pub use config::Config;
pub use dataset::{Dataset, DatasetDraft, DatasetPayload, IntervalSample, SampleEntry};
pub use error::{Error, ErrorKind, Result};
pub use filter::DatasetFilter;
pub use logging::init_logging;
pub use service::{CreatedDataset, DatasetList, TrafficService};
pub use stats::{compute_stats, Stats};
pub use storage::DatasetStore;
