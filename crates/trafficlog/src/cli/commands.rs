//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::aggregate::parse_date;
use crate::classify::TrafficLevel;
use crate::config::SurveyConfig;
use crate::dataset::{DatasetPayload, SampleEntry};
use crate::error::{Error, Result};
use crate::filter::DatasetFilter;

/// Record command arguments.
#[derive(Debug, Args)]
pub struct RecordCommand {
    /// Where the survey was taken
    #[arg(short, long)]
    pub location: String,

    /// Survey date, YYYY-MM-DD (defaults to today)
    #[arg(short, long)]
    pub date: Option<String>,

    /// Start time of the first interval, HH:MM
    #[arg(short, long)]
    pub start: Option<String>,

    /// Interval length in minutes
    #[arg(short, long)]
    pub interval: Option<u32>,

    /// Number of intervals (defaults to the number of counts)
    #[arg(long)]
    pub count: Option<u32>,

    /// Vehicle counts, one per interval, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    pub counts: Vec<u64>,

    /// Note for the next interval; repeat in interval order
    #[arg(short, long = "notes", value_name = "NOTE")]
    pub notes: Vec<String>,
}

impl RecordCommand {
    /// Build a payload, filling unset grid fields from the survey defaults.
    ///
    /// # Errors
    ///
    /// Returns a validation error when more notes than counts are given.
    pub fn to_payload(&self, survey: &SurveyConfig, today: NaiveDate) -> Result<DatasetPayload> {
        if self.notes.len() > self.counts.len() {
            return Err(Error::validation(format!(
                "{} notes given for {} intervals",
                self.notes.len(),
                self.counts.len()
            )));
        }

        let interval_count = match self.count {
            Some(count) => count,
            None => u32::try_from(self.counts.len())
                .map_err(|_| Error::validation("too many intervals"))?,
        };

        let samples = self
            .counts
            .iter()
            .enumerate()
            .map(|(i, count)| SampleEntry {
                vehicle_count: Some(*count),
                note: self.notes.get(i).cloned(),
            })
            .collect();

        Ok(DatasetPayload {
            location: self.location.clone(),
            date: self
                .date
                .clone()
                .unwrap_or_else(|| today.format(crate::aggregate::DATE_FORMAT).to_string()),
            start_time: self
                .start
                .clone()
                .unwrap_or_else(|| survey.start_time.clone()),
            interval_minutes: self.interval.unwrap_or(survey.interval_minutes),
            interval_count,
            samples,
        })
    }
}

/// Submit command arguments.
#[derive(Debug, Args)]
pub struct SubmitCommand {
    /// JSON payload file, or `-` for stdin
    #[arg(value_name = "FILE")]
    pub input: String,
}

impl SubmitCommand {
    /// Whether the payload is read from stdin.
    #[must_use]
    pub fn reads_stdin(&self) -> bool {
        self.input == "-"
    }
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Case-insensitive text to look for in the location
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only datasets surveyed on this date (YYYY-MM-DD)
    #[arg(short, long)]
    pub date: Option<String>,

    /// Only datasets with this classification
    #[arg(long, value_enum)]
    pub condition: Option<LevelArg>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

impl ListCommand {
    /// Build the filter described by the arguments.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `--date` is not a valid date.
    pub fn to_filter(&self) -> Result<DatasetFilter> {
        Ok(DatasetFilter {
            search_text: self.search.clone(),
            date: self.date.as_deref().map(parse_date).transpose()?,
            classification: self.condition.map(TrafficLevel::from),
        })
    }
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Dataset id
    pub id: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Dataset id
    pub id: String,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Traffic level argument for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LevelArg {
    /// Average of at most 150 vehicles per interval
    FreeFlowing,
    /// Average of 151 to 300
    Moderate,
    /// Average of 301 to 500
    Congested,
    /// Average above 500
    Severe,
}

impl From<LevelArg> for TrafficLevel {
    fn from(arg: LevelArg) -> Self {
        match arg {
            LevelArg::FreeFlowing => Self::FreeFlowing,
            LevelArg::Moderate => Self::Moderate,
            LevelArg::Congested => Self::Congested,
            LevelArg::Severe => Self::SevereCongestion,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(counts: &[u64]) -> RecordCommand {
        RecordCommand {
            location: "Jalan Sudirman".to_string(),
            date: None,
            start: None,
            interval: None,
            count: None,
            counts: counts.to_vec(),
            notes: Vec::new(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_level_arg_conversion() {
        assert_eq!(
            TrafficLevel::from(LevelArg::FreeFlowing),
            TrafficLevel::FreeFlowing
        );
        assert_eq!(TrafficLevel::from(LevelArg::Moderate), TrafficLevel::Moderate);
        assert_eq!(
            TrafficLevel::from(LevelArg::Congested),
            TrafficLevel::Congested
        );
        assert_eq!(
            TrafficLevel::from(LevelArg::Severe),
            TrafficLevel::SevereCongestion
        );
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_record_payload_uses_survey_defaults() {
        let payload = record(&[100, 400, 600])
            .to_payload(&SurveyConfig::default(), today())
            .unwrap();

        assert_eq!(payload.date, "2024-03-15");
        assert_eq!(payload.start_time, "07:00");
        assert_eq!(payload.interval_minutes, 10);
        assert_eq!(payload.interval_count, 3);
        assert_eq!(payload.samples[2], SampleEntry::count(600));
    }

    #[test]
    fn test_record_payload_explicit_values_win() {
        let mut cmd = record(&[1, 2]);
        cmd.date = Some("2024-01-01".to_string());
        cmd.start = Some("23:50".to_string());
        cmd.interval = Some(15);
        cmd.count = Some(4);
        cmd.notes = vec!["rain".to_string()];

        let payload = cmd.to_payload(&SurveyConfig::default(), today()).unwrap();
        assert_eq!(payload.date, "2024-01-01");
        assert_eq!(payload.start_time, "23:50");
        assert_eq!(payload.interval_minutes, 15);
        // mismatch is left for aggregation to reject
        assert_eq!(payload.interval_count, 4);
        assert_eq!(payload.samples[0].note.as_deref(), Some("rain"));
        assert_eq!(payload.samples[1].note, None);
    }

    #[test]
    fn test_record_rejects_extra_notes() {
        let mut cmd = record(&[1]);
        cmd.notes = vec!["a".to_string(), "b".to_string()];
        assert!(cmd
            .to_payload(&SurveyConfig::default(), today())
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_list_to_filter() {
        let cmd = ListCommand {
            search: Some("jalan".to_string()),
            date: Some("2024-01-01".to_string()),
            condition: Some(LevelArg::Severe),
            format: OutputFormat::Table,
        };
        let filter = cmd.to_filter().unwrap();
        assert_eq!(filter.search_text.as_deref(), Some("jalan"));
        assert_eq!(filter.date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(filter.classification, Some(TrafficLevel::SevereCongestion));
    }

    #[test]
    fn test_list_to_filter_bad_date() {
        let cmd = ListCommand {
            search: None,
            date: Some("yesterday".to_string()),
            condition: None,
            format: OutputFormat::Plain,
        };
        assert!(cmd.to_filter().unwrap_err().is_validation());
    }

    #[test]
    fn test_submit_reads_stdin() {
        assert!(SubmitCommand {
            input: "-".to_string()
        }
        .reads_stdin());
        assert!(!SubmitCommand {
            input: "payload.json".to_string()
        }
        .reads_stdin());
    }
}
