//! Command-line interface for trafficlog.
//!
//! Researchers record and remove surveys; anyone can list, inspect and
//! summarize them.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    ConfigCommand, DeleteCommand, LevelArg, ListCommand, OutputFormat, RecordCommand,
    ShowCommand, StatsCommand, SubmitCommand,
};

/// trafficlog - Record and browse traffic count surveys
///
/// Saves vehicle counts taken in fixed time intervals at a location,
/// classifies each survey by its average load, and summarizes the collection.
#[derive(Debug, Parser)]
#[command(name = "trafficlog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a survey from command-line counts
    Record(RecordCommand),

    /// Record a survey from a JSON payload
    Submit(SubmitCommand),

    /// List saved surveys
    List(ListCommand),

    /// Show one survey in detail
    Show(ShowCommand),

    /// Delete a survey
    Delete(DeleteCommand),

    /// Summarize all surveys
    Stats(StatsCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
