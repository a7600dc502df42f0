//! Logging setup for trafficlog.
//!
//! Log lines go to stderr so that command output on stdout (tables, JSON)
//! can be piped without interference.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Warnings and errors.
    #[default]
    Normal,
    /// Info and above.
    Verbose,
    /// Everything, including store reads.
    Trace,
}

impl Verbosity {
    /// Map `-q` and the number of `-v` flags to a verbosity.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Trace,
        }
    }

    /// Convert verbosity to tracing level filter.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::INFO,
            Self::Trace => Level::DEBUG,
        }
    }

    /// Default `EnvFilter` directive for this verbosity.
    #[must_use]
    pub fn filter_directive(&self) -> String {
        format!("trafficlog={}", self.to_level_filter())
    }
}

/// Initialize the logging system.
///
/// Call once at startup. `RUST_LOG`, when set, takes precedence over
/// `verbosity`.
///
/// # Examples
///
/// ```no_run
/// use trafficlog::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_file(false)
            .with_line_number(false),
    );

    // already installed is fine
    let _ = subscriber.try_init();
}

/// Initialize logging for tests.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
