use std::fmt;
use std::str::FromStr;

use tracing_subscriber::filter::LevelFilter;

use crate::logger::error::LoggerError;

/// Severity names understood by the launcher and its subprocesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Verbose,
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Verbosity {
    /// Canonical upper-case spelling, as forwarded to subprocesses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Verbose => "VERBOSE",
            Verbosity::Debug => "DEBUG",
            Verbosity::Info => "INFO",
            Verbosity::Warning => "WARNING",
            Verbosity::Error => "ERROR",
            Verbosity::Fatal => "FATAL",
        }
    }

    /// `tracing` has no level above error; fatal collapses onto it.
    pub fn level_filter(&self) -> LevelFilter {
        match self {
            Verbosity::Verbose => LevelFilter::TRACE,
            Verbosity::Debug => LevelFilter::DEBUG,
            Verbosity::Info => LevelFilter::INFO,
            Verbosity::Warning => LevelFilter::WARN,
            Verbosity::Error | Verbosity::Fatal => LevelFilter::ERROR,
        }
    }

    /// Directive string accepted by `EnvFilter`.
    pub fn directive(&self) -> &'static str {
        match self {
            Verbosity::Verbose => "trace",
            Verbosity::Debug => "debug",
            Verbosity::Info => "info",
            Verbosity::Warning => "warn",
            Verbosity::Error | Verbosity::Fatal => "error",
        }
    }
}

impl FromStr for Verbosity {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_uppercase();
        match norm.as_str() {
            "VERBOSE" => Ok(Verbosity::Verbose),
            "DEBUG" => Ok(Verbosity::Debug),
            "INFO" => Ok(Verbosity::Info),
            "WARNING" => Ok(Verbosity::Warning),
            "ERROR" => Ok(Verbosity::Error),
            "FATAL" => Ok(Verbosity::Fatal),
            _ => Err(LoggerError::InvalidVerbosity(s.to_string())),
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
