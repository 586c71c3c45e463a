use std::io::IsTerminal;
use std::path::PathBuf;

use crate::logger::{format::LoggerFormat, verbosity::Verbosity};

/// Secondary log destination with its own verbosity.
#[derive(Debug, Clone)]
pub struct FileSink {
    pub path: PathBuf,
    pub verbosity: Verbosity,
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// Verbosity of the stderr console output.
    pub console: Verbosity,
    pub file: Option<FileSink>,
    pub with_targets: bool,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        let use_color = cfg!(test) || std::io::stderr().is_terminal();
        Self {
            format: LoggerFormat::Text,
            console: Verbosity::Info,
            file: None,
            with_targets: true,
            use_color,
        }
    }
}
