use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Invalid log format: {0:?} (expected: text|json|journald)")]
    InvalidFormat(String),
    #[error(
        "journald logging needs a Linux build with the `journald` feature; use --log_format=text"
    )]
    JournaldNotSupported,
    #[error("Logger has been already initialized")]
    AlreadyInitialized,
    #[error("Failed to initialize logger: {0}")]
    InitializationFailed(String),
    #[error("Invalid verbosity: {0} (expected: VERBOSE|DEBUG|INFO|WARNING|ERROR|FATAL)")]
    InvalidVerbosity(String),
    #[error("Failed to open log file {path}: {reason}")]
    LogFile { path: String, reason: String },
}
