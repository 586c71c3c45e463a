use std::fs::{File, OpenOptions};
use std::sync::Mutex;

use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, fmt::time::OffsetTime, layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::logger::{
    config::{FileSink, LoggerConfig},
    error::LoggerError,
    format::LoggerFormat,
    verbosity::Verbosity,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

pub struct Logger;

impl Logger {
    pub fn text(cfg: &LoggerConfig) -> Result<(), LoggerError> {
        let console = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(cfg.use_color)
            .with_target(cfg.with_targets)
            .with_timer(mk_timer())
            .with_filter(mk_filter(cfg.console)?)
            .boxed();
        init_layers(console, cfg)
    }

    pub fn json(cfg: &LoggerConfig) -> Result<(), LoggerError> {
        let console = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_target(cfg.with_targets)
            .with_timer(mk_timer())
            .with_filter(mk_filter(cfg.console)?)
            .boxed();
        init_layers(console, cfg)
    }

    pub fn journald(cfg: &LoggerConfig) -> Result<(), LoggerError> {
        let console = mk_journald(mk_filter(cfg.console)?)?;
        init_layers(console, cfg)
    }
}

/// Install `console` plus the optional file sink as the global subscriber.
fn init_layers(console: BoxedLayer, cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let mut layers: Vec<BoxedLayer> = vec![console];
    layers.extend(file_layer(cfg)?);
    init_with(tracing_subscriber::registry().with(layers))
}

/// The `--launcher_log` sink. JSON lines when the console is JSON, plain text otherwise.
fn file_layer(cfg: &LoggerConfig) -> Result<Option<BoxedLayer>, LoggerError> {
    let Some(sink) = &cfg.file else {
        return Ok(None);
    };
    let base = fmt::layer()
        .with_writer(open_log_file(sink)?)
        .with_ansi(false)
        .with_target(cfg.with_targets)
        .with_timer(mk_timer());
    let filter = sink.verbosity.level_filter();

    let layer: BoxedLayer = match cfg.format {
        LoggerFormat::Json => base.json().with_filter(filter).boxed(),
        LoggerFormat::Text | LoggerFormat::Journald => base.with_filter(filter).boxed(),
    };
    Ok(Some(layer))
}

fn mk_filter(verbosity: Verbosity) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(verbosity.directive())
        .map_err(|_| LoggerError::InvalidVerbosity(verbosity.to_string()))
}

fn mk_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

fn open_log_file(sink: &FileSink) -> Result<Mutex<File>, LoggerError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&sink.path)
        .map(Mutex::new)
        .map_err(|e| LoggerError::LogFile {
            path: sink.path.display().to_string(),
            reason: e.to_string(),
        })
}

fn as_error(e: impl std::fmt::Display) -> LoggerError {
    let s = e.to_string();
    if s.contains("SetGlobalDefaultError") || s.contains("global default") {
        LoggerError::AlreadyInitialized
    } else {
        LoggerError::InitializationFailed(s)
    }
}

fn init_with<S>(subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber.try_init().map_err(as_error)
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn mk_journald(filter: EnvFilter) -> Result<BoxedLayer, LoggerError> {
    let journald = tracing_journald::layer()
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))?;
    Ok(journald.with_filter(filter).boxed())
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn mk_journald(_filter: EnvFilter) -> Result<BoxedLayer, LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn log_file_is_created_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink {
            path: dir.path().join("launcher.log"),
            verbosity: Verbosity::Debug,
        };
        open_log_file(&sink).unwrap();
        assert!(sink.path.is_file());
    }

    #[test]
    fn file_sink_is_built_for_every_format() {
        let dir = tempfile::tempdir().unwrap();
        for (format, name) in [
            (LoggerFormat::Text, "text.log"),
            (LoggerFormat::Json, "json.log"),
            (LoggerFormat::Journald, "journald.log"),
        ] {
            let cfg = LoggerConfig {
                format,
                file: Some(FileSink {
                    path: dir.path().join(name),
                    verbosity: Verbosity::Verbose,
                }),
                ..Default::default()
            };
            assert!(file_layer(&cfg).unwrap().is_some(), "{format:?}");
            assert!(dir.path().join(name).is_file(), "{format:?}");
        }
    }

    #[test]
    fn no_file_sink_without_a_path() {
        assert!(file_layer(&LoggerConfig::default()).unwrap().is_none());
    }

    #[test]
    fn unopenable_log_file_is_reported() {
        let sink = FileSink {
            path: PathBuf::from("/nonexistent-dir/for/sure/launcher.log"),
            verbosity: Verbosity::Info,
        };
        assert!(matches!(
            open_log_file(&sink),
            Err(LoggerError::LogFile { .. })
        ));
    }
}
