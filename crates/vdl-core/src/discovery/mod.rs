//! The file list handed to the assembler when file discovery is enabled.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Written by the artifact fetcher next to the files it downloaded.
pub const FETCHER_CONFIG: &str = "fetcher_config.json";

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },
}

#[derive(Deserialize)]
struct FetcherConfig {
    #[serde(default)]
    cvd_files: BTreeMap<String, serde_json::Value>,
}

/// Files available to the assembler, one path per entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileReport(Vec<PathBuf>);

impl FileReport {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self(files)
    }

    /// Collect the files recorded in `dir/fetcher_config.json`.
    ///
    /// A directory without a fetcher config yields an empty report.
    pub fn from_fetcher_config(dir: &Path) -> Result<Self, DiscoveryError> {
        let path = dir.join(FETCHER_CONFIG);
        if !path.is_file() {
            debug!(target: "vdl.core.discovery", dir = %dir.display(), "no fetcher config");
            return Ok(Self::default());
        }

        let bytes = std::fs::read(&path).map_err(|e| DiscoveryError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: FetcherConfig =
            serde_json::from_slice(&bytes).map_err(|e| DiscoveryError::Parse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let files: Vec<PathBuf> = config.cvd_files.into_keys().map(PathBuf::from).collect();
        debug!(target: "vdl.core.discovery", count = files.len(), "discovered files");
        Ok(Self(files))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Newline-terminated paths, the format the assembler reads on stdin.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for path in &self.0 {
            out.extend_from_slice(path.as_os_str().as_encoded_bytes());
            out.push(b'\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fetcher_config_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let report = FileReport::from_fetcher_config(dir.path()).unwrap();
        assert!(report.is_empty());
        assert!(report.to_bytes().is_empty());
    }

    #[test]
    fn lists_cvd_files_one_per_line() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(FETCHER_CONFIG),
            r#"{
                "cvd_files": {
                    "images/system.img": { "source": "default_build" },
                    "bin/run_cvd": { "source": "host_package" }
                }
            }"#,
        )
        .unwrap();

        let report = FileReport::from_fetcher_config(dir.path()).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report.to_bytes(), b"bin/run_cvd\nimages/system.img\n");
    }

    #[test]
    fn corrupt_fetcher_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(FETCHER_CONFIG), b"[").unwrap();
        assert!(matches!(
            FileReport::from_fetcher_config(dir.path()),
            Err(DiscoveryError::Parse { .. })
        ));
    }
}
