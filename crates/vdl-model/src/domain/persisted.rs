use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File name of the overlay disk inside an instance directory.
const OVERLAY_DISK: &str = "overlay.img";

/// A recorded yes/no decision; `Unknown` when never asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Answer {
    #[default]
    Unknown,
    Yes,
    No,
}

/// Per-instance part of a previous run's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersistedInstance {
    pub instance_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub virtual_disk_paths: Vec<PathBuf>,
}

impl PersistedInstance {
    /// Path of a file inside this instance's directory.
    pub fn per_instance_path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.instance_dir.join(name)
    }

    /// Whether this instance booted from an overlay disk.
    pub fn used_overlay(&self) -> bool {
        let overlay = self.per_instance_path(OVERLAY_DISK);
        self.virtual_disk_paths.iter().any(|p| *p == overlay)
    }
}

/// Read-only snapshot of the configuration persisted by a previous launch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersistedConfig {
    pub root_dir: PathBuf,
    #[serde(default)]
    pub enable_metrics: Answer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_tools_version: Option<String>,
    #[serde(default)]
    pub instances: Vec<PersistedInstance>,
}
