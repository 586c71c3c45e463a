//! Fingerprint of the host tool binaries, to report whether they changed since the
//! previous launch.

use std::fs;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};
use vdl_model::PersistedConfig;

/// SHA-256 over every regular file directly inside `dir`, in file-name order.
///
/// Names are hashed alongside contents so a rename also changes the fingerprint.
pub fn host_tools_fingerprint(dir: &Path) -> io::Result<String> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    let mut hasher = Sha256::new();
    for path in &files {
        if let Some(name) = path.file_name() {
            hasher.update(name.as_encoded_bytes());
            hasher.update([0u8]);
        }
        hasher.update(fs::read(path)?);
    }
    Ok(hex(&hasher.finalize()))
}

/// Whether the host tools differ from the ones recorded by the previous run.
///
/// Without a previous run, or without a recorded fingerprint, they count as changed.
pub fn host_tools_updated(previous: Option<&PersistedConfig>, current: &str) -> bool {
    previous
        .and_then(|p| p.host_tools_version.as_deref())
        .is_none_or(|last| last != current)
}

fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}
