//! Where the subordinate binaries and host artifacts live.

use std::path::{Path, PathBuf};

use vdl_model::{SubprocessEnv, Subtool};

/// Overrides the host artifacts root.
pub const HOST_ARTIFACTS_ENV: &str = "VDL_HOST_ARTIFACTS";

/// `$VDL_HOST_ARTIFACTS`, else `$HOME`, else the current directory.
pub fn host_artifacts_path() -> PathBuf {
    [HOST_ARTIFACTS_ENV, "HOME"]
        .into_iter()
        .filter_map(std::env::var_os)
        .find(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Directory holding the host tool binaries.
pub fn host_tools_dir(artifacts: &Path) -> PathBuf {
    artifacts.join("bin")
}

/// Locate a subtool: next to the launcher's own executable first, then under the host
/// artifacts `bin/`.
pub fn subtool_path(subtool: Subtool, own_dir: Option<&Path>, artifacts: &Path) -> PathBuf {
    if let Some(dir) = own_dir {
        let candidate = dir.join(subtool.binary_name());
        if candidate.is_file() {
            return candidate;
        }
    }
    host_tools_dir(artifacts).join(subtool.binary_name())
}

/// Directory of the running executable, if it can be determined.
pub fn own_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

/// Bindings a subprocess needs that the platform does not provide.
///
/// Android's libc resolves its data and timezone roots from the environment; elsewhere
/// this is empty. Values already set in the launcher's environment are left alone.
pub fn platform_env(artifacts: &Path) -> SubprocessEnv {
    #[allow(unused_mut)]
    let mut env = SubprocessEnv::new();
    #[cfg(target_os = "android")]
    for key in ["ANDROID_DATA", "ANDROID_TZDATA_ROOT", "ANDROID_ROOT"] {
        if std::env::var_os(key).is_none() {
            env.push(key, artifacts.display().to_string());
        }
    }
    #[cfg(not(target_os = "android"))]
    let _ = artifacts;
    env
}
