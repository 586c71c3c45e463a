//! Refuses to switch disk representation against existing persisted state.

use std::path::PathBuf;

use thiserror::Error;
use vdl_model::PersistedConfig;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    #[error(
        "cannot transition between different values of --use_overlay \
         (previous = {previous}, current = {current}); to fix this, delete \"{}\" and any image files",
        root_dir.display()
    )]
    OverlayMismatch {
        previous: bool,
        current: bool,
        root_dir: PathBuf,
    },
    #[error("persisted config under \"{}\" lists no instances", root_dir.display())]
    NoInstances { root_dir: PathBuf },
}

/// Compare the requested overlay mode with the one the previous run used.
///
/// No snapshot means nothing to be consistent with.
pub fn check_overlay_consistency(
    previous: Option<&PersistedConfig>,
    use_overlay: bool,
) -> Result<(), GuardError> {
    let Some(previous) = previous else {
        return Ok(());
    };
    let first = previous
        .instances
        .first()
        .ok_or_else(|| GuardError::NoInstances {
            root_dir: previous.root_dir.clone(),
        })?;

    let used_overlay = first.used_overlay();
    if used_overlay != use_overlay {
        return Err(GuardError::OverlayMismatch {
            previous: used_overlay,
            current: use_overlay,
            root_dir: previous.root_dir.clone(),
        });
    }
    Ok(())
}
