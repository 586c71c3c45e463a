//! Computes the argument vector each subordinate binary is launched with.

use std::collections::BTreeMap;

use tracing::trace;
use vdl_model::Subtool;

use crate::{error::CoreError, flags::strip_launcher_flags};

/// Seam between the launcher and the subordinate binaries' flag surfaces.
pub trait FlagForwarder: Send + Sync {
    /// Absorb the subordinate binaries' current flag defaults. Called once, before
    /// any `argv_for`.
    fn update_flag_defaults(&mut self) -> Result<(), CoreError>;

    /// Final argument vector for `subtool`, given the normalized invocation arguments.
    fn argv_for(&self, subtool: Subtool, args: &[String]) -> Vec<String>;
}

/// Forwards the invocation arguments, minus the launcher's own flags, after per-subtool
/// fixed arguments.
///
/// Because the fixed arguments come first, an explicit flag in the invocation still
/// overrides them under last-occurrence-wins parsing.
#[derive(Debug, Clone, Default)]
pub struct PassthroughForwarder {
    fixed: BTreeMap<Subtool, Vec<String>>,
}

impl PassthroughForwarder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixed(mut self, subtool: Subtool, args: Vec<String>) -> Self {
        self.fixed.entry(subtool).or_default().extend(args);
        self
    }
}

impl FlagForwarder for PassthroughForwarder {
    fn update_flag_defaults(&mut self) -> Result<(), CoreError> {
        // Nothing to absorb: no flag is interpreted on the subtools' behalf.
        trace!(target: "vdl.core.forward", "passthrough forwarder keeps subtool defaults");
        Ok(())
    }

    fn argv_for(&self, subtool: Subtool, args: &[String]) -> Vec<String> {
        let fixed = self.fixed.get(&subtool).map(Vec::as_slice).unwrap_or_default();
        fixed
            .iter()
            .cloned()
            .chain(strip_launcher_flags(args))
            .collect()
    }
}
