use thiserror::Error;
use vdl_exec::ExecError;
use vdl_model::LaunchState;

use crate::{
    discovery::DiscoveryError, flags::FlagError, guard::GuardError,
    instance_nums::InstanceNumsError, store::StoreError,
};

/// Exit code used for every fatal launcher error.
pub const FATAL_EXIT_CODE: u8 = 1;
/// Exit code after an interrupt, following the shell convention.
pub const CANCELLED_EXIT_CODE: u8 = 130;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    InstanceNums(#[from] InstanceNumsError),
    #[error(transparent)]
    Flags(#[from] FlagError),
    #[error(transparent)]
    Guard(#[from] GuardError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("expected at least one instance")]
    EmptyInstanceSet,
    #[error("launch already started (state: {0:?})")]
    AlreadyStarted(LaunchState),
    #[error("launch cancelled")]
    Cancelled,
}

impl CoreError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CoreError::Cancelled => CANCELLED_EXIT_CODE,
            _ => FATAL_EXIT_CODE,
        }
    }
}
