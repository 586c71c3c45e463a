mod error;
pub use error::ExecError;

pub mod proc;
pub use proc::{ProcConfig, StdinMode, spawn};

pub mod sched;

mod util;
pub use util::{exit_code, kill_graceful, kill_graceful_all};
