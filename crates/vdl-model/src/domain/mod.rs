mod kv;
pub use kv::KeyValue;

mod subprocess_env;
pub use subprocess_env::SubprocessEnv;

mod instance_set;
pub use instance_set::{InstanceNum, InstanceSet};

mod subtool;
pub use subtool::Subtool;

mod launch_state;
pub use launch_state::LaunchState;

mod outcome;
pub use outcome::{LaunchOutcome, RUNNER_FAILURE_EXIT_CODE, RunnerExit};

mod persisted;
pub use persisted::{Answer, PersistedConfig, PersistedInstance};

/// Environment variable carrying the instance number a subprocess works on.
///
/// The subordinate binaries read it to locate their per-instance state.
pub const INSTANCE_ENV_VAR: &str = "CUTTLEFISH_INSTANCE";

/// Instance number used when no instance flag is given.
pub const DEFAULT_BASE_INSTANCE: InstanceNum = 1;
