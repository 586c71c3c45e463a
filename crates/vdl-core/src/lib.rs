//! Launch orchestration: turns one invocation into an assembler run followed by one
//! runner per device instance.
//!
//! Preconditions (flag parsing, instance numbers, the overlay guard) are all checked
//! before [`Orchestrator::launch`] starts any process.

pub mod error;
pub use error::CoreError;

pub mod discovery;
pub mod flags;
pub mod forward;
pub mod guard;
pub mod host_tools;
pub mod instance_nums;
pub mod metrics;
pub mod normalize;
pub mod orchestrator;
pub mod paths;
pub mod store;

pub use discovery::FileReport;
pub use flags::LaunchFlags;
pub use forward::{FlagForwarder, PassthroughForwarder};
pub use instance_nums::InstanceNumsCalculator;
pub use normalize::normalize_bool_args;
pub use orchestrator::{LaunchPlan, Orchestrator};
pub use store::{ConfigStore, JsonConfigStore};
