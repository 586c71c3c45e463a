//! Plain data shared by the launcher crates.
//!
//! Nothing here touches processes or the filesystem; the types describe what a launch
//! consists of (instances, subtools, environment bindings) and what it produced.

mod domain;
pub use domain::*;

mod error;
pub use error::ModelError;
