use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("instance set must not be empty")]
    EmptyInstanceSet,
    #[error("instance number must be positive, got {0}")]
    NonPositiveInstance(i64),
}
