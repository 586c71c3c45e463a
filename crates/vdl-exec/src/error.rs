use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("spawn {program} failed: {reason}")]
    Spawn { program: String, reason: String },
    #[error("missing program")]
    MissingProgram,
    #[error("io error: {0}")]
    Io(String),
    #[error("unsupported on this platform: {0}")]
    Unsupported(&'static str),
}

impl From<std::io::Error> for ExecError {
    fn from(e: std::io::Error) -> Self {
        ExecError::Io(e.to_string())
    }
}
