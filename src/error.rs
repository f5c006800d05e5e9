use thiserror::Error;

/// Unified error type for the leakhound library.
#[derive(Debug, Error)]
pub enum LeakhoundError {
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid literal set: {0}")]
    LiteralSet(#[from] aho_corasick::BuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LeakhoundError>;
