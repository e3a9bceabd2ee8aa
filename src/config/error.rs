use crate::fsutil;

/// Errors that make a configuration document unusable.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    FileOpen(#[from] fsutil::FileOpenError),

    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid period `{value}`: expected a positive number of seconds")]
    InvalidPeriod { value: String },
}

pub type Result<T> = std::result::Result<T, Error>;
