//! Structured error types for reading kernel counters out of procfs.
//!
//! - [`Error`] is what a [`CounterSource`](super::CounterSource) hands back to samplers.
//! - [`StatParseError`] describes why the text of a record could not be parsed. It converts
//!   into an [`std::io::Error`] of kind `InvalidData` so that parsers can stay on
//!   `std::io::Result`, and is recovered from there in tests with
//!   [`extract_stat_parse_error`].

use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

use crate::fsutil;

#[derive(Debug, Error)]
pub enum Error {
    #[error("counters source unavailable: {0}")]
    SourceUnavailable(#[from] fsutil::FileOpenError),

    #[error("failed to read `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("core {core_id} not found in `{path}`")]
    CoreNotFound { core_id: u32, path: PathBuf },

    #[error("missing field '{field}' in `{path}`")]
    MissingField { field: &'static str, path: PathBuf },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum StatParseError {
    #[error("duplicate field '{field}' at line {line}")]
    DuplicateField { field: String, line: usize },

    #[error("invalid value for '{key}' at line {line}: '{value}': {source}")]
    InvalidKeyValue {
        key: String,
        value: String,
        line: usize,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid value at line {line}: '{value}': {source}")]
    InvalidValue {
        value: String,
        line: usize,
        #[source]
        source: ParseIntError,
    },

    #[error("expected at least {expected} fields at line {line}, found {found}")]
    MissingFields {
        expected: usize,
        found: usize,
        line: usize,
    },
}

impl From<StatParseError> for std::io::Error {
    fn from(err: StatParseError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidData, err)
    }
}

/// Extracts a `StatParseError` from an `std::io::Error` assuming it was wrapped.
///
/// Panics if the inner error is not a `StatParseError`. Intended for use in test assertions only.
#[cfg(test)]
pub(crate) fn extract_stat_parse_error(err: &std::io::Error) -> &StatParseError {
    err.get_ref()
        .and_then(|e| e.downcast_ref::<StatParseError>())
        .unwrap()
}
