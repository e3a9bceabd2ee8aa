use crate::fsutil;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open log output: {0}")]
    Open(#[from] fsutil::FileOpenError),

    #[error("failed to write snapshot to {sink}: {source}")]
    Write {
        sink: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
