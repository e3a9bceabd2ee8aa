use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// The access mode a file was requested with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Append,
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenMode::Read => f.write_str("reading"),
            OpenMode::Append => f.write_str("appending"),
        }
    }
}

/// Error that occurs when opening a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to open `{path}` for {mode}: {source}")]
pub struct FileOpenError {
    pub path: PathBuf,
    pub mode: OpenMode,
    #[source]
    pub source: io::Error,
}

/// Opens a file at the given path for reading and wraps it in a [`BufReader`].
///
/// # Errors
///
/// Returns a [`FileOpenError`] if the file cannot be opened.
///
/// # Example
/// ```no_run
/// # use citadel_monitor::fsutil;
/// let reader = fsutil::open_file_reader("/proc/stat")?;
/// # Ok::<(), fsutil::FileOpenError>(())
/// ```
pub fn open_file_reader(path: impl AsRef<Path>) -> Result<BufReader<File>, FileOpenError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| FileOpenError {
        path: path.to_path_buf(),
        mode: OpenMode::Read,
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Opens (creating if needed) a file in append mode and wraps it in a [`BufWriter`].
///
/// Existing content is never truncated.
///
/// # Errors
///
/// Returns a [`FileOpenError`] if the file cannot be opened or created.
pub fn open_append_writer(path: impl AsRef<Path>) -> Result<BufWriter<File>, FileOpenError> {
    let path = path.as_ref();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| FileOpenError {
            path: path.to_path_buf(),
            mode: OpenMode::Append,
            source,
        })?;
    Ok(BufWriter::new(file))
}
