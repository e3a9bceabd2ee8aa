//! Fan-out of rendered snapshots to the configured sinks.
//!
//! Every sink receives the same framing:
//!
//! ```text
//! ----- Metrics Snapshot -----
//! <one line per reading>
//! -----------------------------
//! ```
//!
//! Log files are opened once in append mode and flushed after each snapshot, so a crash
//! loses at most the snapshot being written.
mod error;

pub use error::{Error, Result};

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::OutputSpec;
use crate::error::ResultOkLogExt;
use crate::fsutil;

pub const HEADER: &str = "----- Metrics Snapshot -----";
pub const TRAILER: &str = "-----------------------------";

/// Writes `block` between [`HEADER`] and [`TRAILER`] and flushes.
pub fn write_framed<W: Write + ?Sized>(out: &mut W, block: &str) -> io::Result<()> {
    writeln!(out, "{HEADER}")?;
    out.write_all(block.as_bytes())?;
    writeln!(out, "{TRAILER}")?;
    out.flush()
}

/// A destination for snapshots.
#[derive(Debug)]
pub enum OutputSink {
    /// The process's standard output.
    Console,
    /// An append-only file held open for the process lifetime.
    LogFile {
        path: PathBuf,
        writer: BufWriter<File>,
    },
}

impl OutputSink {
    /// Opens the sink described by `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] if a log file cannot be opened for appending.
    pub fn open(spec: &OutputSpec) -> Result<Self> {
        match spec {
            OutputSpec::Console => Ok(OutputSink::Console),
            OutputSpec::Log { path } => Ok(OutputSink::LogFile {
                writer: fsutil::open_append_writer(path)?,
                path: path.clone(),
            }),
        }
    }

    pub fn log_path(&self) -> Option<&Path> {
        match self {
            OutputSink::Console => None,
            OutputSink::LogFile { path, .. } => Some(path),
        }
    }

    /// Writes one framed snapshot and flushes it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Write`] if writing or flushing fails.
    pub fn write_snapshot(&mut self, block: &str) -> Result<()> {
        let res = match self {
            OutputSink::Console => write_framed(&mut io::stdout().lock(), block),
            OutputSink::LogFile { writer, .. } => write_framed(writer, block),
        };
        res.map_err(|source| self.write_error(source))
    }

    /// Flushes any buffered output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Write`] if flushing fails.
    pub fn flush(&mut self) -> Result<()> {
        let res = match self {
            OutputSink::Console => io::stdout().flush(),
            OutputSink::LogFile { writer, .. } => writer.flush(),
        };
        res.map_err(|source| self.write_error(source))
    }

    fn write_error(&self, source: io::Error) -> Error {
        Error::Write {
            sink: self.to_string(),
            source,
        }
    }
}

impl fmt::Display for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputSink::Console => f.write_str("console"),
            OutputSink::LogFile { path, .. } => write!(f, "log file `{}`", path.display()),
        }
    }
}

/// Owns every configured sink and publishes each snapshot to all of them.
#[derive(Debug, Default)]
pub struct OutputRouter {
    sinks: Vec<OutputSink>,
}

impl OutputRouter {
    pub fn new(sinks: Vec<OutputSink>) -> Self {
        Self { sinks }
    }

    /// Opens all sinks described by `specs`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] for the first log file that cannot be opened.
    pub fn open(specs: &[OutputSpec]) -> Result<Self> {
        let sinks = specs
            .iter()
            .map(OutputSink::open)
            .collect::<Result<Vec<_>>>()?;
        if sinks.is_empty() {
            log::warn!("no outputs configured, snapshots will be discarded");
        }
        Ok(Self::new(sinks))
    }

    pub fn sinks(&self) -> &[OutputSink] {
        &self.sinks
    }

    /// Writes `block` to every sink.
    ///
    /// A failing sink is logged and skipped; the others still receive the snapshot.
    /// Returns the number of sinks that failed.
    pub fn publish(&mut self, block: &str) -> usize {
        self.sinks
            .iter_mut()
            .map(|sink| sink.write_snapshot(block).ok_log("dropping snapshot"))
            .filter(Option::is_none)
            .count()
    }

    /// Flushes and releases every sink.
    pub fn close(mut self) {
        for sink in &mut self.sinks {
            sink.flush().ok_log("failed closing output");
        }
        log::debug!("closed {} outputs", self.sinks.len());
    }
}
