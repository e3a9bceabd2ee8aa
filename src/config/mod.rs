//! Static configuration, read once at startup.
//!
//! The document is JSON with three sections:
//!
//! ```json
//! {
//!     "settings": { "period": 5 },
//!     "metrics": [
//!         { "type": "cpu", "ids": [0, 1] },
//!         { "type": "memory", "spec": ["used", "free"] }
//!     ],
//!     "outputs": [
//!         { "type": "console" },
//!         { "type": "log", "path": "/var/log/citadel.log" }
//!     ]
//! }
//! ```
//!
//! `period` may also be given as a numeric string (`"5"`). The resulting [`Config`] is
//! immutable and handed around by reference.
mod error;

pub use error::{Error, Result};

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::fsutil;

/// One metric to collect on every pass.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetricSpec {
    /// Utilization of the listed logical cores, in listed order.
    Cpu {
        #[serde(rename = "ids")]
        core_ids: Vec<u32>,
    },
    /// The listed memory figures, in listed order.
    Memory {
        #[serde(rename = "spec")]
        fields: Vec<MemoryField>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryField {
    Used,
    Free,
}

/// Where snapshots are written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputSpec {
    Console,
    /// Append-only log file.
    Log { path: PathBuf },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPeriod {
    Seconds(i64),
    Text(String),
}

impl RawPeriod {
    fn into_duration(self) -> Result<Duration> {
        let seconds = match &self {
            RawPeriod::Seconds(seconds) => Some(*seconds),
            RawPeriod::Text(text) => text.trim().parse::<i64>().ok(),
        };
        match seconds.and_then(|s| u64::try_from(s).ok()) {
            Some(seconds) if seconds > 0 => Ok(Duration::from_secs(seconds)),
            _ => Err(Error::InvalidPeriod {
                value: match self {
                    RawPeriod::Seconds(seconds) => seconds.to_string(),
                    RawPeriod::Text(text) => text,
                },
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Settings {
    period: RawPeriod,
}

#[derive(Debug, Deserialize)]
struct Document {
    settings: Settings,
    metrics: Vec<MetricSpec>,
    outputs: Vec<OutputSpec>,
}

/// Validated process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    period: Duration,
    metrics: Vec<MetricSpec>,
    outputs: Vec<OutputSpec>,
}

impl Config {
    /// Loads and validates the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// - [`Error::FileOpen`] if the file cannot be opened.
    /// - [`Error::Parse`] if the document is not valid JSON or lacks a required section.
    /// - [`Error::InvalidPeriod`] if the period is not a positive number of seconds.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let reader = fsutil::open_file_reader(path)?;
        Self::from_reader(reader)
    }

    /// Parses and validates a configuration document.
    ///
    /// # Errors
    ///
    /// See [`Config::from_path`].
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let document: Document = serde_json::from_reader(reader)?;
        Self::from_document(document)
    }

    fn from_document(document: Document) -> Result<Self> {
        Ok(Self {
            period: document.settings.period.into_duration()?,
            metrics: document.metrics,
            outputs: document.outputs,
        })
    }

    /// Wall-clock time between two passes.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Metrics to collect, in output order.
    pub fn metrics(&self) -> &[MetricSpec] {
        &self.metrics
    }

    pub fn outputs(&self) -> &[OutputSpec] {
        &self.outputs
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let document: Document = serde_json::from_str(s)?;
        Self::from_document(document)
    }
}
