//! Raw kernel counters read from the proc filesystem.
//!
//! The samplers never touch files directly: they ask a [`CounterSource`] for a point-in-time
//! [`CounterSnapshot`] or [`MemorySnapshot`]. [`ProcfsReader`] is the implementation backed by
//! `/proc/stat` and `/proc/meminfo`; every call opens the record afresh, so the reader keeps
//! no state between calls.
//!
//! # Supported records
//!
//! - `stat`: one `cpuN` line per logical core with cumulative time-in-state ticks.
//! - `meminfo`: `MemTotal` and `MemFree`, in kilobytes.
mod error;
mod meminfo;
mod parser;
mod stat;

pub use error::{Error, Result, StatParseError};
pub use meminfo::MemInfo;
pub use parser::KeyValueStat;
pub use stat::CpuTimes;

use std::path::{Path, PathBuf};

use crate::fsutil;

/// Cumulative idle and total ticks of one logical core at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub core_id: u32,
    pub idle_ticks: u64,
    pub total_ticks: u64,
}

impl CounterSnapshot {
    pub fn from_times(core_id: u32, times: &CpuTimes) -> Self {
        Self {
            core_id,
            idle_ticks: times.idle_ticks(),
            total_ticks: times.total_ticks(),
        }
    }
}

/// System memory totals at one instant, in kilobytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySnapshot {
    pub total_kb: u64,
    pub free_kb: u64,
}

/// Anything able to hand out point-in-time kernel counters.
pub trait CounterSource {
    /// Reads the counters of the logical core `core_id`.
    ///
    /// # Errors
    ///
    /// [`Error::CoreNotFound`] if the core has no record, [`Error::SourceUnavailable`] if the
    /// record source cannot be opened, [`Error::Read`] if it cannot be read or parsed.
    fn read_cpu_counters(&self, core_id: u32) -> Result<CounterSnapshot>;

    /// Reads the system memory totals.
    ///
    /// # Errors
    ///
    /// [`Error::SourceUnavailable`] if the record source cannot be opened, [`Error::Read`] if
    /// it cannot be read or parsed, [`Error::MissingField`] if a total is absent.
    fn read_memory_counters(&self) -> Result<MemorySnapshot>;
}

impl<S: CounterSource + ?Sized> CounterSource for &S {
    fn read_cpu_counters(&self, core_id: u32) -> Result<CounterSnapshot> {
        (**self).read_cpu_counters(core_id)
    }

    fn read_memory_counters(&self) -> Result<MemorySnapshot> {
        (**self).read_memory_counters()
    }
}

/// [`CounterSource`] reading `stat` and `meminfo` below a proc mount point.
#[derive(Debug, Clone)]
pub struct ProcfsReader {
    stat_path: PathBuf,
    meminfo_path: PathBuf,
}

impl Default for ProcfsReader {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl ProcfsReader {
    /// Creates a reader for the proc filesystem mounted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            stat_path: root.join("stat"),
            meminfo_path: root.join("meminfo"),
        }
    }

    pub fn stat_path(&self) -> &Path {
        &self.stat_path
    }

    pub fn meminfo_path(&self) -> &Path {
        &self.meminfo_path
    }
}

impl CounterSource for ProcfsReader {
    fn read_cpu_counters(&self, core_id: u32) -> Result<CounterSnapshot> {
        let mut buf = fsutil::open_file_reader(&self.stat_path)?;
        let times = CpuTimes::find_core(&mut buf, core_id)
            .map_err(|source| Error::Read {
                path: self.stat_path.clone(),
                source,
            })?
            .ok_or_else(|| Error::CoreNotFound {
                core_id,
                path: self.stat_path.clone(),
            })?;

        Ok(CounterSnapshot::from_times(core_id, &times))
    }

    fn read_memory_counters(&self) -> Result<MemorySnapshot> {
        let mut buf = fsutil::open_file_reader(&self.meminfo_path)?;
        let info = MemInfo::from_reader(&mut buf).map_err(|source| Error::Read {
            path: self.meminfo_path.clone(),
            source,
        })?;

        let missing = |field| Error::MissingField {
            field,
            path: self.meminfo_path.clone(),
        };
        Ok(MemorySnapshot {
            total_kb: info.mem_total_kb.ok_or_else(|| missing("MemTotal"))?,
            free_kb: info.mem_free_kb.ok_or_else(|| missing("MemFree"))?,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn proc_dir(stat: &str, meminfo: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stat"), stat).unwrap();
        std::fs::write(dir.path().join("meminfo"), meminfo).unwrap();
        dir
    }

    #[test]
    fn test_read_cpu_counters() {
        let dir = proc_dir(
            "cpu  2 0 2 8 0 0 0 0 0 0\ncpu0 100 0 50 800 20 5 5 20 40 0\n",
            "",
        );
        let reader = ProcfsReader::new(dir.path());

        let snapshot = reader.read_cpu_counters(0).unwrap();
        assert_eq!(
            snapshot,
            CounterSnapshot {
                core_id: 0,
                idle_ticks: 820,
                total_ticks: 1000,
            }
        );
    }

    #[test]
    fn test_read_cpu_counters_core_not_found() {
        let dir = proc_dir("cpu0 1 2 3 4 5 6 7 8\n", "");
        let reader = ProcfsReader::new(dir.path());

        match reader.read_cpu_counters(3).unwrap_err() {
            Error::CoreNotFound { core_id, path } => {
                assert_eq!(core_id, 3);
                assert_eq!(path, dir.path().join("stat"));
            }
            err => panic!("Expected CoreNotFound error, got {err}"),
        }
    }

    #[test]
    fn test_read_cpu_counters_malformed_line() {
        let dir = proc_dir("cpu0 1 2 3\n", "");
        let reader = ProcfsReader::new(dir.path());

        match reader.read_cpu_counters(0).unwrap_err() {
            Error::Read { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::InvalidData)
            }
            err => panic!("Expected Read error, got {err}"),
        }
    }

    #[test]
    fn test_read_memory_counters() {
        let dir = proc_dir(
            "",
            "MemTotal:        8000000 kB\nMemFree:         2000000 kB\nMemAvailable:    4000000 kB\n",
        );
        let reader = ProcfsReader::new(dir.path());

        assert_eq!(
            reader.read_memory_counters().unwrap(),
            MemorySnapshot {
                total_kb: 8_000_000,
                free_kb: 2_000_000,
            }
        );
    }

    #[test]
    fn test_read_memory_counters_missing_field() {
        let dir = proc_dir("", "MemTotal:        8000000 kB\n");
        let reader = ProcfsReader::new(dir.path());

        match reader.read_memory_counters().unwrap_err() {
            Error::MissingField { field, .. } => assert_eq!(field, "MemFree"),
            err => panic!("Expected MissingField error, got {err}"),
        }
    }

    #[test]
    fn test_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let reader = ProcfsReader::new(dir.path().join("missing"));

        assert!(matches!(
            reader.read_cpu_counters(0),
            Err(Error::SourceUnavailable(_))
        ));
        assert!(matches!(
            reader.read_memory_counters(),
            Err(Error::SourceUnavailable(_))
        ));
    }

    #[test]
    fn test_default_reader_points_at_proc() {
        let reader = ProcfsReader::default();
        assert_eq!(reader.stat_path(), Path::new("/proc/stat"));
        assert_eq!(reader.meminfo_path(), Path::new("/proc/meminfo"));
    }
}
