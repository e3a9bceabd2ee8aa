use super::{Error, Result};
use crate::procfs::{CounterSource, MemorySnapshot};

const KB_PER_MB: u64 = 1024;

/// Used and free system memory, in whole megabytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUsage {
    pub used_mb: u64,
    pub free_mb: u64,
}

impl TryFrom<MemorySnapshot> for MemoryUsage {
    type Error = Error;

    /// Megabyte values are truncated, never rounded up.
    fn try_from(snapshot: MemorySnapshot) -> Result<Self> {
        let MemorySnapshot { total_kb, free_kb } = snapshot;
        let used_kb = total_kb
            .checked_sub(free_kb)
            .ok_or(Error::InconsistentMemory { total_kb, free_kb })?;

        Ok(Self {
            used_mb: used_kb / KB_PER_MB,
            free_mb: free_kb / KB_PER_MB,
        })
    }
}

/// Reads the memory totals once and derives used/free megabytes.
///
/// # Errors
///
/// Returns [`Error::Read`] if the counters cannot be read, or [`Error::InconsistentMemory`]
/// if the source reports more free than total memory.
pub fn sample_memory_usage<S>(source: &S) -> Result<MemoryUsage>
where
    S: CounterSource + ?Sized,
{
    MemoryUsage::try_from(source.read_memory_counters()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procfs;
    use crate::procfs::fake::FakeCounters;

    #[test]
    fn test_truncates_to_megabytes() {
        let source = FakeCounters::default().with_memory(8_000_000, 2_000_000);
        assert_eq!(
            sample_memory_usage(&source).unwrap(),
            MemoryUsage {
                used_mb: 5859,
                free_mb: 1953,
            }
        );
    }

    #[test]
    fn test_sum_never_exceeds_total() {
        for (total_kb, free_kb) in [(8_000_000, 2_000_000), (1023, 1023), (2047, 1025), (5, 0)] {
            let usage = MemoryUsage::try_from(MemorySnapshot { total_kb, free_kb }).unwrap();
            assert!(usage.used_mb + usage.free_mb <= total_kb / KB_PER_MB);
        }
    }

    #[test]
    fn test_free_above_total_is_an_error() {
        let source = FakeCounters::default().with_memory(1_000, 2_000);
        match sample_memory_usage(&source).unwrap_err() {
            Error::InconsistentMemory { total_kb, free_kb } => {
                assert_eq!(total_kb, 1_000);
                assert_eq!(free_kb, 2_000);
            }
            err => panic!("Expected InconsistentMemory error, got {err}"),
        }
    }

    #[test]
    fn test_read_failure_is_propagated() {
        let source = FakeCounters::unavailable();
        assert!(matches!(
            sample_memory_usage(&source),
            Err(Error::Read(procfs::Error::SourceUnavailable(_)))
        ));
    }
}
