//! Per-core CPU utilization from two counter snapshots.
//!
//! Utilization is only meaningful as an average over a window, so [`sample_cpu_usage`] reads
//! the core's counters, suspends for the sampling interval and reads them again. The math on
//! the two snapshots lives in [`cpu_utilization`].
//!
//! # Example
//!
//! ```rust
//! use citadel_monitor::procfs::CounterSnapshot;
//! use citadel_monitor::sampler::cpu_utilization;
//!
//! let before = CounterSnapshot { core_id: 0, idle_ticks: 100, total_ticks: 200 };
//! let after = CounterSnapshot { core_id: 0, idle_ticks: 150, total_ticks: 300 };
//! assert_eq!(cpu_utilization(&before, &after).unwrap(), 0.5);
//! ```

use std::time::Duration;

use super::{Error, Result};
use crate::procfs::{CounterSnapshot, CounterSource};

/// Wait between the two counter reads of one core.
pub const CPU_SAMPLE_INTERVAL: Duration = Duration::from_millis(200);

/// Busy fraction of a core between two snapshots, in `[0, 1]`.
///
/// No elapsed ticks yields `0.0`.
///
/// # Errors
///
/// Returns [`Error::CounterWrapped`] if any counter of `current` is behind `previous`, or if
/// more idle ticks than total ticks elapsed.
pub fn cpu_utilization(previous: &CounterSnapshot, current: &CounterSnapshot) -> Result<f64> {
    debug_assert_eq!(previous.core_id, current.core_id);

    let wrapped = || Error::CounterWrapped {
        core_id: current.core_id,
        previous_total: previous.total_ticks,
        current_total: current.total_ticks,
    };
    let total_delta = current
        .total_ticks
        .checked_sub(previous.total_ticks)
        .ok_or_else(wrapped)?;
    let idle_delta = current
        .idle_ticks
        .checked_sub(previous.idle_ticks)
        .ok_or_else(wrapped)?;
    let busy_delta = total_delta.checked_sub(idle_delta).ok_or_else(wrapped)?;

    if total_delta == 0 {
        return Ok(0.0);
    }

    Ok(busy_delta as f64 / total_delta as f64)
}

/// Measures the utilization of `core_id` over `sample_interval`.
///
/// # Errors
///
/// Returns [`Error::Read`] if either counter read fails, or [`Error::CounterWrapped`] if the
/// counters went backwards in between.
pub async fn sample_cpu_usage<S>(source: &S, core_id: u32, sample_interval: Duration) -> Result<f64>
where
    S: CounterSource + ?Sized,
{
    let first = source.read_cpu_counters(core_id)?;
    tokio::time::sleep(sample_interval).await;
    let second = source.read_cpu_counters(core_id)?;

    let usage = cpu_utilization(&first, &second)?;
    log::trace!("core {core_id}: {usage:.4} busy over {sample_interval:?}");
    Ok(usage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procfs::fake::FakeCounters;
    use crate::procfs;

    fn snap(idle_ticks: u64, total_ticks: u64) -> CounterSnapshot {
        CounterSnapshot {
            core_id: 0,
            idle_ticks,
            total_ticks,
        }
    }

    #[test]
    fn test_half_busy() {
        assert_eq!(cpu_utilization(&snap(100, 200), &snap(150, 300)).unwrap(), 0.5);
    }

    #[test]
    fn test_no_elapsed_ticks_is_idle() {
        assert_eq!(cpu_utilization(&snap(100, 200), &snap(100, 200)).unwrap(), 0.0);
    }

    #[test]
    fn test_fully_busy_and_fully_idle() {
        assert_eq!(cpu_utilization(&snap(100, 200), &snap(100, 300)).unwrap(), 1.0);
        assert_eq!(cpu_utilization(&snap(100, 200), &snap(200, 300)).unwrap(), 0.0);
    }

    #[test]
    fn test_result_stays_in_unit_interval() {
        let start = snap(1_000, 5_000);
        for (idle_delta, total_delta) in [(0, 1), (1, 1), (3, 7), (999, 1_000), (1, 1_000_000)] {
            let end = snap(1_000 + idle_delta, 5_000 + total_delta);
            let usage = cpu_utilization(&start, &end).unwrap();
            assert!((0.0..=1.0).contains(&usage), "{usage} out of range");
        }
    }

    #[test]
    fn test_total_going_backwards_is_an_error() {
        match cpu_utilization(&snap(100, 300), &snap(100, 200)).unwrap_err() {
            Error::CounterWrapped {
                core_id,
                previous_total,
                current_total,
            } => {
                assert_eq!(core_id, 0);
                assert_eq!(previous_total, 300);
                assert_eq!(current_total, 200);
            }
            err => panic!("Expected CounterWrapped error, got {err}"),
        }
    }

    #[test]
    fn test_idle_going_backwards_is_an_error() {
        assert!(matches!(
            cpu_utilization(&snap(150, 200), &snap(100, 300)),
            Err(Error::CounterWrapped { .. })
        ));
    }

    #[test]
    fn test_idle_outpacing_total_is_an_error() {
        assert!(matches!(
            cpu_utilization(&snap(100, 200), &snap(250, 300)),
            Err(Error::CounterWrapped { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sample_waits_between_reads() {
        let source = FakeCounters::default().with_core(0, &[(100, 200), (150, 300)]);
        let start = tokio::time::Instant::now();

        let usage = sample_cpu_usage(&source, 0, CPU_SAMPLE_INTERVAL)
            .await
            .unwrap();

        assert_eq!(usage, 0.5);
        assert!(start.elapsed() >= CPU_SAMPLE_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_counters_report_zero() {
        let source = FakeCounters::default().with_core(2, &[(500, 900)]);

        for _ in 0..3 {
            let usage = sample_cpu_usage(&source, 2, CPU_SAMPLE_INTERVAL)
                .await
                .unwrap();
            assert_eq!(usage, 0.0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_core_is_an_error_not_a_value() {
        let source = FakeCounters::default().with_core(0, &[(1, 2)]);

        let err = sample_cpu_usage(&source, 5, CPU_SAMPLE_INTERVAL)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Read(procfs::Error::CoreNotFound { core_id: 5, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_source_is_an_error() {
        let source = FakeCounters::unavailable();

        let err = sample_cpu_usage(&source, 0, CPU_SAMPLE_INTERVAL)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Read(procfs::Error::SourceUnavailable(_))
        ));
    }
}
