//! One full measurement pass over every configured metric.
//!
//! [`SnapshotEngine::capture_snapshot`] walks the configured metrics in order and turns each
//! sample, successful or not, into a [`Reading`]. A failing core or memory read becomes an
//! error line in the snapshot; it never stops the remaining readings.
//!
//! Rendered, a snapshot is one line per reading:
//!
//! ```text
//! CPU Core 0: 12.5%
//! CPU Core 1: Error reading usage (core 1 not found in `/proc/stat`)
//! Memory Used: 5859 MB
//! Memory Free: 1953 MB
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use crate::config::{Config, MemoryField, MetricSpec};
use crate::procfs::CounterSource;
use crate::sampler::{self, CPU_SAMPLE_INTERVAL, MemoryUsage};

/// Outcome of sampling one core or one memory field.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    CpuUsage { core_id: u32, percent: f64 },
    CpuFailed { core_id: u32, reason: String },
    Memory { field: MemoryField, megabytes: u64 },
    MemoryFailed { field: MemoryField, reason: String },
}

impl Reading {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Reading::CpuFailed { .. } | Reading::MemoryFailed { .. }
        )
    }
}

/// Significant digits kept when printing a utilization percentage.
const PERCENT_DIGITS: i32 = 6;

/// Formats `value` in fixed notation rounded to `digits` significant digits, without
/// trailing zeros (`56.99999999999999` prints as `57`, `100.0 / 3.0` as `33.3333`).
fn significant(value: f64, digits: i32) -> String {
    if value == 0.0 || !value.is_finite() {
        return value.to_string();
    }
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = usize::try_from(digits - 1 - magnitude).unwrap_or(0);
    let fixed = format!("{value:.decimals$}");
    if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        fixed
    }
}

fn memory_label(field: MemoryField) -> &'static str {
    match field {
        MemoryField::Used => "Memory Used",
        MemoryField::Free => "Memory Free",
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::CpuUsage { core_id, percent } => {
                write!(f, "CPU Core {core_id}: {}%", significant(*percent, PERCENT_DIGITS))
            }
            Reading::CpuFailed { core_id, reason } => {
                write!(f, "CPU Core {core_id}: Error reading usage ({reason})")
            }
            Reading::Memory { field, megabytes } => {
                write!(f, "{}: {megabytes} MB", memory_label(*field))
            }
            Reading::MemoryFailed { field, reason } => {
                write!(f, "{}: Error reading usage ({reason})", memory_label(*field))
            }
        }
    }
}

/// The readings of one pass, in configured order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    readings: Vec<Reading>,
}

impl Snapshot {
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn failures(&self) -> usize {
        self.readings.iter().filter(|r| r.is_failure()).count()
    }

    /// The text block handed to the outputs, one newline-terminated line per reading.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for reading in &self.readings {
            writeln!(f, "{reading}")?;
        }
        Ok(())
    }
}

/// Runs measurement passes against a [`CounterSource`].
#[derive(Debug)]
pub struct SnapshotEngine<S> {
    source: S,
    sample_interval: Duration,
}

impl<S: CounterSource> SnapshotEngine<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            sample_interval: CPU_SAMPLE_INTERVAL,
        }
    }

    /// Overrides the per-core CPU sampling window.
    pub fn with_sample_interval(mut self, sample_interval: Duration) -> Self {
        self.sample_interval = sample_interval;
        self
    }

    /// Samples every configured metric once, in configured order.
    ///
    /// CPU cores are sampled one after another, so a pass takes at least one sampling
    /// interval per configured core.
    pub async fn capture_snapshot(&self, config: &Config) -> Snapshot {
        let before = Instant::now();
        let mut readings = Vec::new();

        for metric in config.metrics() {
            match metric {
                MetricSpec::Cpu { core_ids } => {
                    for &core_id in core_ids {
                        readings.push(self.sample_core(core_id).await);
                    }
                }
                MetricSpec::Memory { fields } => {
                    self.sample_memory(fields, &mut readings);
                }
            }
        }

        let snapshot = Snapshot { readings };
        log::trace!(
            "captured {} readings ({} failed) in {} ms",
            snapshot.readings.len(),
            snapshot.failures(),
            before.elapsed().as_millis()
        );
        snapshot
    }

    async fn sample_core(&self, core_id: u32) -> Reading {
        match sampler::sample_cpu_usage(&self.source, core_id, self.sample_interval).await {
            Ok(fraction) => Reading::CpuUsage {
                core_id,
                percent: fraction * 100.0,
            },
            Err(err) => {
                log::warn!("failed sampling cpu usage: core_id={core_id}, error={err}");
                Reading::CpuFailed {
                    core_id,
                    reason: err.to_string(),
                }
            }
        }
    }

    fn sample_memory(&self, fields: &[MemoryField], readings: &mut Vec<Reading>) {
        match sampler::sample_memory_usage(&self.source) {
            Ok(MemoryUsage { used_mb, free_mb }) => {
                readings.extend(fields.iter().map(|&field| Reading::Memory {
                    field,
                    megabytes: match field {
                        MemoryField::Used => used_mb,
                        MemoryField::Free => free_mb,
                    },
                }));
            }
            Err(err) => {
                log::warn!("failed sampling memory usage: error={err}");
                let reason = err.to_string();
                readings.extend(fields.iter().map(|&field| Reading::MemoryFailed {
                    field,
                    reason: reason.clone(),
                }));
            }
        }
    }
}
