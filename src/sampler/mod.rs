//! Derived metrics computed from raw kernel counters.
//!
//! - [`cpu`]: utilization of one logical core over a short sampling window.
//! - [`memory`]: used and free system memory in whole megabytes.
pub mod cpu;
mod error;
pub mod memory;

pub use cpu::{CPU_SAMPLE_INTERVAL, cpu_utilization, sample_cpu_usage};
pub use error::{Error, Result};
pub use memory::{MemoryUsage, sample_memory_usage};
