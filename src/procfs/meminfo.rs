//! Parsing of `/proc/meminfo`.
//!
//! Only `MemTotal` and `MemFree` are kept; both are reported by the kernel in kilobytes.
//!
//! ```rust
//! use citadel_monitor::procfs::{KeyValueStat, MemInfo};
//!
//! let data = "MemTotal:       16318792 kB\nMemFree:         1220864 kB\n";
//! let info = MemInfo::from_reader(&mut data.as_bytes()).unwrap();
//! assert_eq!(info.mem_total_kb, Some(16318792));
//! assert_eq!(info.mem_free_kb, Some(1220864));
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use super::KeyValueStat;

/// The subset of `/proc/meminfo` the memory sampler needs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemInfo {
    /// `MemTotal`, in kB.
    pub mem_total_kb: Option<u64>,
    /// `MemFree`, in kB.
    pub mem_free_kb: Option<u64>,
}

impl MemInfo {
    fn set_mem_total(&mut self, v: u64) {
        self.mem_total_kb = Some(v);
    }

    fn set_mem_free(&mut self, v: u64) {
        self.mem_free_kb = Some(v);
    }
}

type Setter = fn(&mut MemInfo, u64);

static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(2);

    m.insert("MemTotal", MemInfo::set_mem_total);
    m.insert("MemFree", MemInfo::set_mem_free);

    m
});

impl KeyValueStat for MemInfo {
    const KEY_SUFFIX: Option<char> = Some(':');

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &SETTERS
    }
}
