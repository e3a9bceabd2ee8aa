use crate::procfs;

/// Errors produced while deriving a metric from kernel counters.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Read(#[from] procfs::Error),

    #[error(
        "counters of core {core_id} went backwards (total ticks {previous_total} -> {current_total})"
    )]
    CounterWrapped {
        core_id: u32,
        previous_total: u64,
        current_total: u64,
    },

    #[error("free memory ({free_kb} kB) exceeds total memory ({total_kb} kB)")]
    InconsistentMemory { total_kb: u64, free_kb: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
