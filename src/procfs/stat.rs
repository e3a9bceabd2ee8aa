use std::io::BufRead;

use super::StatParseError;

/// Fields every `cpuN` line carries since Linux 2.6.11 (user through steal).
const MIN_CPU_FIELDS: usize = 8;
const MAX_CPU_FIELDS: usize = 10;

/// Time spent by one logical core in each CPU state, in ticks, as reported by `/proc/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    /// Already accounted in `user`, never summed into the totals.
    pub guest: u64,
    /// Already accounted in `nice`, never summed into the totals.
    pub guest_nice: u64,
}

impl CpuTimes {
    /// Ticks spent idle or waiting on I/O.
    pub fn idle_ticks(&self) -> u64 {
        self.idle.saturating_add(self.iowait)
    }

    /// Idle ticks plus every busy state, guest time excluded.
    pub fn total_ticks(&self) -> u64 {
        [
            self.user,
            self.nice,
            self.system,
            self.irq,
            self.softirq,
            self.steal,
        ]
        .into_iter()
        .fold(self.idle_ticks(), u64::saturating_add)
    }

    /// Builds the counters from the numeric fields following the `cpuN` label.
    ///
    /// Fields past `guest_nice` are ignored, missing `guest`/`guest_nice` read as zero.
    fn from_fields<'a>(
        fields: impl Iterator<Item = &'a str>,
        line: usize,
    ) -> Result<Self, StatParseError> {
        let mut values = [0u64; MAX_CPU_FIELDS];
        let mut found = 0;
        for (slot, field) in values.iter_mut().zip(fields) {
            *slot = field
                .parse()
                .map_err(|source| StatParseError::InvalidValue {
                    value: field.to_string(),
                    line,
                    source,
                })?;
            found += 1;
        }

        if found < MIN_CPU_FIELDS {
            return Err(StatParseError::MissingFields {
                expected: MIN_CPU_FIELDS,
                found,
                line,
            });
        }

        let [
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
            steal,
            guest,
            guest_nice,
        ] = values;
        Ok(Self {
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
            steal,
            guest,
            guest_nice,
        })
    }

    /// Scans a `/proc/stat` formatted buffer for the line labelled exactly `cpu<core_id>`.
    ///
    /// Returns `Ok(None)` if no such line exists.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if reading fails, or a [`StatParseError`] wrapped in an
    /// `io::Error` if the matching line is malformed.
    ///
    /// ```rust
    /// use citadel_monitor::procfs::CpuTimes;
    ///
    /// let data = "cpu  10 0 10 80 0 0 0 0 0 0\ncpu0 5 0 5 40 0 0 0 0 0 0\n";
    /// let times = CpuTimes::find_core(&mut data.as_bytes(), 0).unwrap().unwrap();
    /// assert_eq!(times.idle_ticks(), 40);
    /// assert_eq!(times.total_ticks(), 50);
    /// ```
    pub fn find_core<R: BufRead>(buf: &mut R, core_id: u32) -> std::io::Result<Option<Self>> {
        let label = format!("cpu{core_id}");
        let mut line = String::new();
        let mut lineno = 0;

        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            let mut parts = line.split_whitespace();
            if parts.next() == Some(label.as_str()) {
                return Ok(Some(Self::from_fields(parts, lineno)?));
            }
            line.clear();
        }

        Ok(None)
    }
}
