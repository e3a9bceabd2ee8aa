//! Generic parsing of key/value style procfs records such as `/proc/meminfo`.
//!
//! Implementors of [`KeyValueStat`] describe the keys they care about as a table of setter
//! functions; the provided [`KeyValueStat::from_reader`] walks the input line by line, applies
//! known keys and ignores everything else. A known key may appear only once, and reading
//! stops as soon as every known key has been seen.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::OnceLock;
//! use citadel_monitor::procfs::KeyValueStat;
//!
//! #[derive(Default)]
//! struct Vmstat {
//!     pgfault: u64,
//! }
//!
//! impl Vmstat {
//!     fn set_pgfault(&mut self, v: u64) {
//!         self.pgfault = v;
//!     }
//! }
//!
//! static HANDLERS: OnceLock<HashMap<&'static str, fn(&mut Vmstat, u64)>> = OnceLock::new();
//!
//! impl KeyValueStat for Vmstat {
//!     const KEY_SUFFIX: Option<char> = None;
//!
//!     fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
//!         HANDLERS.get_or_init(|| {
//!             let mut map = HashMap::new();
//!             map.insert("pgfault", Vmstat::set_pgfault as fn(&mut Vmstat, u64));
//!             map
//!         })
//!     }
//! }
//!
//! let stat = Vmstat::from_reader(&mut "nr_free_pages 12\npgfault 99\n".as_bytes()).unwrap();
//! assert_eq!(stat.pgfault, 99);
//! ```

use std::collections::{HashMap, HashSet};
use std::io::BufRead;

use super::StatParseError;

/// A record made of one `key value [unit]` pair per line.
pub trait KeyValueStat: Default
where
    Self: 'static,
{
    /// Character terminating every key, stripped before lookup (`:` for `/proc/meminfo`).
    const KEY_SUFFIX: Option<char>;

    /// Known field names mapped to the functions storing their value.
    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)>;

    /// Parses a key/value formatted buffer.
    ///
    /// # Errors
    /// Returns an `io::Error` if reading fails, or a [`StatParseError`] wrapped in an
    /// `io::Error` if a known key carries a malformed or duplicate value.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut stat = Self::default();
        let handlers = Self::field_handlers();
        let field_count = handlers.len();
        let mut seen_keys = HashSet::with_capacity(field_count);

        let mut line = String::new();
        let mut lineno = 0;
        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            Self::parse_line(&mut stat, &line, lineno, handlers, &mut seen_keys)?;
            if seen_keys.len() == field_count {
                break;
            }

            line.clear();
        }

        Ok(stat)
    }

    /// Parses the first `key value` pair of a line; trailing tokens such as `kB` are ignored.
    fn parse_line(
        stat: &mut Self,
        line: &str,
        lineno: usize,
        handlers: &HashMap<&'static str, fn(&mut Self, u64)>,
        seen_keys: &mut HashSet<&'static str>,
    ) -> std::io::Result<()> {
        let mut parts = line.split_whitespace();
        let (Some(raw_key), Some(val)) = (parts.next(), parts.next()) else {
            return Ok(());
        };
        let key = Self::KEY_SUFFIX
            .and_then(|suffix| raw_key.strip_suffix(suffix))
            .unwrap_or(raw_key);

        let Some((k, handler)) = handlers.get_key_value(key) else {
            return Ok(());
        };
        let parsed = val
            .parse::<u64>()
            .map_err(|source| StatParseError::InvalidKeyValue {
                key: key.to_string(),
                value: val.to_string(),
                line: lineno,
                source,
            })?;
        if !seen_keys.insert(*k) {
            return Err(StatParseError::DuplicateField {
                field: key.to_string(),
                line: lineno,
            }
            .into());
        }
        handler(stat, parsed);
        Ok(())
    }
}
