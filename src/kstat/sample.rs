use super::parser::KstatTable;
use crate::error::DiagResult;
use std::collections::BTreeMap;

/// Fixed allow-list of counter names tracked from one kstat file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSet {
    names: &'static [&'static str],
}

impl CounterSet {
    pub const fn new(names: &'static [&'static str]) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &'static [&'static str] {
        self.names
    }
}

/// Point-in-time snapshot of a counter file
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    timestamp: u64,
    counters: BTreeMap<&'static str, u64>,
}

impl Sample {
    /// All-zero baseline used for the first pass
    pub fn zero(set: CounterSet) -> Self {
        Self {
            timestamp: 0,
            counters: set.names().iter().map(|name| (*name, 0)).collect(),
        }
    }

    /// Capture the allow-listed counters of a parsed kstat table.
    ///
    /// Counters missing from the table read as 0, names outside the set are
    /// ignored, and a tracked counter that is not an integer fails the whole
    /// sample.
    pub fn from_table(table: &KstatTable, set: CounterSet) -> DiagResult<Self> {
        let mut counters = BTreeMap::new();
        for name in set.names() {
            let value = table.value_u64(name)?;
            if value.is_none() {
                tracing::debug!(counter = *name, source = table.source(), "counter absent, reading as 0");
            }
            counters.insert(*name, value.unwrap_or(0));
        }
        Ok(Self {
            timestamp: table.snaptime,
            counters,
        })
    }

    #[cfg(test)]
    pub fn from_values(timestamp: u64, values: &[(&'static str, u64)]) -> Self {
        Self {
            timestamp,
            counters: values.iter().copied().collect(),
        }
    }

    /// Timestamp in nanoseconds
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.counters.keys().copied()
    }
}
