//! kstat file parsing, counter samples and rate computation

pub mod parser;
pub mod rate;
pub mod sample;
pub mod types;

// Re-export commonly used items
pub use parser::KstatTable;
pub use rate::DeltaSample;
pub use sample::{CounterSet, Sample};
pub use types::{ArcStats, CacheStatus, PrefetchStats, TxStats};

/// Default location of the SPL kstat files for ZFS
pub const KSTAT_DIR: &str = "/proc/spl/kstat/zfs";
