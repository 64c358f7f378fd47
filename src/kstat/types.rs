use super::parser::KstatTable;
use super::rate::hit_ratio;
use crate::error::DiagResult;

/// ARC (Adaptive Replacement Cache) counters from `arcstats`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArcStats {
    pub hits: u64,
    pub misses: u64,
    pub demand_data_hits: u64,
    pub demand_data_misses: u64,
    pub prefetch_data_hits: u64,
    pub prefetch_data_misses: u64,
    pub size: u64,  // Current cache size in bytes
    pub c: u64,     // Target cache size in bytes
    pub c_min: u64, // Lower bound of the target in bytes
    pub c_max: u64, // Upper bound of the target in bytes
    pub memory_throttle_count: u64,
    pub arc_no_grow: u64,
    pub l2: L2ArcStats,
}

/// L2ARC (Level 2 ARC) counters, all zero when no cache device is attached
#[derive(Debug, Clone, Default, PartialEq)]
pub struct L2ArcStats {
    pub hits: u64,
    pub misses: u64,
    pub size: u64, // Cache size in bytes
    pub io_error: u64,
    pub cksum_bad: u64,
    pub writes_error: u64,
}

/// Prefetcher counters from `zfetchstats`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrefetchStats {
    pub hits: u64,
    pub misses: u64,
    pub max_streams: u64,
}

/// Transaction assignment counters from `dmu_tx`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TxStats {
    pub assigned: u64,
    pub delay: u64,
    pub dirty_throttle: u64,
    pub dirty_delay: u64,
    pub memory_reclaim: u64,
}

impl ArcStats {
    pub fn from_table(table: &KstatTable) -> DiagResult<Self> {
        Ok(Self {
            hits: table.required_u64("hits")?,
            misses: table.required_u64("misses")?,
            demand_data_hits: table.value_or_zero("demand_data_hits")?,
            demand_data_misses: table.value_or_zero("demand_data_misses")?,
            prefetch_data_hits: table.value_or_zero("prefetch_data_hits")?,
            prefetch_data_misses: table.value_or_zero("prefetch_data_misses")?,
            size: table.required_u64("size")?,
            c: table.value_or_zero("c")?,
            c_min: table.value_or_zero("c_min")?,
            c_max: table.required_u64("c_max")?,
            memory_throttle_count: table.value_or_zero("memory_throttle_count")?,
            arc_no_grow: table.value_or_zero("arc_no_grow")?,
            l2: L2ArcStats {
                hits: table.value_or_zero("l2_hits")?,
                misses: table.value_or_zero("l2_misses")?,
                size: table.value_or_zero("l2_size")?,
                io_error: table.value_or_zero("l2_io_error")?,
                cksum_bad: table.value_or_zero("l2_cksum_bad")?,
                writes_error: table.value_or_zero("l2_writes_error")?,
            },
        })
    }

    pub fn hit_ratio(&self) -> f64 {
        hit_ratio(self.hits as i128, self.misses as i128)
    }

    pub fn demand_data_hit_ratio(&self) -> f64 {
        hit_ratio(self.demand_data_hits as i128, self.demand_data_misses as i128)
    }

    pub fn prefetch_data_hit_ratio(&self) -> f64 {
        hit_ratio(self.prefetch_data_hits as i128, self.prefetch_data_misses as i128)
    }

    /// Current size as a percentage of `c_max`
    pub fn size_percent_of_max(&self) -> f64 {
        if self.c_max == 0 {
            0.0
        } else {
            self.size as f64 / self.c_max as f64 * 100.0
        }
    }
}

impl L2ArcStats {
    pub fn is_present(&self) -> bool {
        self.size > 0
    }

    pub fn hit_ratio(&self) -> f64 {
        hit_ratio(self.hits as i128, self.misses as i128)
    }

    pub fn error_count(&self) -> u64 {
        self.io_error + self.cksum_bad + self.writes_error
    }
}

impl PrefetchStats {
    pub fn from_table(table: &KstatTable) -> DiagResult<Self> {
        Ok(Self {
            hits: table.value_or_zero("hits")?,
            misses: table.value_or_zero("misses")?,
            max_streams: table.value_or_zero("max_streams")?,
        })
    }

    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn hit_ratio(&self) -> f64 {
        hit_ratio(self.hits as i128, self.misses as i128)
    }
}

impl TxStats {
    pub fn from_table(table: &KstatTable) -> DiagResult<Self> {
        Ok(Self {
            assigned: table.value_or_zero("dmu_tx_assigned")?,
            delay: table.value_or_zero("dmu_tx_delay")?,
            dirty_throttle: table.value_or_zero("dmu_tx_dirty_throttle")?,
            dirty_delay: table.value_or_zero("dmu_tx_dirty_delay")?,
            memory_reclaim: table.value_or_zero("dmu_tx_memory_reclaim")?,
        })
    }
}

/// Overall cache performance status
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheStatus {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl CacheStatus {
    /// Determine status based on hit rate percentage
    pub fn from_hit_rate(hit_rate: f64) -> Self {
        if hit_rate >= 85.0 {
            CacheStatus::Excellent
        } else if hit_rate >= 70.0 {
            CacheStatus::Good
        } else if hit_rate >= 50.0 {
            CacheStatus::Fair
        } else {
            CacheStatus::Poor
        }
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CacheStatus::Excellent => write!(f, "Excellent"),
            CacheStatus::Good => write!(f, "Good"),
            CacheStatus::Fair => write!(f, "Fair"),
            CacheStatus::Poor => write!(f, "Poor"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagError;

    #[test]
    fn test_cache_status_thresholds() {
        assert_eq!(CacheStatus::from_hit_rate(99.0), CacheStatus::Excellent);
        assert_eq!(CacheStatus::from_hit_rate(85.0), CacheStatus::Excellent);
        assert_eq!(CacheStatus::from_hit_rate(70.0), CacheStatus::Good);
        assert_eq!(CacheStatus::from_hit_rate(50.0), CacheStatus::Fair);
        assert_eq!(CacheStatus::from_hit_rate(49.9), CacheStatus::Poor);
        assert_eq!(CacheStatus::Fair.to_string(), "Fair");
    }

    #[test]
    fn test_arc_stats_from_table() {
        let table = KstatTable::parse(
            "arcstats",
            "13 1 0x01 6 288 10 20\nname type data\nhits 4 900\nmisses 4 100\nsize 4 512\nc_max 4 1024\nl2_size 4 0\nl2_hits 4 3\n",
        )
        .unwrap();
        let arc = ArcStats::from_table(&table).unwrap();
        assert_eq!(arc.hit_ratio(), 90.0);
        assert_eq!(arc.size_percent_of_max(), 50.0);
        assert_eq!(arc.memory_throttle_count, 0);
        assert!(!arc.l2.is_present());
    }

    #[test]
    fn test_arc_stats_requires_core_counters() {
        let table = KstatTable::parse(
            "arcstats",
            "13 1 0x01 2 96 10 20\nname type data\nhits 4 900\nmisses 4 100\n",
        )
        .unwrap();
        assert!(matches!(
            ArcStats::from_table(&table),
            Err(DiagError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_prefetch_stats_defaults_missing_counters() {
        let table = KstatTable::parse("zfetchstats", "5 1 0x01 0 0 10 20\n").unwrap();
        let prefetch = PrefetchStats::from_table(&table).unwrap();
        assert_eq!(prefetch, PrefetchStats::default());
        assert_eq!(prefetch.hit_ratio(), 0.0);
    }
}
