use crate::kstat::{ArcStats, CacheStatus, PrefetchStats, TxStats};
use std::fmt;

/// Demand data hit ratio below this suggests the working set outgrew the ARC
const DEMAND_DATA_LOW: f64 = 80.0;
/// Prefetched data or prefetcher hit ratio below this is mostly wasted work
const PREFETCH_LOW: f64 = 25.0;
/// L2ARC hit ratio below this means the cache device adds little
const L2ARC_LOW: f64 = 10.0;
/// Share of prefetcher lookups hitting the stream limit worth reporting
const STREAM_LIMIT_SHARE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Ok,
    Notice,
    Warning,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Ok => " OK ",
            Severity::Notice => "NOTE",
            Severity::Warning => "WARN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub severity: Severity,
    pub subject: &'static str,
    pub message: String,
}

impl Finding {
    fn new(severity: Severity, subject: &'static str, message: String) -> Self {
        Self {
            severity,
            subject,
            message,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity.label(), self.subject, self.message)
    }
}

/// Everything the analyzer read in one pass
#[derive(Debug, Clone, Default)]
pub struct KstatSnapshot {
    pub arc: ArcStats,
    pub prefetch: Option<PrefetchStats>,
    pub tx: Option<TxStats>,
}

/// Apply every heuristic, grouped by subject in report order
pub fn analyze(snapshot: &KstatSnapshot) -> Vec<Finding> {
    let mut findings = analyze_arc(&snapshot.arc);
    if snapshot.arc.l2.is_present() {
        findings.extend(analyze_l2arc(&snapshot.arc));
    }
    if let Some(prefetch) = &snapshot.prefetch {
        findings.extend(analyze_prefetch(prefetch));
    }
    if let Some(tx) = &snapshot.tx {
        findings.extend(analyze_tx(tx));
    }
    findings
}

pub fn analyze_arc(arc: &ArcStats) -> Vec<Finding> {
    let mut findings = Vec::new();

    if arc.hits + arc.misses == 0 {
        findings.push(Finding::new(
            Severity::Notice,
            "ARC",
            "no lookups recorded yet, ratios are not meaningful".to_string(),
        ));
    } else {
        let ratio = arc.hit_ratio();
        let status = CacheStatus::from_hit_rate(ratio);
        let severity = match status {
            CacheStatus::Excellent | CacheStatus::Good => Severity::Ok,
            CacheStatus::Fair => Severity::Notice,
            CacheStatus::Poor => Severity::Warning,
        };
        findings.push(Finding::new(
            severity,
            "ARC",
            format!("hit ratio {:.1}% is {}", ratio, status.to_string().to_lowercase()),
        ));
    }

    if arc.demand_data_hits + arc.demand_data_misses > 0
        && arc.demand_data_hit_ratio() < DEMAND_DATA_LOW
    {
        findings.push(Finding::new(
            Severity::Notice,
            "ARC",
            format!(
                "demand data hit ratio {:.1}% is low, the working set may not fit in the ARC",
                arc.demand_data_hit_ratio()
            ),
        ));
    }

    if arc.prefetch_data_hits + arc.prefetch_data_misses > 0
        && arc.prefetch_data_hit_ratio() < PREFETCH_LOW
    {
        findings.push(Finding::new(
            Severity::Notice,
            "ARC",
            format!(
                "only {:.1}% of prefetched data is used, prefetching may not suit this workload",
                arc.prefetch_data_hit_ratio()
            ),
        ));
    }

    if arc.memory_throttle_count > 0 {
        findings.push(Finding::new(
            Severity::Warning,
            "ARC",
            format!(
                "throttled by memory pressure {} times",
                arc.memory_throttle_count
            ),
        ));
        if arc.size_percent_of_max() < 50.0 {
            findings.push(Finding::new(
                Severity::Warning,
                "ARC",
                format!(
                    "holds only {:.1}% of c_max while memory is tight",
                    arc.size_percent_of_max()
                ),
            ));
        }
    }

    if arc.arc_no_grow == 1 {
        findings.push(Finding::new(
            Severity::Notice,
            "ARC",
            "currently not allowed to grow (arc_no_grow)".to_string(),
        ));
    }

    findings
}

pub fn analyze_l2arc(arc: &ArcStats) -> Vec<Finding> {
    let l2 = &arc.l2;
    let mut findings = Vec::new();

    if l2.hits + l2.misses > 0 && l2.hit_ratio() < L2ARC_LOW {
        findings.push(Finding::new(
            Severity::Notice,
            "L2ARC",
            format!(
                "hit ratio {:.1}% is low, the cache device serves few reads",
                l2.hit_ratio()
            ),
        ));
    }

    if l2.error_count() > 0 {
        findings.push(Finding::new(
            Severity::Warning,
            "L2ARC",
            format!(
                "{} I/O errors, {} bad checksums, {} write errors on the cache device",
                l2.io_error, l2.cksum_bad, l2.writes_error
            ),
        ));
    }

    findings
}

pub fn analyze_prefetch(prefetch: &PrefetchStats) -> Vec<Finding> {
    let mut findings = Vec::new();
    let lookups = prefetch.lookups();
    if lookups == 0 {
        return findings;
    }

    if prefetch.hit_ratio() < PREFETCH_LOW {
        findings.push(Finding::new(
            Severity::Notice,
            "prefetch",
            format!(
                "hit ratio {:.1}% is low, the access pattern looks mostly random",
                prefetch.hit_ratio()
            ),
        ));
    }

    let limited = prefetch.max_streams as f64 / lookups as f64 * 100.0;
    if limited > STREAM_LIMIT_SHARE {
        findings.push(Finding::new(
            Severity::Notice,
            "prefetch",
            format!(
                "stream limit reached on {:.1}% of lookups, consider raising zfetch_max_streams",
                limited
            ),
        ));
    }

    findings
}

pub fn analyze_tx(tx: &TxStats) -> Vec<Finding> {
    let mut findings = Vec::new();

    if tx.dirty_delay > 0 {
        findings.push(Finding::new(
            Severity::Notice,
            "txg",
            format!(
                "writes were delayed {} times by the dirty data throttle",
                tx.dirty_delay
            ),
        ));
    }

    if tx.dirty_throttle > 0 {
        findings.push(Finding::new(
            Severity::Warning,
            "txg",
            format!(
                "writes were blocked {} times at zfs_dirty_data_max",
                tx.dirty_throttle
            ),
        ));
    }

    if tx.memory_reclaim > 0 {
        findings.push(Finding::new(
            Severity::Warning,
            "txg",
            format!(
                "transactions waited {} times for memory reclaim",
                tx.memory_reclaim
            ),
        ));
    }

    findings
}
