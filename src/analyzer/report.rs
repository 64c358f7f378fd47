use super::heuristics::{Finding, KstatSnapshot, Severity};
use crate::display::{ProgressBar, Terminal, format_bytes, format_bytes_ratio, format_count, format_percent};
use crate::kstat::CacheStatus;
use std::fmt::Write;

const LABEL_WIDTH: usize = 18;
const BAR_WIDTH: usize = 20;

/// Render the full analyzer report: counter sections, then findings
pub fn render(snapshot: &KstatSnapshot, findings: &[Finding], terminal: &Terminal) -> String {
    let bar = ProgressBar::new(BAR_WIDTH, terminal);
    let mut out = String::new();
    let arc = &snapshot.arc;

    section(&mut out, "ARC (Adaptive Replacement Cache)");
    row(
        &mut out,
        "Hit ratio",
        &bar.render(
            arc.hit_ratio(),
            Some(&format!("({})", CacheStatus::from_hit_rate(arc.hit_ratio()))),
        ),
    );
    row(&mut out, "Demand data", &bar.render(arc.demand_data_hit_ratio(), None));
    row(&mut out, "Prefetch data", &bar.render(arc.prefetch_data_hit_ratio(), None));
    row(
        &mut out,
        "Size",
        &format!(
            "{} ({} of c_max)",
            format_bytes_ratio(arc.size, arc.c_max),
            format_percent(arc.size_percent_of_max())
        ),
    );
    row(&mut out, "Target (c)", &format_bytes(arc.c));
    row(&mut out, "Minimum (c_min)", &format_bytes(arc.c_min));
    row(&mut out, "Lookups", &format_count(arc.hits + arc.misses));
    row(&mut out, "Memory throttles", &format_count(arc.memory_throttle_count));

    if arc.l2.is_present() {
        section(&mut out, "L2ARC (Level 2 ARC)");
        row(&mut out, "Hit ratio", &bar.render(arc.l2.hit_ratio(), None));
        row(&mut out, "Size", &format_bytes(arc.l2.size));
        row(&mut out, "Lookups", &format_count(arc.l2.hits + arc.l2.misses));
        row(&mut out, "Errors", &format_count(arc.l2.error_count()));
    }

    if let Some(prefetch) = &snapshot.prefetch {
        section(&mut out, "Prefetcher (zfetch)");
        row(&mut out, "Hit ratio", &bar.render(prefetch.hit_ratio(), None));
        row(&mut out, "Lookups", &format_count(prefetch.lookups()));
        row(&mut out, "Stream limit hits", &format_count(prefetch.max_streams));
    }

    if let Some(tx) = &snapshot.tx {
        section(&mut out, "Transactions (dmu_tx)");
        row(&mut out, "Assigned", &format_count(tx.assigned));
        row(&mut out, "Delayed", &format_count(tx.dirty_delay + tx.delay));
        row(&mut out, "Throttled", &format_count(tx.dirty_throttle));
        row(&mut out, "Memory reclaim", &format_count(tx.memory_reclaim));
    }

    section(&mut out, "Findings");
    for finding in findings {
        let style = terminal.get_severity_style(finding.severity);
        let _ = writeln!(
            out,
            "  [{}] {}: {}",
            terminal.paint(&style, finding.severity.label()),
            finding.subject,
            finding.message
        );
    }
    if findings.iter().all(|f| f.severity == Severity::Ok) {
        let _ = writeln!(out, "  Nothing needs attention.");
    }

    out
}

fn section(out: &mut String, title: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    let _ = writeln!(out, "{}", title);
}

fn row(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "  {:<width$}{}", label, value, width = LABEL_WIDTH);
}
