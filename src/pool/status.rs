use crate::error::{DiagError, DiagResult};
use chrono::{Local, NaiveDateTime, TimeZone};

/// What kind of scan the pool last ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanFunction {
    NoneRequested,
    Scrub,
    Resilver,
    Rebuild,
    Scan,
}

impl ScanFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanFunction::NoneRequested => "none_requested",
            ScanFunction::Scrub => "scrub",
            ScanFunction::Resilver => "resilver",
            ScanFunction::Rebuild => "rebuild",
            ScanFunction::Scan => "scan",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    None,
    Scanning,
    Finished,
    Canceled,
}

impl ScanState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanState::None => "none",
            ScanState::Scanning => "scanning",
            ScanState::Finished => "finished",
            ScanState::Canceled => "canceled",
        }
    }
}

/// Scan progress from the `scan:` block of `zpool status`
#[derive(Debug, Clone, PartialEq)]
pub struct ScanStatus {
    pub function: ScanFunction,
    pub state: ScanState,
    pub errors: u64,
    pub examined: u64,
    /// Examined during the current pass. `zpool status` only prints the
    /// scan total, so this equals `examined`.
    pub pass_examined: u64,
    pub issued: u64,
    pub to_examine: u64,
    pub processed: u64,
    /// Not printed by `zpool status`, always 0
    pub to_process: u64,
    /// `100 * examined / to_examine` when the total is known
    pub pct_done: f64,
    /// Bytes per second scanned, as reported while running
    pub rate: u64,
    pub remaining_secs: u64,
    /// Unix seconds, 0 when not shown
    pub start_ts: i64,
    pub end_ts: i64,
    pub pause_ts: i64,
    /// Seconds spent paused, not printed by `zpool status`
    pub paused_secs: u64,
}

/// Error counters of the pool's root vdev
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VdevErrors {
    pub read: u64,
    pub write: u64,
    pub checksum: u64,
}

/// Parse the `scan:` block, `None` when the status has no scan line
pub fn parse_scan(status: &str) -> Option<ScanStatus> {
    let mut lines = status.lines();
    let first = lines.by_ref().find_map(|line| line.trim().strip_prefix("scan:"))?;

    let mut text = first.trim().to_string();
    for line in lines {
        if !line.starts_with(char::is_whitespace) || line.trim().ends_with(':') || line.trim().is_empty() {
            break;
        }
        text.push_str(", ");
        text.push_str(line.trim());
    }

    Some(parse_scan_text(&text))
}

fn parse_scan_text(text: &str) -> ScanStatus {
    let function = if text.starts_with("none requested") {
        ScanFunction::NoneRequested
    } else if text.starts_with("scrub") {
        ScanFunction::Scrub
    } else if text.starts_with("resilver") {
        ScanFunction::Resilver
    } else if text.starts_with("rebuil") {
        ScanFunction::Rebuild
    } else {
        ScanFunction::Scan
    };

    let state = if function == ScanFunction::NoneRequested {
        ScanState::None
    } else if text.contains("in progress") || text.contains("paused") {
        ScanState::Scanning
    } else if text.contains("canceled") {
        ScanState::Canceled
    } else {
        ScanState::Finished
    };

    // "scrub paused since <date>" is followed by "scrub started on <date>"
    let pause_ts = date_after(text, "paused since ");
    let start_ts = match pause_ts {
        Some(_) => date_after(text, "started on "),
        None => date_after(text, "since "),
    };
    let end_ts = match state {
        ScanState::Finished | ScanState::Canceled => date_after(text, " on "),
        _ => None,
    };

    let mut scan = ScanStatus {
        function,
        state,
        errors: errors_in(text),
        examined: 0,
        pass_examined: 0,
        issued: 0,
        to_examine: 0,
        processed: 0,
        to_process: 0,
        pct_done: 0.0,
        rate: 0,
        remaining_secs: 0,
        start_ts: start_ts.unwrap_or(0),
        end_ts: end_ts.unwrap_or(0),
        pause_ts: pause_ts.unwrap_or(0),
        paused_secs: 0,
    };

    for segment in text.split(',').map(str::trim) {
        let tokens: Vec<&str> = segment.split_whitespace().collect();
        let Some(first) = tokens.first() else {
            continue;
        };
        if segment.contains(" scanned") {
            scan.examined = parse_size(first).unwrap_or(0);
            if tokens.get(1) == Some(&"/") {
                scan.to_examine = tokens.get(2).and_then(|t| parse_size(t)).unwrap_or(0);
            }
            if let Some(pos) = tokens.iter().position(|t| *t == "at") {
                scan.rate = tokens
                    .get(pos + 1)
                    .and_then(|t| parse_size(t.trim_end_matches("/s")))
                    .unwrap_or(0);
            }
        } else if segment.contains(" issued") {
            scan.issued = parse_size(first).unwrap_or(0);
        } else if segment.ends_with(" total") {
            scan.to_examine = parse_size(first).unwrap_or(0);
        } else if segment.ends_with("% done") {
            scan.pct_done = first.trim_end_matches('%').parse().unwrap_or(0.0);
        } else if segment.ends_with(" to go") {
            scan.remaining_secs = parse_duration(&tokens[..tokens.len() - 2]).unwrap_or(0);
        } else if let Some(pos) = tokens
            .iter()
            .position(|t| matches!(*t, "repaired" | "resilvered" | "rebuilt"))
        {
            // "0 repaired" while running, "scrub repaired 0 in ..." once done
            let before = pos.checked_sub(1).and_then(|i| parse_size(tokens[i]));
            scan.processed = before
                .or_else(|| tokens.get(pos + 1).and_then(|t| parse_size(t)))
                .unwrap_or(0);
        }
    }

    scan.pass_examined = scan.examined;
    // The printed "% done" is issued-based on newer releases, so it is only
    // a fallback when no total was printed
    if scan.to_examine > 0 {
        scan.pct_done = 100.0 * scan.examined as f64 / scan.to_examine as f64;
    } else if scan.state == ScanState::Finished {
        scan.pct_done = 100.0;
    }
    if scan.state != ScanState::Scanning {
        scan.remaining_secs = 0;
        scan.rate = 0;
    }

    scan
}

/// Error counters on the row naming the pool itself in the config table
pub fn parse_root_errors(status: &str, pool: &str) -> DiagResult<Option<VdevErrors>> {
    let Some(line) = status.lines().find(|line| {
        let mut tokens = line.split_whitespace();
        tokens.next() == Some(pool) && tokens.count() >= 4
    }) else {
        return Ok(None);
    };

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let count = |index: usize| {
        parse_size(tokens[index]).ok_or_else(|| {
            DiagError::parse_error("zpool status", line.trim(), &format!("Invalid error count: {}", tokens[index]))
        })
    };
    Ok(Some(VdevErrors {
        read: count(2)?,
        write: count(3)?,
        checksum: count(4)?,
    }))
}

fn errors_in(text: &str) -> u64 {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    tokens
        .windows(3)
        .find(|w| w[0] == "with" && w[2].starts_with("error"))
        .and_then(|w| parse_size(w[1]))
        .unwrap_or(0)
}

/// Unix seconds of a ctime-style date following `marker`
fn date_after(text: &str, marker: &str) -> Option<i64> {
    let rest = &text[text.find(marker)? + marker.len()..];
    let date: Vec<&str> = rest.split_whitespace().take(5).collect();
    let date = date.join(" ");
    let date = date.trim_end_matches(',');
    let naive = NaiveDateTime::parse_from_str(date, "%a %b %e %H:%M:%S %Y").ok()?;
    Local.from_local_datetime(&naive).earliest().map(|dt| dt.timestamp())
}

/// `HH:MM:SS`, optionally preceded by `N days`
fn parse_duration(tokens: &[&str]) -> Option<u64> {
    let (days, clock) = match tokens {
        [clock] => (0, *clock),
        [days, unit, clock] if unit.starts_with("day") => (days.parse::<u64>().ok()?, *clock),
        _ => return None,
    };
    let mut seconds = 0u64;
    for part in clock.split(':') {
        seconds = seconds * 60 + part.parse::<u64>().ok()?;
    }
    Some(days * 86_400 + seconds)
}

/// Exact integers as printed with `-p`, or human sizes such as `1.23T`
pub fn parse_size(token: &str) -> Option<u64> {
    let token = token.trim_end_matches([',', 'B']);
    if let Ok(value) = token.parse::<u64>() {
        return Some(value);
    }
    let suffix = token.chars().last()?;
    let number = &token[..token.len() - suffix.len_utf8()];
    let shift = match suffix {
        'K' => 10,
        'M' => 20,
        'G' => 30,
        'T' => 40,
        'P' => 50,
        'E' => 60,
        _ => return None,
    };
    let value = number.parse::<f64>().ok()?;
    Some((value * (1u64 << shift) as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;

    #[test]
    fn test_finished_scrub() {
        let scan = parse_scan(demo::DEMO_ZPOOL_STATUS_DATA).unwrap();
        assert_eq!(scan.function, ScanFunction::Scrub);
        assert_eq!(scan.state, ScanState::Finished);
        assert_eq!(scan.errors, 0);
        assert_eq!(scan.pct_done, 100.0);
        assert_eq!(scan.remaining_secs, 0);
        assert!(scan.end_ts > 0);
        assert_eq!(scan.start_ts, 0);
    }

    #[test]
    fn test_scrub_in_progress() {
        let scan = parse_scan(demo::DEMO_ZPOOL_STATUS_BOOT).unwrap();
        assert_eq!(scan.function, ScanFunction::Scrub);
        assert_eq!(scan.state, ScanState::Scanning);
        assert_eq!(scan.examined, 3_841_982_464);
        assert_eq!(scan.issued, 2_791_728_742);
        assert_eq!(scan.to_examine, 5_583_392_768);
        assert_eq!(scan.pass_examined, 3_841_982_464);
        assert_eq!(scan.processed, 0);
        assert_eq!(scan.to_process, 0);
        assert!((scan.pct_done - 68.81).abs() < 0.01);
        assert_eq!(scan.rate, 128_066_082);
        assert_eq!(scan.remaining_secs, 30);
        assert!(scan.start_ts > 0);
        assert_eq!(scan.end_ts, 0);
        assert_eq!(scan.pause_ts, 0);
        assert_eq!(scan.paused_secs, 0);
    }

    #[test]
    fn test_no_scan_requested() {
        let scan = parse_scan("  pool: tank\n state: ONLINE\n  scan: none requested\nconfig:\n").unwrap();
        assert_eq!(scan.function, ScanFunction::NoneRequested);
        assert_eq!(scan.state, ScanState::None);
        assert_eq!(scan.pct_done, 0.0);
    }

    #[test]
    fn test_finished_resilver_with_errors() {
        let scan = parse_scan(
            "  scan: resilvered 1048576 in 0 days 01:02:03 with 2 errors on Sun Sep 14 16:00:03 2025\n",
        )
        .unwrap();
        assert_eq!(scan.function, ScanFunction::Resilver);
        assert_eq!(scan.state, ScanState::Finished);
        assert_eq!(scan.errors, 2);
        assert_eq!(scan.processed, 1_048_576);
    }

    #[test]
    fn test_canceled_scrub() {
        let scan = parse_scan("  scan: scrub canceled on Sun Sep 14 16:00:03 2025\n").unwrap();
        assert_eq!(scan.state, ScanState::Canceled);
        assert_eq!(scan.pct_done, 0.0);
    }

    #[test]
    fn test_newer_progress_layout() {
        let scan = parse_scan(
            "  scan: scrub in progress since Sat Oct 17 02:00:01 2026\n\t1.00T / 2.00T scanned at 500M/s, 512G / 2.00T issued at 400M/s\n\t0B repaired, 25.00% done, 1 days 00:00:10 to go\nconfig:\n",
        )
        .unwrap();
        assert_eq!(scan.examined, 1 << 40);
        assert_eq!(scan.to_examine, 2 << 40);
        assert_eq!(scan.issued, 512 << 30);
        assert_eq!(scan.pct_done, 50.0);
        assert_eq!(scan.rate, 500 << 20);
        assert_eq!(scan.remaining_secs, 86_410);
    }

    #[test]
    fn test_paused_scrub() {
        let scan = parse_scan(
            "  scan: scrub paused since Sat Oct 17 04:00:00 2026
	scrub started on Sat Oct 17 02:00:01 2026
	1.00T / 4.00T scanned, 1.00T / 4.00T issued, 0B repaired, 25.00% done
config:
",
        )
        .unwrap();
        assert_eq!(scan.state, ScanState::Scanning);
        assert_eq!(scan.pause_ts - scan.start_ts, 2 * 3600 - 1);
        assert_eq!(scan.end_ts, 0);
        assert_eq!(scan.pct_done, 25.0);
    }

    #[test]
    fn test_printed_percent_without_totals() {
        let scan = parse_scan("  scan: resilver in progress since Sat Oct 17 02:00:01 2026
	12.5% done
").unwrap();
        assert_eq!(scan.to_examine, 0);
        assert_eq!(scan.pct_done, 12.5);
    }

    #[test]
    fn test_missing_scan_line() {
        assert!(parse_scan("  pool: tank\n state: ONLINE\n").is_none());
    }

    #[test]
    fn test_root_errors() {
        let errors = parse_root_errors(demo::DEMO_ZPOOL_STATUS_BOOT, "boot-pool")
            .unwrap()
            .unwrap();
        assert_eq!(
            errors,
            VdevErrors {
                read: 0,
                write: 0,
                checksum: 2
            }
        );
        // "  pool: boot-pool" must not be mistaken for the config row
        assert!(parse_root_errors("  pool: data\n", "data").unwrap().is_none());
    }

    #[test]
    fn test_root_errors_not_numeric() {
        let status = "\tNAME STATE READ WRITE CKSUM\n\tdata ONLINE x 0 0\n";
        assert!(matches!(
            parse_root_errors(status, "data"),
            Err(DiagError::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("0"), Some(0));
        assert_eq!(parse_size("0B"), Some(0));
        assert_eq!(parse_size("1K"), Some(1024));
        assert_eq!(parse_size("1.5M"), Some(1_572_864));
        assert_eq!(parse_size("42,"), Some(42));
        assert_eq!(parse_size("fast"), None);
        assert_eq!(parse_size(""), None);
    }
}
