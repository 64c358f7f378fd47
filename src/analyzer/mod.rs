//! `kstat-analyzer`: one-shot kstat report with heuristic commentary

pub mod heuristics;
pub mod report;

#[cfg(test)]
mod integration_tests;

pub use heuristics::{Finding, KstatSnapshot, Severity, analyze};

use crate::demo;
use crate::display::Terminal;
use crate::error::{DiagError, DiagResult};
use crate::kstat::{ArcStats, KSTAT_DIR, PrefetchStats, TxStats};
use crate::system::{DemoFilesystemReader, FilesystemReader, RealFilesystemReader, read_kstat};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::io::Write;

/// Immutable options for one analyzer run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub kstat_dir: String,
}

impl TryFrom<&ArgMatches> for Config {
    type Error = DiagError;

    fn try_from(args: &ArgMatches) -> Result<Self, Self::Error> {
        let kstat_dir = args
            .get_one::<String>("DIR")
            .cloned()
            .unwrap_or_else(|| KSTAT_DIR.to_string());
        if kstat_dir.trim().is_empty() {
            return Err(DiagError::config_error("kstat directory", "must not be empty"));
        }
        Ok(Config {
            kstat_dir: kstat_dir.trim_end_matches('/').to_string(),
        })
    }
}

pub fn command() -> Command {
    Command::new("kstat-analyzer")
        .about("Summarize ZFS kstats and comment on anything unusual")
        .arg(
            Arg::new("DIR")
                .long("kstat-dir")
                .short('d')
                .help("Directory holding arcstats, zfetchstats and dmu_tx (default /proc/spl/kstat/zfs)")
                .action(ArgAction::Set),
        )
}

/// Read `arcstats` (required) and the optional `zfetchstats` and `dmu_tx`
pub fn load<F: FilesystemReader>(reader: &F, dir: &str) -> DiagResult<KstatSnapshot> {
    let arc = ArcStats::from_table(&read_kstat(reader, &format!("{}/arcstats", dir))?)?;

    let prefetch_path = format!("{}/zfetchstats", dir);
    let prefetch = if reader.exists(&prefetch_path) {
        Some(PrefetchStats::from_table(&read_kstat(reader, &prefetch_path)?)?)
    } else {
        tracing::info!(path = %prefetch_path, "no prefetcher kstat, skipping section");
        None
    };

    let tx_path = format!("{}/dmu_tx", dir);
    let tx = if reader.exists(&tx_path) {
        Some(TxStats::from_table(&read_kstat(reader, &tx_path)?)?)
    } else {
        tracing::info!(path = %tx_path, "no dmu_tx kstat, skipping section");
        None
    };

    Ok(KstatSnapshot { arc, prefetch, tx })
}

/// Load, analyze and render into `out`
pub fn analyze_into<F: FilesystemReader, W: Write>(
    config: &Config,
    reader: &F,
    terminal: &Terminal,
    out: &mut W,
) -> DiagResult<Vec<Finding>> {
    let snapshot = load(reader, &config.kstat_dir)?;
    let findings = analyze(&snapshot);
    tracing::debug!(findings = findings.len(), "analysis complete");
    out.write_all(report::render(&snapshot, &findings, terminal).as_bytes())
        .map_err(|e| DiagError::filesystem_error("<stdout>", "write", e))?;
    Ok(findings)
}

pub fn run(config: Config) -> DiagResult<()> {
    let terminal = Terminal::new();
    let mut stdout = std::io::stdout().lock();
    if demo::enabled() {
        analyze_into(&config, &DemoFilesystemReader, &terminal, &mut stdout)?;
    } else {
        analyze_into(&config, &RealFilesystemReader, &terminal, &mut stdout)?;
    }
    Ok(())
}
