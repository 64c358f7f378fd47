//! `zpool-influxdb`: pool capacity, error and scan metrics as line protocol

pub mod pools;
pub mod status;


pub use pools::{PoolCapacity, PoolManager};
pub use status::{ScanStatus, VdevErrors};

use crate::demo;
use crate::display::{FieldValue, Line};
use crate::display::line_protocol::now_seconds_as_nanos;
use crate::error::{DiagError, DiagResult};
use crate::kstat::KSTAT_DIR;
use crate::system::{
    CommandExecutor, DemoCommandExecutor, DemoFilesystemReader, FilesystemReader,
    RealCommandExecutor, RealFilesystemReader,
};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::io::Write;

/// Immutable options for one collection
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Only report this pool
    pub pool: Option<String>,
    pub kstat_dir: String,
}

impl TryFrom<&ArgMatches> for Config {
    type Error = DiagError;

    fn try_from(args: &ArgMatches) -> Result<Self, Self::Error> {
        let pool = args.get_one::<String>("POOL").cloned();
        if pool.as_deref() == Some("") {
            return Err(DiagError::config_error("pool", "must not be empty"));
        }
        let kstat_dir = args
            .get_one::<String>("DIR")
            .cloned()
            .unwrap_or_else(|| KSTAT_DIR.to_string());
        Ok(Config {
            pool,
            kstat_dir: kstat_dir.trim_end_matches('/').to_string(),
        })
    }
}

pub fn command() -> Command {
    Command::new("zpool-influxdb")
        .about("Print pool statistics in InfluxDB line protocol")
        .arg(
            Arg::new("DIR")
                .long("kstat-dir")
                .short('d')
                .help("Directory holding per-pool io kstats (default /proc/spl/kstat/zfs)")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("POOL")
                .help("Only report this pool")
                .action(ArgAction::Set)
                .index(1),
        )
}

/// Cumulative byte and operation counts from the per-pool `io` kstat
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolIo {
    pub nread: u64,
    pub nwritten: u64,
    pub reads: u64,
    pub writes: u64,
}

/// Parse the column-style `io` kstat: a header line, column names, then values
pub fn parse_io_kstat(source: &str, content: &str) -> DiagResult<PoolIo> {
    let mut lines = content.lines().skip(1).filter(|line| !line.trim().is_empty());
    let (Some(names), Some(values)) = (lines.next(), lines.next()) else {
        return Err(DiagError::invalid_format(
            "column names and values",
            "truncated kstat",
            source,
        ));
    };

    let names: Vec<&str> = names.split_whitespace().collect();
    let values: Vec<&str> = values.split_whitespace().collect();
    if names.len() != values.len() {
        return Err(DiagError::invalid_format(
            &format!("{} values", names.len()),
            &format!("{} values", values.len()),
            source,
        ));
    }

    let column = |name: &str| -> DiagResult<u64> {
        let index = names
            .iter()
            .position(|n| *n == name)
            .ok_or_else(|| DiagError::invalid_format(name, "missing column", source))?;
        values[index]
            .parse()
            .map_err(|_| DiagError::parse_error(source, values[index], &format!("Invalid {}", name)))
    };

    Ok(PoolIo {
        nread: column("nread")?,
        nwritten: column("nwritten")?,
        reads: column("reads")?,
        writes: column("writes")?,
    })
}

pub fn stats_line(
    capacity: &PoolCapacity,
    io: Option<&PoolIo>,
    errors: Option<&VdevErrors>,
    timestamp: i64,
) -> Line {
    let mut line = Line::new("zpool_stats")
        .tag("name", &capacity.name)
        .tag("state", &capacity.health)
        .uint("alloc", capacity.alloc)
        .uint("free", capacity.free)
        .uint("size", capacity.size)
        .text("state", &capacity.health);

    if let Some(io) = io {
        line = line.uint("read_bytes", io.nread);
    }
    if let Some(errors) = errors {
        line = line.uint("read_errors", errors.read);
    }
    if let Some(io) = io {
        line = line.uint("read_ops", io.reads).uint("write_bytes", io.nwritten);
    }
    if let Some(errors) = errors {
        line = line.uint("write_errors", errors.write);
    }
    if let Some(io) = io {
        line = line.uint("write_ops", io.writes);
    }
    if let Some(errors) = errors {
        line = line.uint("checksum_errors", errors.checksum);
    }
    if let Some(fragmentation) = capacity.fragmentation {
        line = line.uint("fragmentation", fragmentation);
    }

    line.timestamp(timestamp)
}

pub fn scan_line(pool: &str, scan: &ScanStatus, timestamp: i64) -> Line {
    Line::new("zpool_scan_stats")
        .tag("function", scan.function.as_str())
        .tag("pool", pool)
        .tag("state", scan.state.as_str())
        .int("end_ts", scan.end_ts)
        .uint("errors", scan.errors)
        .uint("examined", scan.examined)
        .text("function", scan.function.as_str())
        .uint("issued", scan.issued)
        .uint("pass_examined", scan.pass_examined)
        .int("pause_ts", scan.pause_ts)
        .uint("paused_t", scan.paused_secs)
        .field("pct_done", FieldValue::Fixed(scan.pct_done, 2))
        .uint("processed", scan.processed)
        .uint("rate", scan.rate)
        .uint("remaining_t", scan.remaining_secs)
        .int("start_ts", scan.start_ts)
        .text("state", scan.state.as_str())
        .uint("to_examine", scan.to_examine)
        .uint("to_process", scan.to_process)
        .timestamp(timestamp)
}

/// Lines for one pool: capacity and errors, then scan progress when reported
pub async fn pool_lines<E: CommandExecutor, F: FilesystemReader>(
    manager: &PoolManager<E>,
    reader: &F,
    kstat_dir: &str,
    pool: &str,
    timestamp: i64,
) -> DiagResult<Vec<Line>> {
    let capacity = manager.capacity(pool).await?;
    let report = manager.status(pool).await?;
    let errors = status::parse_root_errors(&report, pool)?;

    let io_path = format!("{}/{}/io", kstat_dir, pool);
    let io = if reader.exists(&io_path) {
        let content = reader
            .read_to_string(&io_path)
            .map_err(|e| DiagError::filesystem_error(&io_path, "read", e))?;
        Some(parse_io_kstat(&io_path, &content)?)
    } else {
        tracing::debug!(path = %io_path, "no io kstat for pool");
        None
    };

    let mut lines = vec![stats_line(&capacity, io.as_ref(), errors.as_ref(), timestamp)];
    match status::parse_scan(&report) {
        Some(scan) => lines.push(scan_line(pool, &scan, timestamp)),
        None => tracing::debug!(pool, "no scan line in zpool status"),
    }
    Ok(lines)
}

/// Write lines for every selected pool to `out`, returning how many were written
pub async fn collect<E: CommandExecutor, F: FilesystemReader, W: Write>(
    manager: &PoolManager<E>,
    reader: &F,
    config: &Config,
    out: &mut W,
) -> DiagResult<usize> {
    let timestamp = now_seconds_as_nanos();
    let imported = manager.list_pools().await?;
    if imported.is_empty() {
        return Err(DiagError::subsystem_unavailable("zpool", "no pools imported"));
    }
    let pools: Vec<String> = imported
        .into_iter()
        .filter(|name| config.pool.as_ref().is_none_or(|wanted| wanted == name))
        .collect();
    if pools.is_empty() {
        tracing::info!(pool = ?config.pool, "no matching pools");
    }

    let mut written = 0;
    for pool in &pools {
        for line in pool_lines(manager, reader, &config.kstat_dir, pool, timestamp).await? {
            writeln!(out, "{}", line)
                .map_err(|e| DiagError::filesystem_error("<stdout>", "write", e))?;
            written += 1;
        }
    }
    Ok(written)
}

pub async fn run(config: Config) -> DiagResult<()> {
    let mut stdout = std::io::stdout().lock();
    if demo::enabled() {
        let manager = PoolManager::new(DemoCommandExecutor);
        collect(&manager, &DemoFilesystemReader, &config, &mut stdout).await?;
    } else {
        let manager = PoolManager::new(RealCommandExecutor);
        collect(&manager, &RealFilesystemReader, &config, &mut stdout).await?;
    }
    Ok(())
}
