//! `zfetchstat`: periodic prefetcher statistics

pub mod scheduler;


use crate::demo;
use crate::error::{DiagError, DiagResult};
use crate::kstat::KSTAT_DIR;
use crate::system::{DemoFilesystemReader, RealFilesystemReader};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::future::Future;
use std::time::Duration;

pub use scheduler::Outcome;

/// Immutable options for one `zfetchstat` run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub path: String,
    pub interval: Duration,
    pub count: Option<u64>,
    pub header: bool,
    pub timestamp: bool,
    pub baseline: bool,
}

impl Config {
    /// Defaults for reading `path`: one second interval, unbounded count
    pub fn for_path(path: &str) -> Self {
        Self {
            path: path.to_string(),
            interval: Duration::from_secs(1),
            count: None,
            header: true,
            timestamp: true,
            baseline: true,
        }
    }
}

impl TryFrom<&ArgMatches> for Config {
    type Error = DiagError;

    fn try_from(args: &ArgMatches) -> Result<Self, Self::Error> {
        let mut config = match args.get_one::<String>("FILE") {
            Some(path) => Config::for_path(path),
            None => Config::for_path(&format!("{}/zfetchstats", KSTAT_DIR)),
        };
        if let Some(value) = args.get_one::<String>("INTERVAL") {
            config.interval = parse_interval(value)?;
        }
        config.count = args
            .get_one::<String>("COUNT")
            .map(|value| parse_count(value))
            .transpose()?;
        config.header = !args.get_flag("NO_HEADER");
        config.timestamp = !args.get_flag("NO_TIMESTAMP");
        config.baseline = !args.get_flag("SKIP_BASELINE");

        Ok(config)
    }
}

/// Interval in seconds: a positive, finite real number
fn parse_interval(value: &str) -> DiagResult<Duration> {
    let seconds = value
        .parse::<f64>()
        .map_err(|_| DiagError::config_error("interval", &format!("'{}' is not a number", value)))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(DiagError::config_error(
            "interval",
            &format!("'{}' must be a positive number of seconds", value),
        ));
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|e| DiagError::config_error("interval", &e.to_string()))
}

fn parse_count(value: &str) -> DiagResult<u64> {
    match value.parse::<u64>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(DiagError::config_error(
            "count",
            &format!("'{}' must be a positive integer", value),
        )),
    }
}

pub fn command() -> Command {
    Command::new("zfetchstat")
        .about("Print ZFS prefetcher hit and miss rates at a fixed interval")
        .arg(
            Arg::new("NO_HEADER")
                .long("no-header")
                .short('H')
                .help("Do not print the header row")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("NO_TIMESTAMP")
                .long("no-timestamp")
                .short('n')
                .help("Do not print the time column")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("SKIP_BASELINE")
                .long("skip-baseline")
                .short('s')
                .help("Do not print the first row, which averages since the counters were created")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("FILE")
                .long("file")
                .short('f')
                .help("Counter file to read (default /proc/spl/kstat/zfs/zfetchstats)")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("INTERVAL")
                .help("Seconds between samples (default 1)")
                .action(ArgAction::Set)
                .index(1),
        )
        .arg(
            Arg::new("COUNT")
                .help("Number of rows to print (default unbounded)")
                .action(ArgAction::Set)
                .index(2),
        )
}

/// Sample until done, writing rows to stdout
pub async fn run<S: Future<Output = ()>>(config: Config, shutdown: S) -> DiagResult<Outcome> {
    tracing::debug!(?config, "starting zfetchstat");
    let mut stdout = std::io::stdout().lock();
    if demo::enabled() {
        scheduler::run(&config, &DemoFilesystemReader, &mut stdout, shutdown).await
    } else {
        scheduler::run(&config, &RealFilesystemReader, &mut stdout, shutdown).await
    }
}
