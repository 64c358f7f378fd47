//! `fio2influx`: fio JSON results to line protocol

pub mod report;

use crate::demo;
use crate::display::Line;
use crate::display::line_protocol::now_seconds_as_nanos;
use crate::error::{DiagError, DiagResult};
use clap::{Arg, ArgAction, ArgMatches, Command};
use report::{FioJob, FioReport, IoStats};
use std::io::{Read, Write};

/// Latency percentiles exported from the completion latency table
const PERCENTILES: &[(f64, &str)] = &[(50.0, "clat_p50_ns"), (95.0, "clat_p95_ns"), (99.0, "clat_p99_ns")];

/// Immutable options for one conversion
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Input path, `-` for stdin
    pub input: String,
    pub measurement: String,
    pub tags: Vec<(String, String)>,
}

impl TryFrom<&ArgMatches> for Config {
    type Error = DiagError;

    fn try_from(args: &ArgMatches) -> Result<Self, Self::Error> {
        let measurement = args
            .get_one::<String>("MEASUREMENT")
            .cloned()
            .unwrap_or_else(|| "fio".to_string());
        if measurement.is_empty() {
            return Err(DiagError::config_error("measurement", "must not be empty"));
        }

        let tags = args
            .get_many::<String>("TAG")
            .into_iter()
            .flatten()
            .map(|tag| parse_tag(tag))
            .collect::<DiagResult<Vec<_>>>()?;

        Ok(Config {
            input: args
                .get_one::<String>("FILE")
                .cloned()
                .unwrap_or_else(|| "-".to_string()),
            measurement,
            tags,
        })
    }
}

fn parse_tag(tag: &str) -> DiagResult<(String, String)> {
    match tag.split_once('=') {
        Some((key, value)) if !key.is_empty() && !value.is_empty() => {
            Ok((key.to_string(), value.to_string()))
        }
        _ => Err(DiagError::config_error(
            "tag",
            &format!("'{}' must look like key=value", tag),
        )),
    }
}

pub fn command() -> Command {
    Command::new("fio2influx")
        .about("Convert fio --output-format=json results to line protocol")
        .arg(
            Arg::new("MEASUREMENT")
                .long("measurement")
                .short('m')
                .help("Measurement name (default fio)")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("TAG")
                .long("tag")
                .short('t')
                .help("Extra tag added to every line, as key=value")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("FILE")
                .help("fio JSON output, - for stdin (default)")
                .action(ArgAction::Set)
                .index(1),
        )
}

/// Parse fio output, skipping any notes fio printed before the JSON document
pub fn parse_report(content: &str) -> DiagResult<FioReport> {
    let start = content.find('{').ok_or_else(|| {
        DiagError::parse_error("fio output", "", "no JSON object found")
    })?;
    if start > 0 {
        tracing::debug!(skipped = start, "skipping text before fio JSON");
    }
    serde_json::from_str(&content[start..])
        .map_err(|e| DiagError::parse_error("fio JSON", "", &e.to_string()))
}

/// One line per job and direction that performed I/O
pub fn to_lines(report: &FioReport, config: &Config) -> DiagResult<Vec<Line>> {
    let timestamp = report.timestamp_nanos()?.unwrap_or_else(now_seconds_as_nanos);
    report
        .jobs
        .iter()
        .flat_map(|job| {
            job.directions()
                .map(move |(direction, stats)| job_line(config, job, direction, stats, timestamp))
        })
        .collect()
}

fn job_line(
    config: &Config,
    job: &FioJob,
    direction: &str,
    stats: &IoStats,
    timestamp: i64,
) -> DiagResult<Line> {
    let mut line = Line::new(&config.measurement)
        .tag("jobname", &job.jobname)
        .tag("groupid", &job.groupid.to_string())
        .tag("direction", direction);
    for key in ["rw", "bs"] {
        if let Some(value) = job.option(key) {
            line = line.tag(key, &value);
        }
    }
    for (key, value) in &config.tags {
        line = line.tag(key, value);
    }

    line = line
        .uint("io_bytes", stats.io_bytes)
        .uint("bw_bytes", stats.bandwidth_bytes()?)
        .float("iops", stats.iops)
        .uint("runtime_ms", stats.runtime)
        .uint("total_ios", stats.total_ios);

    if let Some(lat) = &stats.lat_ns {
        line = line
            .uint("lat_min_ns", lat.min)
            .uint("lat_max_ns", lat.max)
            .float("lat_mean_ns", lat.mean)
            .float("lat_stddev_ns", lat.stddev);
    }
    if let Some(clat) = &stats.clat_ns {
        for (percentile, key) in PERCENTILES {
            if let Some(value) = clat.percentile(*percentile) {
                line = line.uint(key, value);
            }
        }
    }

    Ok(line.int("error", job.error).timestamp(timestamp))
}

fn read_input(input: &str) -> DiagResult<String> {
    if input == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .map_err(|e| DiagError::filesystem_error("<stdin>", "read", e))?;
        Ok(content)
    } else {
        std::fs::read_to_string(input).map_err(|e| DiagError::filesystem_error(input, "read", e))
    }
}

/// Convert and write every line to `out`, returning how many were written
pub fn convert<W: Write>(content: &str, config: &Config, out: &mut W) -> DiagResult<usize> {
    let report = parse_report(content)?;
    tracing::debug!(version = %report.version, jobs = report.jobs.len(), "parsed fio report");
    let lines = to_lines(&report, config)?;
    for line in &lines {
        writeln!(out, "{}", line).map_err(|e| DiagError::filesystem_error("<stdout>", "write", e))?;
    }
    if lines.is_empty() {
        tracing::warn!("fio report contains no jobs with I/O");
    }
    Ok(lines.len())
}

pub fn run(config: Config) -> DiagResult<()> {
    let content = if demo::enabled() && config.input == "-" {
        demo::DEMO_FIO_JSON.to_string()
    } else {
        read_input(&config.input)?
    };
    convert(&content, &config, &mut std::io::stdout().lock())?;
    Ok(())
}
