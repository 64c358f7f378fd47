use super::Config;
use crate::display::{Column, RowFormat};
use crate::error::{DiagError, DiagResult};
use crate::kstat::{CounterSet, DeltaSample, Sample};
use crate::system::{FilesystemReader, read_kstat};
use std::future::Future;
use std::io::Write;

/// Prefetcher counters tracked from `zfetchstats`
pub const PREFETCH_COUNTERS: CounterSet =
    CounterSet::new(&["hits", "misses", "max_streams", "io_issued"]);

pub const COLUMNS: &[Column] = &[
    Column::new("hits/s", 10, 0),
    Column::new("miss/s", 10, 0),
    Column::new("hit%", 6, 1),
    Column::new("maxst/s", 9, 0),
    Column::new("issued/s", 9, 0),
];

/// How the sampling loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The configured number of rows was printed
    Completed,
    /// An interrupt arrived while waiting for the next tick
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    FirstPass,
    SteadyState,
    Terminated,
}

/// Acquires one sample per call from the counter file
pub struct Sampler<'a, F: FilesystemReader> {
    reader: &'a F,
    path: &'a str,
}

impl<'a, F: FilesystemReader> Sampler<'a, F> {
    pub fn new(reader: &'a F, path: &'a str) -> Self {
        Self { reader, path }
    }

    pub fn sample(&self) -> DiagResult<Sample> {
        let table = read_kstat(self.reader, self.path)?;
        Sample::from_table(&table, PREFETCH_COUNTERS)
    }
}

/// Column values for one interval, in `COLUMNS` order
pub fn row_values(delta: &DeltaSample) -> [f64; 5] {
    [
        delta.rate("hits"),
        delta.rate("misses"),
        delta.hit_ratio("hits", "misses"),
        delta.rate("max_streams"),
        delta.rate("io_issued"),
    ]
}

/// Run the sampling loop until `count` rows are printed or `shutdown` fires.
///
/// The first pass compares the first real sample against an all-zero
/// baseline, giving averages since the counters were created. Every later
/// tick compares against the previous real sample.
pub async fn run<F, W, S>(
    config: &Config,
    reader: &F,
    out: &mut W,
    shutdown: S,
) -> DiagResult<Outcome>
where
    F: FilesystemReader,
    W: Write,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let sampler = Sampler::new(reader, &config.path);
    let format = RowFormat::new(COLUMNS, config.timestamp);
    let mut previous = Sample::zero(PREFETCH_COUNTERS);
    let mut printed = 0u64;
    let mut phase = Phase::FirstPass;

    loop {
        phase = match phase {
            Phase::FirstPass => {
                let current = sampler.sample()?;
                if config.header {
                    emit(out, &format.header())?;
                }
                if config.baseline {
                    emit_delta(out, &format, &previous, &current)?;
                    printed += 1;
                }
                previous = current;
                next_phase(config, printed)
            }
            Phase::SteadyState => {
                tokio::select! {
                    _ = &mut shutdown => {
                        tracing::info!(printed, "interrupted, stopping");
                        return Ok(Outcome::Interrupted);
                    }
                    _ = tokio::time::sleep(config.interval) => {}
                }

                let current = sampler.sample()?;
                emit_delta(out, &format, &previous, &current)?;
                printed += 1;
                previous = current;
                next_phase(config, printed)
            }
            Phase::Terminated => return Ok(Outcome::Completed),
        };
    }
}

fn next_phase(config: &Config, printed: u64) -> Phase {
    match config.count {
        Some(count) if printed >= count => Phase::Terminated,
        _ => Phase::SteadyState,
    }
}

fn emit_delta<W: Write>(
    out: &mut W,
    format: &RowFormat,
    previous: &Sample,
    current: &Sample,
) -> DiagResult<()> {
    let delta = DeltaSample::between(previous, current);
    if delta.is_degenerate() {
        tracing::warn!(
            timestamp = current.timestamp(),
            "counter timestamp did not advance, rates assume a 1 second interval"
        );
    } else {
        tracing::trace!(elapsed = delta.elapsed_seconds(), "sampled interval");
    }
    let row = format.row(chrono::Local::now(), &row_values(&delta));
    emit(out, &row)
}

fn emit<W: Write>(out: &mut W, line: &str) -> DiagResult<()> {
    writeln!(out, "{}", line)
        .and_then(|_| out.flush())
        .map_err(|e| DiagError::filesystem_error("<stdout>", "write", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kstat::Sample;

    #[test]
    fn test_row_values_for_fixture_interval() {
        let previous = Sample::from_values(1_000_000_000, &[("hits", 100), ("misses", 50)]);
        let current = Sample::from_values(2_000_000_000, &[("hits", 150), ("misses", 50)]);
        let values = row_values(&DeltaSample::between(&previous, &current));
        assert_eq!(values, [50.0, 0.0, 100.0, 0.0, 0.0]);
    }

    #[test]
    fn test_next_phase_respects_count() {
        let mut config = Config::for_path("/dev/null");
        assert_eq!(next_phase(&config, 100), Phase::SteadyState);
        config.count = Some(2);
        assert_eq!(next_phase(&config, 1), Phase::SteadyState);
        assert_eq!(next_phase(&config, 2), Phase::Terminated);
    }
}
