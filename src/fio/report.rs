use crate::error::{DiagError, DiagResult};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Top level of `fio --output-format=json`
#[derive(Debug, Clone, Deserialize)]
pub struct FioReport {
    #[serde(rename = "fio version", default)]
    pub version: String,
    /// Seconds since the epoch
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub timestamp_ms: Option<i64>,
    #[serde(default)]
    pub jobs: Vec<FioJob>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FioJob {
    pub jobname: String,
    #[serde(default)]
    pub groupid: i64,
    #[serde(default)]
    pub error: i64,
    #[serde(rename = "job options", default)]
    pub options: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub read: Option<IoStats>,
    #[serde(default)]
    pub write: Option<IoStats>,
    #[serde(default)]
    pub trim: Option<IoStats>,
}

/// Per-direction totals of one job
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IoStats {
    pub io_bytes: u64,
    pub bw_bytes: Option<u64>,
    /// KiB/s
    pub bw: u64,
    pub iops: f64,
    /// Milliseconds
    pub runtime: u64,
    pub total_ios: u64,
    pub clat_ns: Option<LatencyStats>,
    pub lat_ns: Option<LatencyStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LatencyStats {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub stddev: f64,
    /// Keyed by percentile as fio prints it, e.g. "99.000000"
    pub percentile: BTreeMap<String, u64>,
}

impl FioReport {
    /// Report time in nanoseconds, `None` when fio recorded none
    pub fn timestamp_nanos(&self) -> DiagResult<Option<i64>> {
        let (value, scale, name) = match self.timestamp_ms {
            Some(ms) if ms > 0 => (ms, 1_000_000, "timestamp_ms"),
            _ if self.timestamp > 0 => (self.timestamp, 1_000_000_000, "timestamp"),
            _ => return Ok(None),
        };
        value.checked_mul(scale).map(Some).ok_or_else(|| {
            DiagError::parse_error("fio JSON", &value.to_string(), &format!("{} out of range", name))
        })
    }
}

impl FioJob {
    /// Directions that saw I/O, in read, write, trim order
    pub fn directions(&self) -> impl Iterator<Item = (&'static str, &IoStats)> {
        [
            ("read", self.read.as_ref()),
            ("write", self.write.as_ref()),
            ("trim", self.trim.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, stats)| stats.map(|s| (name, s)))
        .filter(|(_, stats)| stats.total_ios > 0)
    }

    /// A job option rendered as text, if present
    pub fn option(&self, key: &str) -> Option<String> {
        match self.options.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl IoStats {
    /// Bandwidth in bytes per second, derived from KiB/s on older fio
    pub fn bandwidth_bytes(&self) -> DiagResult<u64> {
        match self.bw_bytes {
            Some(bytes) => Ok(bytes),
            None => self.bw.checked_mul(1024).ok_or_else(|| {
                DiagError::parse_error("fio JSON", &self.bw.to_string(), "bw out of range")
            }),
        }
    }
}

impl LatencyStats {
    pub fn percentile(&self, wanted: f64) -> Option<u64> {
        self.percentile.iter().find_map(|(key, value)| {
            let p = key.parse::<f64>().ok()?;
            ((p - wanted).abs() < 1e-6).then_some(*value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_report() {
        let report: FioReport =
            serde_json::from_str(r#"{"jobs":[{"jobname":"seq","read":{"total_ios":1,"bw":4}}]}"#)
                .unwrap();
        assert_eq!(report.timestamp_nanos().unwrap(), None);
        let job = &report.jobs[0];
        let directions: Vec<_> = job.directions().map(|(name, _)| name).collect();
        assert_eq!(directions, vec!["read"]);
        assert_eq!(job.read.as_ref().unwrap().bandwidth_bytes().unwrap(), 4096);
    }

    #[test]
    fn test_timestamp_prefers_milliseconds() {
        let report: FioReport =
            serde_json::from_str(r#"{"timestamp":1760666400,"timestamp_ms":1760666400123}"#)
                .unwrap();
        assert_eq!(report.timestamp_nanos().unwrap(), Some(1_760_666_400_123_000_000));

        let report: FioReport = serde_json::from_str(r#"{"timestamp":1760666400}"#).unwrap();
        assert_eq!(report.timestamp_nanos().unwrap(), Some(1_760_666_400_000_000_000));
    }

    #[test]
    fn test_out_of_range_values_are_parse_errors() {
        let report: FioReport =
            serde_json::from_str(r#"{"timestamp_ms":9223372036854775}"#).unwrap();
        assert!(matches!(report.timestamp_nanos(), Err(DiagError::Parse { .. })));

        let report: FioReport = serde_json::from_str(r#"{"timestamp":99999999999}"#).unwrap();
        assert!(matches!(report.timestamp_nanos(), Err(DiagError::Parse { .. })));

        let stats = IoStats {
            bw: u64::MAX / 512,
            ..IoStats::default()
        };
        assert!(matches!(stats.bandwidth_bytes(), Err(DiagError::Parse { .. })));
    }

    #[test]
    fn test_percentile_lookup() {
        let stats: LatencyStats = serde_json::from_str(
            r#"{"min":1,"max":9,"mean":2.5,"stddev":1.0,"percentile":{"50.000000":200,"99.000000":900}}"#,
        )
        .unwrap();
        assert_eq!(stats.percentile(50.0), Some(200));
        assert_eq!(stats.percentile(99.0), Some(900));
        assert_eq!(stats.percentile(95.0), None);
    }

    #[test]
    fn test_option_values() {
        let job: FioJob = serde_json::from_str(
            r#"{"jobname":"j","job options":{"rw":"randread","iodepth":32}}"#,
        )
        .unwrap();
        assert_eq!(job.option("rw").as_deref(), Some("randread"));
        assert_eq!(job.option("iodepth").as_deref(), Some("32"));
        assert_eq!(job.option("bs"), None);
    }
}
