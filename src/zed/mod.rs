//! `zedlet`: turn one ZFS event from the zed environment into line protocol

use crate::display::Line;
use crate::display::line_protocol::now_seconds_as_nanos;
use crate::error::{DiagError, DiagResult};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::Write;
use tokio::net::{UdpSocket, lookup_host};

const PREFIX: &str = "ZEVENT_";

/// Where the encoded event goes
#[derive(Debug, Clone, PartialEq)]
pub enum Sink {
    Stdout,
    /// Appended to, created when missing
    File(String),
    /// One datagram per event
    Udp(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub measurement: String,
    pub sink: Sink,
}

impl TryFrom<&ArgMatches> for Config {
    type Error = DiagError;

    fn try_from(args: &ArgMatches) -> Result<Self, Self::Error> {
        let measurement = args
            .get_one::<String>("MEASUREMENT")
            .cloned()
            .unwrap_or_else(|| "zed".to_string());
        if measurement.is_empty() {
            return Err(DiagError::config_error("measurement", "must not be empty"));
        }

        let sink = if let Some(path) = args.get_one::<String>("OUTPUT") {
            Sink::File(path.clone())
        } else if let Some(addr) = args.get_one::<String>("UDP") {
            match addr.rsplit_once(':') {
                Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {}
                _ => {
                    return Err(DiagError::config_error(
                        "udp target",
                        &format!("'{}' must look like HOST:PORT", addr),
                    ));
                }
            }
            Sink::Udp(addr.clone())
        } else {
            Sink::Stdout
        };

        Ok(Config { measurement, sink })
    }
}

pub fn command() -> Command {
    Command::new("zedlet")
        .about("Forward the ZFS event in the ZEVENT_* environment as line protocol")
        .arg(
            Arg::new("MEASUREMENT")
                .long("measurement")
                .short('m')
                .help("Measurement name (default zed)")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("OUTPUT")
                .long("output")
                .short('o')
                .help("Append to this file instead of stdout")
                .conflicts_with("UDP")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("UDP")
                .long("udp")
                .short('u')
                .help("Send a datagram to HOST:PORT instead of stdout")
                .action(ArgAction::Set),
        )
}

/// The event attributes that become tags and fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZedEvent {
    pub class: String,
    pub subclass: Option<String>,
    pub pool: Option<String>,
    pub vdev_path: Option<String>,
    pub eid: Option<i64>,
    pub pool_guid: Option<String>,
    pub pool_state: Option<String>,
    pub vdev_state: Option<String>,
    pub vdev_type: Option<String>,
    pub zio_err: Option<i64>,
    /// Nanoseconds since the epoch
    pub time: Option<i64>,
}

impl ZedEvent {
    /// Build from environment pairs, ignoring everything without the zed prefix.
    /// Pairs that are not valid UTF-8 are skipped.
    pub fn from_vars<I: IntoIterator<Item = (OsString, OsString)>>(vars: I) -> DiagResult<Self> {
        let mut env: HashMap<String, String> = HashMap::new();
        for (key, value) in vars {
            let key = match key.into_string() {
                Ok(key) => key,
                Err(key) => {
                    tracing::debug!(key = ?key, "skipping non UTF-8 variable");
                    continue;
                }
            };
            let Some(name) = key.strip_prefix(PREFIX) else {
                continue;
            };
            match value.into_string() {
                Ok(value) if !value.is_empty() => {
                    env.insert(name.to_string(), value);
                }
                Ok(_) => {}
                Err(value) => tracing::debug!(%key, value = ?value, "skipping non UTF-8 value"),
            }
        }
        tracing::debug!(variables = env.len(), "read zed environment");

        let class = env
            .remove("CLASS")
            .ok_or_else(|| DiagError::config_error("ZEVENT_CLASS", "not set, not running under zed?"))?;

        let time = match env.remove("TIME_SECS") {
            Some(secs) => {
                let secs = integer("TIME_SECS", &secs)?;
                let nsecs = env
                    .remove("TIME_NSECS")
                    .map(|n| integer("TIME_NSECS", &n))
                    .transpose()?
                    .unwrap_or(0);
                let nanos = secs
                    .checked_mul(1_000_000_000)
                    .and_then(|ns| ns.checked_add(nsecs))
                    .ok_or_else(|| {
                        DiagError::parse_error(
                            "ZEVENT_TIME_SECS",
                            &secs.to_string(),
                            "event time out of range",
                        )
                    })?;
                Some(nanos)
            }
            None => None,
        };

        Ok(ZedEvent {
            class,
            subclass: env.remove("SUBCLASS"),
            pool: env.remove("POOL"),
            vdev_path: env.remove("VDEV_PATH"),
            eid: env.remove("EID").map(|v| integer("EID", &v)).transpose()?,
            pool_guid: env.remove("POOL_GUID"),
            pool_state: env.remove("POOL_STATE_STR").or_else(|| env.remove("POOL_STATE")),
            vdev_state: env.remove("VDEV_STATE_STR").or_else(|| env.remove("VDEV_STATE")),
            vdev_type: env.remove("VDEV_TYPE"),
            zio_err: env.remove("ZIO_ERR").map(|v| integer("ZIO_ERR", &v)).transpose()?,
            time,
        })
    }

    pub fn to_line(&self, measurement: &str) -> Line {
        let mut line = Line::new(measurement).tag("class", &self.class);
        for (key, value) in [
            ("subclass", &self.subclass),
            ("pool", &self.pool),
            ("vdev_path", &self.vdev_path),
        ] {
            if let Some(value) = value {
                line = line.tag(key, value);
            }
        }

        if let Some(eid) = self.eid {
            line = line.int("eid", eid);
        }
        for (key, value) in [
            ("pool_guid", &self.pool_guid),
            ("pool_state", &self.pool_state),
            ("vdev_state", &self.vdev_state),
            ("vdev_type", &self.vdev_type),
        ] {
            if let Some(value) = value {
                line = line.text(key, value);
            }
        }
        if let Some(zio_err) = self.zio_err {
            line = line.int("zio_err", zio_err);
        }
        // A line without fields is rejected by the protocol
        if !line.has_fields() {
            line = line.text("class", &self.class);
        }

        line.timestamp(self.time.unwrap_or_else(now_seconds_as_nanos))
    }
}

fn integer(name: &str, value: &str) -> DiagResult<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| DiagError::parse_error(&format!("{}{}", PREFIX, name), value, "not an integer"))
}

/// Write one encoded line to the configured sink
pub async fn deliver(line: &Line, sink: &Sink) -> DiagResult<()> {
    let encoded = format!("{}\n", line);
    match sink {
        Sink::Stdout => std::io::stdout()
            .lock()
            .write_all(encoded.as_bytes())
            .map_err(|e| DiagError::filesystem_error("<stdout>", "write", e)),
        Sink::File(path) => OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(encoded.as_bytes()))
            .map_err(|e| DiagError::filesystem_error(path, "append", e)),
        Sink::Udp(addr) => send_datagram(addr, encoded.as_bytes()).await,
    }
}

async fn send_datagram(addr: &str, payload: &[u8]) -> DiagResult<()> {
    let target = format!("udp://{}", addr);
    let io_error = |e: std::io::Error| DiagError::filesystem_error(&target, "send", e);

    let remote = lookup_host(addr)
        .await
        .map_err(io_error)?
        .next()
        .ok_or_else(|| DiagError::config_error("udp target", &format!("'{}' did not resolve", addr)))?;
    let local = if remote.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };

    let socket = UdpSocket::bind(local).await.map_err(io_error)?;
    let sent = socket.send_to(payload, remote).await.map_err(io_error)?;
    tracing::debug!(%remote, bytes = sent, "sent event datagram");
    Ok(())
}

pub async fn run(config: Config) -> DiagResult<()> {
    let event = ZedEvent::from_vars(std::env::vars_os())?;
    tracing::info!(class = %event.class, eid = ?event.eid, "forwarding zfs event");
    deliver(&event.to_line(&config.measurement), &config.sink).await
}
