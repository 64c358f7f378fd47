mod analyzer;
mod demo;
mod display;
mod error;
mod fio;
mod kstat;
mod pool;
mod system;
mod zed;
mod zfetchstat;

use clap::{Arg, ArgAction, ArgMatches, Command};
use error::{DiagError, DiagResult};
use std::process;
use tracing::Level;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about("Diagnostic tools for ZFS on Linux")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("VERBOSE")
                .long("verbose")
                .short('v')
                .help("Log more to stderr, repeat for more detail")
                .global(true)
                .action(ArgAction::Count),
        )
        .subcommand(zfetchstat::command())
        .subcommand(analyzer::command())
        .subcommand(fio::command())
        .subcommand(pool::command())
        .subcommand(zed::command())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Resolves on Ctrl-C. If the handler cannot be installed it never resolves.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "unable to listen for interrupts");
        std::future::pending::<()>().await;
    }
}

fn main() {
    let matches = cli().get_matches();
    init_logging(matches.get_count("VERBOSE"));

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(async_main(&matches)) {
        tracing::debug!(error = ?e, "exiting with error");
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

async fn async_main(matches: &ArgMatches) -> DiagResult<()> {
    match matches.subcommand() {
        Some(("zfetchstat", args)) => {
            let config = zfetchstat::Config::try_from(args)?;
            let outcome = zfetchstat::run(config, shutdown_signal()).await?;
            tracing::info!(?outcome, "zfetchstat finished");
            Ok(())
        }
        Some(("kstat-analyzer", args)) => analyzer::run(analyzer::Config::try_from(args)?),
        Some(("fio2influx", args)) => fio::run(fio::Config::try_from(args)?),
        Some(("zpool-influxdb", args)) => pool::run(pool::Config::try_from(args)?).await,
        Some(("zedlet", args)) => zed::run(zed::Config::try_from(args)?).await,
        Some((name, _)) => Err(DiagError::config_error("command", &format!("unknown command {}", name))),
        None => Err(DiagError::config_error("command", "no command given")),
    }
}
