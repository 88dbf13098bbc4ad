mod config;
mod exit;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};

use atbridge_session::BridgeSession;
use atbridge_transport::TtyPort;

use crate::config::BridgeFileConfig;
use crate::exit::{session_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::logging::{init_logging, LogFormat, LogLevel};

/// How often the main thread re-checks the session's running flag.
const WAIT_POLL: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(
    name = "atbridge",
    version,
    about = "Translating serial bridge between a host and a cellular modem"
)]
struct Cli {
    /// Path to the bridge configuration file.
    #[arg(long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,

    /// Log output format.
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Minimum log level.
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,
}

fn main() {
    let cli = Cli::parse();

    // The console flag lives in the config file, so logging can only be
    // initialized after the config loads; config errors go to stderr raw.
    let config = match config::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(exit::code_for_config(&err));
        }
    };
    init_logging(cli.log_format, cli.log_level, config.std_out);

    match run(config) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            error!(error = %err, "unhandled bridge failure");
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

fn run(config: BridgeFileConfig) -> CliResult<i32> {
    info!("bridge service started");

    let host = Arc::new(TtyPort::new(&config.source.port, config.source.baudrate));
    let modem = Arc::new(TtyPort::new(
        &config.destination.port,
        config.destination.baudrate,
    ));
    let session = Arc::new(BridgeSession::new(host, modem));

    install_ctrlc_handler(Arc::clone(&session))?;

    // An open failure is a warning, not an exit: the stop path below runs
    // normally and the supervisor decides whether to restart us.
    let start_failure = match session.connect() {
        Ok(()) => None,
        Err(err) => {
            warn!("modem bridge not started");
            Some(session_error("bridge start failed", err))
        }
    };

    while session.is_running() {
        std::thread::sleep(WAIT_POLL);
    }

    info!("bridge service stopped");
    Ok(start_failure.map_or(SUCCESS, |err| err.code))
}

fn install_ctrlc_handler(session: Arc<BridgeSession<TtyPort>>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        session.stop();
    })
    .map_err(|err| {
        CliError::new(
            INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
