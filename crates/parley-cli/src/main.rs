//! Parley console client.
//!
//! Lines typed on stdin go to the server; messages relayed by the server are
//! printed on stdout, one per line. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Join the default server as $USER
//! parley
//!
//! # Join a text-mode server under another name
//! parley --host chat.example.org --port 4000 --name alice --mode text
//! ```
//!
//! A setup failure exits with the status documented on
//! [`parley_client::Failure`]. Type `bye` to leave.

use std::{process::ExitCode, time::Duration};

use clap::Parser;
use parley_client::{
    ClientError, ConnectionManager, DEFAULT_HOST, DEFAULT_PORT, Failure, LineReader, RunFlag,
    SessionConfig,
};
use parley_proto::{FrameWriter, PayloadMode};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Parley chat client
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Console client for the Parley chat protocol")]
#[command(version)]
struct Args {
    /// Server host name or address
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Server port (must be > 1024)
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Participant name shown to others
    #[arg(short, long, env = "USER", default_value = "")]
    name: String,

    /// Frame shape the server sends (text, structured)
    #[arg(short, long, default_value = "structured")]
    mode: PayloadMode,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            host: self.host.clone(),
            port: self.port,
            name: self.name.clone(),
            wire_mode: self.mode,
        }
    }
}

/// Grace period for blocking stdin reads once the session is over.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

fn main() -> ExitCode {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to start runtime");
            return exit_with(Failure::Other);
        },
    };

    let status = match runtime.block_on(run(args.session_config())) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => exit_with(e.failure()),
    };

    // A stdin read may still be parked on a blocking thread.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    status
}

async fn run(config: SessionConfig) -> Result<(), ClientError> {
    config.validate().inspect_err(|e| error!(error = %e, "invalid configuration"))?;

    info!(
        host = %config.host,
        port = config.port,
        name = %config.name,
        mode = %config.wire_mode,
        "connecting"
    );

    let source = LineReader::new(tokio::io::stdin());
    let sink = FrameWriter::new(tokio::io::stdout(), PayloadMode::Text);
    let mut session = ConnectionManager::connect(config, source, sink, RunFlag::new()).await?;

    let report = session.run().await?;
    info!(outbound = %report.outbound, inbound = %report.inbound, "session ended");
    Ok(())
}

fn exit_with(failure: Failure) -> ExitCode {
    error!(exit_code = failure.exit_code(), "{failure}");
    ExitCode::from(failure.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_session_defaults() {
        let args = Args::parse_from(["parley", "--name", "alice"]);
        let config = args.session_config();

        assert_eq!(config, SessionConfig::new("alice"));
    }

    #[test]
    fn mode_parses_from_flag() {
        let args = Args::parse_from(["parley", "--name", "bob", "--mode", "text", "--port", "4000"]);

        assert_eq!(args.mode, PayloadMode::Text);
        assert_eq!(args.port, 4000);
    }

    #[test]
    fn empty_name_fails_validation() {
        let args = Args::parse_from(["parley", "--name", ""]);

        let err = args.session_config().validate().unwrap_err();
        assert_eq!(err.failure(), Failure::NoUserName);
    }
}
