//! CLI entry point (§6): `start`, `stop`, `set-mode`, `list-open`, `close`,
//! `reconcile`. Exit codes: 0 success, 64 usage error, 69 broker
//! unavailable, 70 internal error.
//!
//! Trade durability is simplified to in-memory for this engine
//! (`engine_trader::InMemoryPositionStore`); every invocation other than
//! `start` therefore builds a fresh [`Supervisor`], lets its start-up
//! reconciliation (§5) rebuild state from the broker, performs the
//! requested action, and exits. `start` is the only long-running
//! invocation and writes a pidfile so `stop` can signal it.

use clap::{Parser, Subcommand};
use engine_core::{config::load_instrument_specs, EngineConfig, Supervisor};
use engine_data::NullCandleSink;
use engine_execution::PaperBrokerGateway;
use engine_trader::{InMemoryPositionStore, Mode, TradeId};
use std::{process::ExitCode, sync::Arc};

const EXIT_USAGE: u8 = 64;
const EXIT_BROKER_UNAVAILABLE: u8 = 69;
const EXIT_INTERNAL: u8 = 70;

#[derive(Parser)]
#[command(name = "tucano", about = "Intraday equities trading engine")]
struct Cli {
    /// Path to the engine config JSON.
    #[arg(long, default_value = "config.json", global = true)]
    config: String,

    /// Path to the instrument manifest JSON.
    #[arg(long, default_value = "instruments.json", global = true)]
    instruments: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the engine and block until SIGINT/SIGTERM.
    Start,
    /// Signal a running engine (started with `start`) to shut down.
    Stop,
    /// Switch the Position Store namespace.
    SetMode { mode: ModeArg },
    /// List currently open trades.
    ListOpen,
    /// Close an open trade by id, cancelling its conditional order.
    Close { trade_id: u64 },
    /// Reconcile Position Store state against the broker.
    Reconcile,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ModeArg {
    Paper,
    Live,
}

impl From<ModeArg> for Mode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Paper => Mode::Paper,
            ModeArg::Live => Mode::Live,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match EngineConfig::load(&cli.config) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("config error: {error}");
            return ExitCode::from(EXIT_USAGE);
        }
    };
    engine_core::logging::init_from_format(config.log_format);

    let instruments = match load_instrument_specs(&cli.instruments) {
        Ok(map) => map,
        Err(error) => {
            eprintln!("instrument manifest error: {error}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    if config.mode == Mode::Live {
        tracing::error!("live mode requires a broker adapter not bundled with this binary");
        return ExitCode::from(EXIT_BROKER_UNAVAILABLE);
    }

    let manifest_specs: Vec<_> = instruments.values().cloned().collect();
    let manifest = match engine_markets::InstrumentManifest::build(manifest_specs.clone()) {
        Ok(manifest) => manifest,
        Err(error) => {
            eprintln!("manifest error: {error}");
            return ExitCode::from(EXIT_USAGE);
        }
    };
    let gateway: Arc<dyn engine_execution::BrokerGateway> =
        Arc::new(PaperBrokerGateway::new(Arc::new(manifest)));
    let store: Arc<dyn engine_trader::PositionStore> = Arc::new(InMemoryPositionStore::new());
    let sink: Arc<dyn engine_data::CandleSink> = Arc::new(NullCandleSink);

    let supervisor = match Supervisor::build(config, manifest_specs, gateway, store, sink) {
        Ok(supervisor) => Arc::new(supervisor),
        Err(error) => {
            tracing::error!(?error, "failed to build supervisor");
            return ExitCode::from(EXIT_INTERNAL);
        }
    };

    if let Err(error) = supervisor.reconcile().await {
        tracing::error!(?error, "start-up reconciliation failed");
        return ExitCode::from(EXIT_BROKER_UNAVAILABLE);
    }

    match cli.command {
        Command::Start => run_until_signal(supervisor).await,
        Command::Stop => {
            stop_running_engine();
            ExitCode::SUCCESS
        }
        Command::SetMode { mode } => {
            supervisor.set_mode(mode.into());
            ExitCode::SUCCESS
        }
        Command::ListOpen => {
            for trade in supervisor.list_open() {
                println!(
                    "{}\t{}\t{:?}\tqty={}\tentry={}",
                    trade.id.0, trade.symbol, trade.status, trade.qty, trade.entry_price
                );
            }
            ExitCode::SUCCESS
        }
        Command::Close { trade_id } => match supervisor.close(TradeId(trade_id)).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                tracing::error!(?error, trade_id, "close failed");
                ExitCode::from(EXIT_INTERNAL)
            }
        },
        Command::Reconcile => ExitCode::SUCCESS, // already reconciled above
    }
}

async fn run_until_signal(supervisor: Arc<Supervisor>) -> ExitCode {
    if let Err(error) = supervisor.start().await {
        tracing::error!(?error, "failed to start supervisor");
        return ExitCode::from(EXIT_BROKER_UNAVAILABLE);
    }
    write_pidfile();

    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(signal) => signal,
        Err(error) => {
            tracing::error!(?error, "failed to install SIGTERM handler");
            return ExitCode::from(EXIT_INTERNAL);
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }

    match supervisor.stop().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(?error, "shutdown error");
            ExitCode::from(EXIT_INTERNAL)
        }
    }
}

const PIDFILE: &str = "tucano.pid";

fn write_pidfile() {
    let _ = std::fs::write(PIDFILE, std::process::id().to_string());
}

fn stop_running_engine() {
    let Ok(contents) = std::fs::read_to_string(PIDFILE) else {
        eprintln!("no running engine found ({PIDFILE} missing)");
        return;
    };
    let pid = contents.trim();
    let status = std::process::Command::new("kill")
        .args(["-TERM", pid])
        .status();
    match status {
        Ok(status) if status.success() => {}
        _ => eprintln!("failed to signal pid {pid}"),
    }
}
