use clap::Parser;
use eyre::{Result, WrapErr};
use log::{error, info};
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::watch;

use notifier_core::app::{Dispatcher, DispatcherBuilder, StopReason};
use notifier_core::impls::{InfluxWriter, NomadEventStream, SplunkSink, TimeSeriesSink};

mod cli;
mod config;

/// 終了時にブロッキング中の読み取りスレッドを待つ上限
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

use cli::{Cli, LogLevel};
use config::Settings;

fn setup_logging(log_level: LogLevel) {
    // RUST_LOG env var takes precedence, otherwise use --log-level
    let mut builder = env_logger::Builder::new();
    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        builder.filter_level(log_level.as_filter());
    }
    builder
        .format_timestamp_millis()
        .target(env_logger::Target::Stderr)
        .init();
}

fn build_dispatcher(settings: Settings) -> Result<Dispatcher> {
    let mut builder = DispatcherBuilder::new()
        .source(NomadEventStream::new(settings.nomad))
        .subscription(settings.subscription)
        .policy(settings.policy);

    if let Some(influx) = settings.influx {
        info!("InfluxDB output enabled ({}, bucket {})", influx.url, influx.bucket);
        builder = builder.sink(TimeSeriesSink::new(InfluxWriter::new(influx)));
    }
    if let Some(splunk) = settings.splunk {
        info!("Splunk HEC output enabled ({})", splunk.endpoint);
        builder = builder.sink(SplunkSink::new(splunk));
    }

    builder.build().wrap_err("Failed to build dispatcher")
}

/// SIGINT / SIGTERM を shutdown channel に流す
fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).wrap_err("Failed to install SIGTERM handler")?;
        tokio::spawn(async move {
            tokio::select! {
                res = tokio::signal::ctrl_c() => match res {
                    Ok(()) => info!("received SIGINT, shutting down"),
                    Err(e) => error!("failed to listen for SIGINT: {e}"),
                },
                _ = term.recv() => info!("received SIGTERM, shutting down"),
            }
            // ignore send error: dispatcher may already be gone
            let _ = shutdown_tx.send(true);
        });
    }

    #[cfg(not(unix))]
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl-C, shutting down"),
            Err(e) => error!("failed to listen for Ctrl-C: {e}"),
        }
        let _ = shutdown_tx.send(true);
    });

    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let settings = Settings::from_env(&cli).wrap_err("Invalid configuration")?;
    let mut dispatcher = build_dispatcher(settings)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    spawn_signal_handler(shutdown_tx)?;

    let report = dispatcher.run(shutdown_rx).await.wrap_err("Dispatcher failed")?;
    info!("final stats: {}", report.stats);

    Ok(match report.reason {
        StopReason::Cancelled => ExitCode::SUCCESS,
        StopReason::SourceClosed => {
            error!("event stream ended unexpectedly");
            ExitCode::FAILURE
        }
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.log_level);

    info!("Starting nomad-notifier");

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to start tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let code = match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:?}");
            ExitCode::FAILURE
        }
    };
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    code
}
