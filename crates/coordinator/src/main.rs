// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! `lanesd`: the runnable entrypoint that loads one run's configuration and
//! drives it to completion (spec.md §1, §5). Mirrors the teacher's daemon
//! main loop shape — load config, install signal handlers, drive the
//! engine loop, exit with its status code — simplified since this binary
//! has no socket listener of its own.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use lanes_adapters::child::{ChildSpawner, TokioChildSpawner};
use lanes_adapters::command_runner::{CommandRunner, ShellCommandRunner};
use lanes_adapters::source_control::{GitSourceControl, SourceControl};
use lanes_core::SystemClock;
use lanes_engine::{Coordinator, EventBus};
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

use config::RunConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = parse_config_path(std::env::args().skip(1));
    let _log_guard = init_tracing(&config_path)?;

    let run_config = RunConfig::load(&config_path)?;
    tracing::info!(lanes = run_config.lane_set.len(), "loaded run configuration");

    let spawner: Arc<dyn ChildSpawner> = Arc::new(TokioChildSpawner);
    let source_control: Arc<dyn SourceControl> =
        Arc::new(GitSourceControl::new(run_config.coordinator.repo_root.clone()));
    let command_runner: Arc<dyn CommandRunner> = Arc::new(ShellCommandRunner);
    let events = EventBus::default();

    let mut coordinator = Coordinator::new(
        run_config.lane_set,
        run_config.coordinator,
        spawner,
        source_control,
        command_runner,
        events,
        SystemClock,
    );

    let shutdown = CancellationToken::new();
    spawn_signal_watcher(shutdown.clone());

    let exit_code = coordinator.run(shutdown).await;
    tracing::info!(run_id = %coordinator.run_id(), exit_code, "run finished");
    std::process::exit(exit_code);
}

/// `--config <path>` is the only flag this binary accepts (spec.md §1: the
/// full CLI surface is out of scope); everything else comes from the
/// config file itself.
fn parse_config_path(mut args: impl Iterator<Item = String>) -> PathBuf {
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return PathBuf::from(path);
            }
        }
    }
    PathBuf::from("lanes.toml")
}

/// Cancels `shutdown` on SIGTERM or SIGINT (spec.md §5 graceful stop).
fn spawn_signal_watcher(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        tokio::select! {
            _ = term.recv() => tracing::info!("received SIGTERM"),
            _ = tokio::signal::ctrl_c() => tracing::info!("received SIGINT"),
        }
        shutdown.cancel();
    });
}

/// Structured logging to stderr plus the coordinator's own operational log
/// file under `<logsDir>/coordinator.log` (spec.md §6 ambient addition,
/// distinct from the per-lane raw/readable sinks the engine owns).
fn init_tracing(
    config_path: &std::path::Path,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    let logs_dir = config_path.parent().unwrap_or_else(|| std::path::Path::new(".")).join("logs");
    std::fs::create_dir_all(&logs_dir)?;
    let file_appender = tracing_appender::rolling::never(&logs_dir, "coordinator.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    Ok(guard)
}
