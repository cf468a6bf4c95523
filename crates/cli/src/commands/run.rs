//! `run` command implementation.

use anyhow::{Context, Result};
use motion_stream::ReplayConfig;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::session::{MotionMode, Session, SessionConfig};

/// Execute the `run` command
pub async fn run_session(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        devices = config.devices.len(),
        enabled = config.enabled_devices().count(),
        "Configuration loaded"
    );

    if args.metrics_port != 0 {
        observability::serve_metrics(args.metrics_port)?;
    }

    let motion = match &args.replay {
        Some(path) => {
            info!(path = %path.display(), "Running in REPLAY mode");
            MotionMode::Replay {
                path: path.clone(),
                config: ReplayConfig {
                    speed_multiplier: args.replay_speed,
                    loop_playback: args.replay_loop,
                },
            }
        }
        None => {
            info!(rate_hz = args.rate, "Running with synthetic motion");
            MotionMode::Mock { rate_hz: args.rate }
        }
    };

    let session = Session::new(SessionConfig {
        config,
        duration: (args.duration > 0).then(|| Duration::from_secs(args.duration)),
        motion,
    });

    let stats = session
        .run(shutdown_signal())
        .await
        .context("Session failed")?;

    stats.print_summary();

    info!("Tracker Bridge finished");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
