//! wardend - punishment registry daemon.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use warden::config::{Config, validate};
use warden::db::Database;
use warden::punish::{PunishmentRegistry, spawn_autosave_task};
use warden::{http, metrics};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "{} configuration error(s) in {}",
            errors.len(),
            config_path
        ));
    }

    info!(server = %config.server.name, db = %config.database.path, "Starting wardend");

    let db = Database::new(&config.database.path).await?;
    let registry = Arc::new(PunishmentRegistry::new(Arc::new(db.clone())));

    if config.persistence.load_on_startup {
        let report = registry.load().await;
        if !report.failed.is_empty() {
            warn!(failed = ?report.failed, "Some punishment kinds failed to load");
        }
    } else {
        // Queries are answered from memory while this runs
        let load = registry.spawn_load();
        tokio::spawn(async move {
            match load.await {
                Ok(report) if !report.failed.is_empty() => {
                    warn!(failed = ?report.failed, "Some punishment kinds failed to load");
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "Background punishment load aborted"),
            }
        });
        info!("Loading punishments in the background");
    }

    // Prometheus metrics are optional.
    // metrics_port = 0 disables the HTTP endpoint.
    let metrics_port = config.server.metrics_port.unwrap_or(9090);
    if metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        metrics::init();
        tokio::spawn(async move {
            http::run_http_server(metrics_port).await;
        });
        info!(port = metrics_port, "Prometheus HTTP server started");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let autosave = match config.persistence.autosave_period() {
        Some(period) => {
            info!(period_secs = period.as_secs(), "Autosave task started");
            Some(spawn_autosave_task(Arc::clone(&registry), period, shutdown_rx))
        }
        None => {
            info!("Autosave disabled; saving on shutdown only");
            None
        }
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    let _ = shutdown_tx.send(true);
    if let Some(handle) = autosave {
        if let Err(e) = handle.await {
            warn!(error = %e, "Autosave task ended abnormally");
        }
    }

    let report = registry.save().await;
    if report.failed > 0 {
        error!(failed = report.failed, "Final save left unwritten punishments");
    } else {
        info!(inserted = report.inserted, deleted = report.deleted, "Final save complete");
    }

    db.close().await;
    Ok(())
}
