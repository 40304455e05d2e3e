//! `surged run` — controller loop plus ops API in one process.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info};

use surge_admission::{CapacityController, PriorityAccess};
use surge_core::SurgeConfig;
use surge_metrics::MetricsRecorder;
use surge_state::StateStore;

pub struct DaemonOptions {
    pub port: u16,
    pub data_dir: PathBuf,
    pub connections_file: Option<PathBuf>,
    pub connections: Option<u32>,
}

pub const HISTORY_DB_FILE: &str = "surge.redb";

/// Assemble a controller from config. `tier_override` wins over the file's
/// `[tier].id`; an unknown id falls back to the lowest tier.
pub fn build_controller(
    config: &SurgeConfig,
    tier_override: Option<&str>,
    store: Option<StateStore>,
) -> anyhow::Result<CapacityController> {
    let catalog = config.catalog()?;
    let tier = catalog.resolve(config.tier_id(tier_override)).clone();

    let mut controller = CapacityController::new(tier, catalog, config.policy.clone())
        .with_priority_access(PriorityAccess::new(config.priority.operators.iter().cloned()));
    if let Some(store) = store {
        controller = controller.with_recorder(MetricsRecorder::new(Arc::new(store)));
    }
    Ok(controller)
}

pub fn open_history(data_dir: &Path, capacity: usize) -> anyhow::Result<StateStore> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;
    let db_path = data_dir.join(HISTORY_DB_FILE);
    let store = StateStore::open(&db_path, capacity)?;
    info!(path = ?db_path, capacity, "capacity history opened");
    Ok(store)
}

pub async fn run_daemon(
    config: &SurgeConfig,
    tier_override: Option<&str>,
    opts: DaemonOptions,
) -> anyhow::Result<()> {
    info!("Surge daemon starting");

    // ── Initialize subsystems ──────────────────────────────────

    let store = open_history(&opts.data_dir, config.metrics.history_capacity)?;
    let controller = Arc::new(build_controller(config, tier_override, Some(store))?);
    let interval = config.tick_interval()?;
    info!(
        tier = %controller.tier().id,
        max = controller.tier().max_concurrent,
        safe = controller.tier().safe_concurrent,
        "capacity controller initialized"
    );

    let source = crate::source::select(opts.connections_file, opts.connections);

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Start background tasks ─────────────────────────────────

    let loop_controller = controller.clone();
    let controller_handle = tokio::spawn(async move {
        loop_controller.run(source.as_ref(), interval, shutdown_rx).await;
    });

    // ── Start API server ───────────────────────────────────────

    let router = surge_api::build_router(controller);
    let addr = SocketAddr::from(([0, 0, 0, 0], opts.port));

    info!(%addr, "ops API starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for shutdown signal");
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    let _ = controller_handle.await;

    info!("Surge daemon stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_override_wins_over_file() {
        let mut config = SurgeConfig::default();
        config.tier.id = "hobby".to_string();
        assert_eq!(build_controller(&config, None, None).unwrap().tier().id, "hobby");

        let ctl = build_controller(&config, Some("pro"), None).unwrap();
        assert_eq!(ctl.tier().id, "pro");
    }

    #[test]
    fn unknown_tier_falls_back_to_lowest() {
        let ctl = build_controller(&SurgeConfig::default(), Some("enterprise-plus"), None).unwrap();
        assert_eq!(ctl.tier().id, "free");
    }

    #[test]
    fn operators_come_from_config() {
        let mut config = SurgeConfig::default();
        config.priority.operators = vec!["owner-1".to_string()];
        let ctl = build_controller(&config, Some("standard"), None).unwrap();

        let full = ctl.evaluate(200).status;
        let client = surge_admission::ClientContext {
            client_id: "owner-1".to_string(),
            ..Default::default()
        };
        match ctl.admit(&full, &client, &[]) {
            surge_admission::AdmissionDecision::Enqueue { priority, .. } => assert!(priority),
            other => panic!("expected enqueue, got {other:?}"),
        }
    }

    #[test]
    fn history_opens_under_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested");
        let store = open_history(&data_dir, 10).unwrap();
        assert_eq!(store.capacity(), 10);
        assert!(data_dir.join(HISTORY_DB_FILE).exists());
    }
}
