//! One-shot admin commands. Nothing here touches live admission state.

use std::path::Path;

use surge_admission::ClientContext;
use surge_core::{MembershipStatus, SurgeConfig, VipStatus};
use surge_state::{HistoryRepository, StateError, StateStore};

use crate::daemon::{HISTORY_DB_FILE, build_controller};

pub fn status(config: &SurgeConfig, tier: Option<&str>, connections: u32) -> anyhow::Result<()> {
    let controller = build_controller(config, tier, None)?;
    let report = controller.evaluate(connections);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn admit(
    config: &SurgeConfig,
    tier: Option<&str>,
    client_id: &str,
    connections: u32,
    membership: Option<String>,
    vip: bool,
) -> anyhow::Result<()> {
    let controller = build_controller(config, tier, None)?;
    let status = controller.evaluate(connections).status;
    let client = ClientContext {
        client_id: client_id.to_string(),
        membership: membership.map(MembershipStatus::new),
        vip: vip.then_some(VipStatus { is_active: true }),
    };
    let decision = controller.admit(&status, &client, &[]);
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

pub fn tiers(config: &SurgeConfig, tier: Option<&str>) -> anyhow::Result<()> {
    let catalog = config.catalog()?;
    let active = catalog.resolve(config.tier_id(tier)).id.clone();
    for t in catalog.tiers() {
        let marker = if t.id == active { "*" } else { " " };
        println!(
            "{marker} {:<10} max {:>5}  safe {:>5}  priority {:>4}  ${:>7.2}/mo  -> {}",
            t.id,
            t.max_concurrent,
            t.safe_concurrent,
            t.priority_slots,
            t.monthly_cost,
            t.upgrades_to
        );
    }
    Ok(())
}

pub fn savings(config: &SurgeConfig, tier: Option<&str>, days: u32) -> anyhow::Result<()> {
    let controller = build_controller(config, tier, None)?;
    let current = controller.tier();
    let next = controller.catalog().next_tier(current);
    if next.id == current.id {
        println!("{} is the top tier; nothing to defer", current.id);
    } else {
        println!(
            "Deferring {} -> {} for {days} days saves ${:.2}",
            current.id,
            next.id,
            controller.savings(days)
        );
    }
    Ok(())
}

/// Offline read of the history file. `surged run` holds an exclusive lock
/// on it, so while the daemon is up this points at the ops API instead.
pub fn history(config: &SurgeConfig, data_dir: &Path, limit: usize) -> anyhow::Result<()> {
    let samples = read_history(config, data_dir, limit)?;
    println!("{}", serde_json::to_string_pretty(&samples)?);
    Ok(())
}

fn read_history(
    config: &SurgeConfig,
    data_dir: &Path,
    limit: usize,
) -> anyhow::Result<Vec<surge_state::CapacitySample>> {
    let db_path = data_dir.join(HISTORY_DB_FILE);
    if !db_path.exists() {
        anyhow::bail!("no capacity history at {}", db_path.display());
    }
    let store = match StateStore::open(&db_path, config.metrics.history_capacity) {
        Ok(store) => store,
        Err(StateError::Locked(_)) => anyhow::bail!(
            "capacity history at {} is held by a running `surged run`; \
             query GET /api/v1/history on the daemon instead",
            db_path.display()
        ),
        Err(e) => return Err(e.into()),
    };
    Ok(store.list_recent(limit)?)
}

/// Print the effective configuration, with the resolved tier filled in.
pub fn config(config: &SurgeConfig, tier: Option<&str>) -> anyhow::Result<()> {
    print!("{}", effective_config(config, tier)?);
    Ok(())
}

fn effective_config(config: &SurgeConfig, tier: Option<&str>) -> anyhow::Result<String> {
    let mut effective = config.clone();
    effective.tier.id = config.catalog()?.resolve(config.tier_id(tier)).id.clone();
    effective.to_toml_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use surge_state::CapacitySample;

    fn sample(timestamp: u64) -> CapacitySample {
        CapacitySample {
            timestamp,
            connections: 10,
            queue_length: 0,
            capacity_percent: 6.7,
            active_optimizations: BTreeSet::new(),
        }
    }

    #[test]
    fn history_reads_closed_database() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = StateStore::open(&dir.path().join(HISTORY_DB_FILE), 1000).unwrap();
            store.append(&sample(1)).unwrap();
            store.append(&sample(2)).unwrap();
        }

        let samples = read_history(&SurgeConfig::default(), dir.path(), 1).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].timestamp, 2);
    }

    #[test]
    fn history_while_daemon_holds_lock_points_at_api() {
        let dir = tempfile::tempdir().unwrap();
        let _daemon = StateStore::open(&dir.path().join(HISTORY_DB_FILE), 1000).unwrap();

        let err = read_history(&SurgeConfig::default(), dir.path(), 10).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("surged run"), "{msg}");
        assert!(msg.contains("/api/v1/history"), "{msg}");
    }

    #[test]
    fn history_without_database_does_not_create_one() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_history(&SurgeConfig::default(), dir.path(), 10).unwrap_err();
        assert!(err.to_string().contains("no capacity history"));
        assert!(!dir.path().join(HISTORY_DB_FILE).exists());
    }

    #[test]
    fn effective_config_resolves_tier() {
        let rendered = effective_config(&SurgeConfig::default(), Some("pro")).unwrap();
        let parsed: SurgeConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.tier.id, "pro");
        parsed.validate().unwrap();

        let fallback = effective_config(&SurgeConfig::default(), Some("platinum-plus")).unwrap();
        assert!(fallback.contains("id = \"free\""));
    }
}
