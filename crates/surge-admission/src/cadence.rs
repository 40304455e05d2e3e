//! Load-scaled timing: stale-connection timeouts and update cadence.
//!
//! Both are step functions over two breakpoints (the elevated and critical
//! band edges). The overloaded band is not distinguished from critical.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use surge_core::PolicyConstants;

use crate::mode::LoadBand;

/// Three-step band used for timing decisions.
fn cadence_band(capacity_percent: f64, policy: &PolicyConstants) -> LoadBand {
    match LoadBand::for_load(capacity_percent, policy) {
        LoadBand::Overloaded => LoadBand::Critical,
        band => band,
    }
}

fn pick(band: LoadBand, normal: u64, elevated: u64, critical: u64) -> u64 {
    match band {
        LoadBand::Normal => normal,
        LoadBand::Elevated => elevated,
        LoadBand::Critical | LoadBand::Overloaded => critical,
    }
}

/// Inactivity timeout after which an idle connection should be evicted.
pub fn stale_timeout(capacity_percent: f64, policy: &PolicyConstants) -> Duration {
    Duration::from_millis(pick(
        cadence_band(capacity_percent, policy),
        policy.stale_timeout_normal_ms,
        policy.stale_timeout_elevated_ms,
        policy.stale_timeout_critical_ms,
    ))
}

/// Whether a connection last active at `last_activity_ms` is stale at
/// `now_ms`. Timestamps are unix milliseconds.
pub fn is_stale(
    last_activity_ms: u64,
    now_ms: u64,
    capacity_percent: f64,
    policy: &PolicyConstants,
) -> bool {
    let idle = now_ms.saturating_sub(last_activity_ms);
    idle >= stale_timeout(capacity_percent, policy).as_millis() as u64
}

/// Ids of connections that have been idle past the current timeout.
pub fn reap<'a, I>(
    connections: I,
    now_ms: u64,
    capacity_percent: f64,
    policy: &PolicyConstants,
) -> Vec<&'a str>
where
    I: IntoIterator<Item = (&'a str, u64)>,
{
    connections
        .into_iter()
        .filter(|(_, last)| is_stale(*last, now_ms, capacity_percent, policy))
        .map(|(id, _)| id)
        .collect()
}

/// Client render tick and server push interval for the current load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCadence {
    pub render_tick_ms: u64,
    pub push_interval_ms: u64,
}

impl UpdateCadence {
    pub fn for_load(capacity_percent: f64, policy: &PolicyConstants) -> Self {
        let band = cadence_band(capacity_percent, policy);
        Self {
            render_tick_ms: pick(
                band,
                policy.render_tick_normal_ms,
                policy.render_tick_elevated_ms,
                policy.render_tick_critical_ms,
            ),
            push_interval_ms: pick(
                band,
                policy.push_interval_normal_ms,
                policy.push_interval_elevated_ms,
                policy.push_interval_critical_ms,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PolicyConstants {
        PolicyConstants::default()
    }

    #[test]
    fn stale_timeout_steps() {
        let p = policy();
        assert_eq!(stale_timeout(0.0, &p), Duration::from_millis(300_000));
        assert_eq!(stale_timeout(69.999, &p), Duration::from_millis(300_000));
        assert_eq!(stale_timeout(70.0, &p), Duration::from_millis(180_000));
        assert_eq!(stale_timeout(84.999, &p), Duration::from_millis(180_000));
        assert_eq!(stale_timeout(85.0, &p), Duration::from_millis(60_000));
        assert_eq!(stale_timeout(250.0, &p), Duration::from_millis(60_000));
    }

    #[test]
    fn cadence_steps() {
        let p = policy();
        let cases = [
            (10.0, 16, 1000),
            (70.0, 33, 2000),
            (84.0, 33, 2000),
            (85.0, 66, 5000),
            (100.0, 66, 5000),
            (180.0, 66, 5000),
        ];
        for (pct, tick, push) in cases {
            let c = UpdateCadence::for_load(pct, &p);
            assert_eq!(c.render_tick_ms, tick, "{pct}");
            assert_eq!(c.push_interval_ms, push, "{pct}");
        }
    }

    #[test]
    fn overloaded_matches_critical() {
        let p = policy();
        assert_eq!(UpdateCadence::for_load(99.0, &p), UpdateCadence::for_load(130.0, &p));
        assert_eq!(stale_timeout(99.0, &p), stale_timeout(130.0, &p));
    }

    #[test]
    fn staleness_shrinks_with_load() {
        let p = policy();
        let last = 1_000_000;
        let now = last + 120_000;
        assert!(!is_stale(last, now, 50.0, &p));
        assert!(!is_stale(last, now, 75.0, &p));
        assert!(is_stale(last, now, 90.0, &p));
        // Clock skew never counts as idle time.
        assert!(!is_stale(now, last, 90.0, &p));
    }

    #[test]
    fn reap_selects_idle_connections() {
        let p = policy();
        let now = 10_000_000;
        let conns = vec![("fresh", now - 1_000), ("idle", now - 200_000), ("ancient", 0)];
        assert_eq!(reap(conns.clone(), now, 10.0, &p), vec!["ancient"]);
        assert_eq!(reap(conns, now, 75.0, &p), vec!["idle", "ancient"]);
    }
}
