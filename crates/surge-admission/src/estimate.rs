//! Advisory projections: optimization headroom and deferred-upgrade savings.
//!
//! Nothing here feeds back into admission. `total_potential` is its own
//! ratio and is intentionally not the sum of the two component estimates.

use serde::{Deserialize, Serialize};

use surge_core::{PolicyConstants, TierCatalog, TierConfig};

/// Sentinel for "no hard ceiling, only wait time".
pub const UNBOUNDED: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationPotential {
    pub with_throttling: u32,
    pub with_degradation: u32,
    pub with_queue: u32,
    pub total_potential: u32,
}

impl OptimizationPotential {
    /// Extra clients optimizations could absorb on a tier of `max_capacity`.
    /// Depends on nothing but `max_capacity` and the ratios.
    pub fn for_capacity(max_capacity: u32, policy: &PolicyConstants) -> Self {
        let share = |ratio: f64| (max_capacity as f64 * ratio).floor() as u32;
        Self {
            with_throttling: share(policy.throttling_gain_ratio),
            with_degradation: share(policy.degradation_gain_ratio),
            with_queue: UNBOUNDED,
            total_potential: share(policy.total_gain_ratio),
        }
    }
}

/// Money saved by staying on `current` for `days_delayed` days instead of
/// upgrading along the catalog's upgrade path. Zero at the top tier.
pub fn savings(
    catalog: &TierCatalog,
    current: &TierConfig,
    days_delayed: u32,
    policy: &PolicyConstants,
) -> f64 {
    let next = catalog.next_tier(current);
    let daily_delta = (next.monthly_cost - current.monthly_cost) / policy.billing_days_per_month;
    daily_delta * days_delayed as f64
}
