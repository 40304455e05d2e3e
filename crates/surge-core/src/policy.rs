//! Policy constants for load bands, estimates, and cadences.
//!
//! Every threshold the admission engine uses lives here, so a tuning change
//! is a single field edit.
//!
//! ```text
//! capacity_percent   0 ──── 70 ──── 80 ── 85 ──── 100 ────▶
//! status flags            throttle   degrade
//! mode bands       normal │ elevated │  critical  │ overloaded
//! cadence bands    normal │ elevated │        critical
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PolicyConstants {
    /// `CapacityStatus::should_throttle` threshold.
    pub throttle_percent: f64,
    /// `CapacityStatus::should_enable_degradation` threshold.
    pub degrade_percent: f64,

    /// Lower bound of the elevated band (throttling, caching, reduced updates).
    pub reduced_band_percent: f64,
    /// Lower bound of the critical band (degradation, animations off).
    pub degraded_band_percent: f64,
    /// Lower bound of the overloaded band (queue on).
    pub queue_band_percent: f64,

    pub throttling_gain_ratio: f64,
    pub degradation_gain_ratio: f64,
    /// Deliberately not the sum of the two ratios above.
    pub total_gain_ratio: f64,

    pub priority_wait_secs: u64,
    pub regular_wait_secs: u64,
    /// Wait reported for a client that is not in the queue yet.
    pub unknown_position_wait_secs: u64,

    pub stale_timeout_normal_ms: u64,
    pub stale_timeout_elevated_ms: u64,
    pub stale_timeout_critical_ms: u64,

    pub render_tick_normal_ms: u64,
    pub render_tick_elevated_ms: u64,
    pub render_tick_critical_ms: u64,

    pub push_interval_normal_ms: u64,
    pub push_interval_elevated_ms: u64,
    pub push_interval_critical_ms: u64,

    /// Days used to turn a monthly cost into a daily one.
    pub billing_days_per_month: f64,
}

impl Default for PolicyConstants {
    fn default() -> Self {
        Self {
            throttle_percent: 70.0,
            degrade_percent: 80.0,

            reduced_band_percent: 70.0,
            degraded_band_percent: 85.0,
            queue_band_percent: 100.0,

            throttling_gain_ratio: 0.10,
            degradation_gain_ratio: 0.15,
            total_gain_ratio: 0.25,

            priority_wait_secs: 5,
            regular_wait_secs: 30,
            unknown_position_wait_secs: 300,

            stale_timeout_normal_ms: 300_000,
            stale_timeout_elevated_ms: 180_000,
            stale_timeout_critical_ms: 60_000,

            render_tick_normal_ms: 16,
            render_tick_elevated_ms: 33,
            render_tick_critical_ms: 66,

            push_interval_normal_ms: 1_000,
            push_interval_elevated_ms: 2_000,
            push_interval_critical_ms: 5_000,

            billing_days_per_month: 30.0,
        }
    }
}

impl PolicyConstants {
    /// Reject band boundaries that would make the mode bands overlap or
    /// run backwards.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bands = [
            ("reduced_band_percent", self.reduced_band_percent),
            ("degraded_band_percent", self.degraded_band_percent),
            ("queue_band_percent", self.queue_band_percent),
        ];
        for pair in bands.windows(2) {
            let (lo_name, lo) = pair[0];
            let (hi_name, hi) = pair[1];
            if lo >= hi {
                return Err(ConfigError::InvalidPolicy(format!(
                    "{lo_name} ({lo}) must be below {hi_name} ({hi})"
                )));
            }
        }
        if self.throttle_percent > self.degrade_percent {
            return Err(ConfigError::InvalidPolicy(format!(
                "throttle_percent ({}) must not exceed degrade_percent ({})",
                self.throttle_percent, self.degrade_percent
            )));
        }
        if self.billing_days_per_month <= 0.0 {
            return Err(ConfigError::InvalidPolicy(
                "billing_days_per_month must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
