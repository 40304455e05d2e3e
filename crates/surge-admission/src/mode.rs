//! Optimization mode policy.
//!
//! Maps a capacity percentage onto one of four load bands and each band onto
//! a fixed bundle of feature toggles. Band thresholds are inclusive lower
//! bounds, so exactly 70, 85, or 100 selects the higher band.
//!
//! | Band       | Range       | throttle | degrade | no anim | updates | cache | compress | queue |
//! |------------|-------------|----------|---------|---------|---------|-------|----------|-------|
//! | Normal     | `< 70`      | off      | off     | off     | full    | off   | normal   | off   |
//! | Elevated   | `[70, 85)`  | on       | off     | off     | reduced | on    | high     | off   |
//! | Critical   | `[85, 100)` | on       | on      | on      | reduced | on    | maximum  | off   |
//! | Overloaded | `>= 100`    | on       | on      | on      | reduced | on    | maximum  | on    |

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use surge_core::PolicyConstants;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBand {
    Normal,
    Elevated,
    Critical,
    Overloaded,
}

impl LoadBand {
    pub fn for_load(capacity_percent: f64, policy: &PolicyConstants) -> Self {
        if capacity_percent >= policy.queue_band_percent {
            LoadBand::Overloaded
        } else if capacity_percent >= policy.degraded_band_percent {
            LoadBand::Critical
        } else if capacity_percent >= policy.reduced_band_percent {
            LoadBand::Elevated
        } else {
            LoadBand::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoadBand::Normal => "normal",
            LoadBand::Elevated => "elevated",
            LoadBand::Critical => "critical",
            LoadBand::Overloaded => "overloaded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateRate {
    Full,
    Reduced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionLevel {
    Normal,
    High,
    Maximum,
}

/// Feature toggles downstream components apply for the current load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationMode {
    pub enable_throttling: bool,
    pub enable_degradation: bool,
    pub disable_animations: bool,
    pub update_rate: UpdateRate,
    pub enable_caching: bool,
    pub compression: CompressionLevel,
    pub enable_queue: bool,
}

impl OptimizationMode {
    pub fn for_load(capacity_percent: f64, policy: &PolicyConstants) -> Self {
        Self::for_band(LoadBand::for_load(capacity_percent, policy))
    }

    pub fn for_band(band: LoadBand) -> Self {
        match band {
            LoadBand::Normal => Self {
                enable_throttling: false,
                enable_degradation: false,
                disable_animations: false,
                update_rate: UpdateRate::Full,
                enable_caching: false,
                compression: CompressionLevel::Normal,
                enable_queue: false,
            },
            LoadBand::Elevated => Self {
                enable_throttling: true,
                enable_degradation: false,
                disable_animations: false,
                update_rate: UpdateRate::Reduced,
                enable_caching: true,
                compression: CompressionLevel::High,
                enable_queue: false,
            },
            LoadBand::Critical => Self {
                enable_throttling: true,
                enable_degradation: true,
                disable_animations: true,
                update_rate: UpdateRate::Reduced,
                enable_caching: true,
                compression: CompressionLevel::Maximum,
                enable_queue: false,
            },
            LoadBand::Overloaded => Self {
                enable_queue: true,
                ..Self::for_band(LoadBand::Critical)
            },
        }
    }

    /// Names of every optimization this mode switches on.
    pub fn active_optimizations(&self) -> BTreeSet<String> {
        let mut active = BTreeSet::new();
        let mut on = |flag: bool, name: &str| {
            if flag {
                active.insert(name.to_string());
            }
        };
        on(self.enable_throttling, "throttling");
        on(self.enable_degradation, "degradation");
        on(self.disable_animations, "animations_disabled");
        on(self.update_rate == UpdateRate::Reduced, "reduced_updates");
        on(self.enable_caching, "caching");
        on(self.compression == CompressionLevel::High, "compression_high");
        on(self.compression == CompressionLevel::Maximum, "compression_maximum");
        on(self.enable_queue, "queue");
        active
    }
}
