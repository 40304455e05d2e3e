//! Infrastructure tier catalog.
//!
//! Each tier is a named capacity class with a hard concurrency ceiling, a
//! "safe" ceiling below which no degradation applies, a number of slots
//! reserved for priority clients, and a monthly cost. Tiers are listed
//! lowest-capacity first; the first entry is the fallback for unrecognized
//! identifiers.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// Identifier of the tier every process falls back to.
pub const LOWEST_TIER_ID: &str = "free";

/// A single infrastructure tier. Immutable once the catalog is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierConfig {
    pub id: String,
    /// Hard ceiling; at or above this load new clients are queued.
    pub max_concurrent: u32,
    /// Load at which `capacity_percent` reaches 100.
    pub safe_concurrent: u32,
    /// Capacity reserved for privileged clients.
    pub priority_slots: u32,
    /// Monthly cost in USD.
    pub monthly_cost: f64,
    /// Tier this one upgrades to. The top tier points at itself.
    pub upgrades_to: String,
}

impl TierConfig {
    /// Check the structural invariants of a tier definition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.safe_concurrent == 0 || self.safe_concurrent >= self.max_concurrent {
            return Err(ConfigError::InvalidTier {
                tier: self.id.clone(),
                reason: format!(
                    "safe_concurrent ({}) must be in 1..max_concurrent ({})",
                    self.safe_concurrent, self.max_concurrent
                ),
            });
        }
        if self.priority_slots > self.safe_concurrent {
            return Err(ConfigError::InvalidTier {
                tier: self.id.clone(),
                reason: format!(
                    "priority_slots ({}) exceeds safe_concurrent ({})",
                    self.priority_slots, self.safe_concurrent
                ),
            });
        }
        if self.monthly_cost.is_nan() || self.monthly_cost < 0.0 {
            return Err(ConfigError::InvalidTier {
                tier: self.id.clone(),
                reason: format!("monthly_cost ({}) must be >= 0", self.monthly_cost),
            });
        }
        Ok(())
    }

    pub fn is_top(&self) -> bool {
        self.upgrades_to == self.id
    }
}

/// Ordered table of tiers, lowest capacity first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierCatalog {
    tiers: Vec<TierConfig>,
}

impl Default for TierCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TierCatalog {
    /// The built-in five-tier ladder.
    pub fn builtin() -> Self {
        let tier = |id: &str, max, safe, priority, cost, next: &str| TierConfig {
            id: id.to_string(),
            max_concurrent: max,
            safe_concurrent: safe,
            priority_slots: priority,
            monthly_cost: cost,
            upgrades_to: next.to_string(),
        };

        Self {
            tiers: vec![
                tier(LOWEST_TIER_ID, 50, 35, 5, 0.0, "hobby"),
                tier("hobby", 100, 75, 10, 7.0, "standard"),
                tier("standard", 200, 150, 20, 25.0, "pro"),
                tier("pro", 500, 400, 50, 85.0, "scale"),
                tier("scale", 1000, 800, 100, 250.0, "scale"),
            ],
        }
    }

    /// Build a catalog from explicit tiers, validating each entry and the
    /// upgrade path.
    pub fn from_tiers(tiers: Vec<TierConfig>) -> Result<Self, ConfigError> {
        if tiers.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        for t in &tiers {
            t.validate()?;
            if !tiers.iter().any(|other| other.id == t.upgrades_to) {
                return Err(ConfigError::InvalidTier {
                    tier: t.id.clone(),
                    reason: format!("upgrade target '{}' is not in the catalog", t.upgrades_to),
                });
            }
        }
        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[TierConfig] {
        &self.tiers
    }

    pub fn get(&self, id: &str) -> Option<&TierConfig> {
        self.tiers.iter().find(|t| t.id == id)
    }

    /// The lowest-capacity tier.
    pub fn lowest(&self) -> &TierConfig {
        // from_tiers and builtin both guarantee at least one entry.
        &self.tiers[0]
    }

    /// Resolve a tier identifier, falling back to the lowest tier when the
    /// identifier is unrecognized.
    pub fn resolve(&self, id: &str) -> &TierConfig {
        match self.get(id) {
            Some(tier) => tier,
            None => {
                let fallback = self.lowest();
                warn!(
                    requested = %id,
                    fallback = %fallback.id,
                    "unrecognized tier identifier, using lowest tier"
                );
                fallback
            }
        }
    }

    /// The tier `tier` upgrades to. Returns `tier` itself at the top of the
    /// ladder or when the path is broken.
    pub fn next_tier<'a>(&'a self, tier: &'a TierConfig) -> &'a TierConfig {
        self.get(&tier.upgrades_to).unwrap_or(tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = TierCatalog::builtin();
        assert_eq!(catalog.tiers().len(), 5);
        for t in catalog.tiers() {
            t.validate().unwrap();
        }
        assert!(TierCatalog::from_tiers(catalog.tiers().to_vec()).is_ok());
    }

    #[test]
    fn resolve_known_tier() {
        let catalog = TierCatalog::builtin();
        let tier = catalog.resolve("standard");
        assert_eq!(tier.max_concurrent, 200);
        assert_eq!(tier.safe_concurrent, 150);
    }

    #[test]
    fn resolve_unknown_falls_back_to_lowest() {
        let catalog = TierCatalog::builtin();
        assert_eq!(catalog.resolve("platinum-ultra").id, LOWEST_TIER_ID);
        assert_eq!(catalog.resolve("").id, LOWEST_TIER_ID);
    }

    #[test]
    fn upgrade_path_ends_at_top() {
        let catalog = TierCatalog::builtin();
        let top = catalog.resolve("scale");
        assert!(top.is_top());
        assert_eq!(catalog.next_tier(top).id, "scale");
        assert_eq!(catalog.next_tier(catalog.resolve("free")).id, "hobby");
    }

    #[test]
    fn rejects_safe_at_or_above_max() {
        let mut tier = TierCatalog::builtin().lowest().clone();
        tier.safe_concurrent = tier.max_concurrent;
        assert!(matches!(tier.validate(), Err(ConfigError::InvalidTier { .. })));
    }

    #[test]
    fn rejects_priority_above_safe() {
        let mut tier = TierCatalog::builtin().lowest().clone();
        tier.priority_slots = tier.safe_concurrent + 1;
        assert!(tier.validate().is_err());
    }

    #[test]
    fn rejects_dangling_upgrade_path() {
        let mut tier = TierCatalog::builtin().lowest().clone();
        tier.upgrades_to = "nowhere".to_string();
        assert!(TierCatalog::from_tiers(vec![tier]).is_err());
    }

    #[test]
    fn rejects_empty_catalog() {
        assert!(matches!(
            TierCatalog::from_tiers(Vec::new()),
            Err(ConfigError::EmptyCatalog)
        ));
    }
}
