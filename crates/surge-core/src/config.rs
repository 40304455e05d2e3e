//! surge.toml configuration parser.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::policy::PolicyConstants;
use crate::tiers::{LOWEST_TIER_ID, TierCatalog, TierConfig};

/// Environment variable that overrides `[tier].id`.
pub const TIER_ENV_VAR: &str = "SURGE_TIER";

/// Default number of capacity samples kept in the history ring.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurgeConfig {
    #[serde(default)]
    pub tier: TierSelection,
    #[serde(default)]
    pub policy: PolicyConstants,
    #[serde(default)]
    pub priority: PriorityConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    /// Replaces the built-in catalog when present.
    pub tiers: Option<Vec<TierConfig>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierSelection {
    pub id: String,
}

impl Default for TierSelection {
    fn default() -> Self {
        Self {
            id: LOWEST_TIER_ID.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriorityConfig {
    /// Operator / owner identities that always get priority access.
    #[serde(default)]
    pub operators: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub history_capacity: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Tick interval, e.g. "5s" or "1m".
    pub tick_interval: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_interval: "5s".to_string(),
        }
    }
}

impl SurgeConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SurgeConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.policy.validate()?;
        self.catalog()?;
        self.tick_interval()?;
        if self.metrics.history_capacity == 0 {
            return Err(ConfigError::InvalidPolicy(
                "metrics.history_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// The configured catalog, or the built-in ladder.
    pub fn catalog(&self) -> Result<TierCatalog, ConfigError> {
        match &self.tiers {
            Some(tiers) => TierCatalog::from_tiers(tiers.clone()),
            None => Ok(TierCatalog::builtin()),
        }
    }

    /// The tier identifier to use, with `override_id` (typically the
    /// `SURGE_TIER` environment variable) taking precedence over the file.
    pub fn tier_id<'a>(&'a self, override_id: Option<&'a str>) -> &'a str {
        override_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(self.tier.id.as_str())
    }

    /// The controller tick interval. Must be non-zero.
    pub fn tick_interval(&self) -> Result<Duration, ConfigError> {
        let interval = parse_duration(&self.controller.tick_interval)?;
        if interval.is_zero() {
            return Err(ConfigError::InvalidDuration(format!(
                "controller.tick_interval must be positive, got {:?}",
                self.controller.tick_interval
            )));
        }
        Ok(interval)
    }
}

/// Parse a duration string like "30s", "5m", "250ms", or bare seconds.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let s = s.trim();
    let invalid = || ConfigError::InvalidDuration(s.to_string());
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().map(Duration::from_millis).map_err(|_| invalid())
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().map(Duration::from_secs).map_err(|_| invalid())
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
            .ok_or_else(invalid)
    } else {
        s.parse::<u64>().map(Duration::from_secs).map_err(|_| invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let config: SurgeConfig = toml::from_str("").unwrap();
        assert_eq!(config.tier.id, "free");
        assert_eq!(config.metrics.history_capacity, 1000);
        assert_eq!(config.policy, PolicyConstants::default());
    }

    #[test]
    fn test_parse_full() {
        let toml_str = r#"
[tier]
id = "standard"

[policy]
degraded_band_percent = 90.0

[priority]
operators = ["owner-1", "ops-bot"]

[metrics]
history_capacity = 500

[controller]
tick_interval = "10s"
"#;
        let config: SurgeConfig = toml::from_str(toml_str).unwrap();
        config.validate().unwrap();
        assert_eq!(config.tier.id, "standard");
        assert_eq!(config.policy.degraded_band_percent, 90.0);
        assert_eq!(config.policy.reduced_band_percent, 70.0);
        assert_eq!(config.priority.operators.len(), 2);
        assert_eq!(config.tick_interval().unwrap(), Duration::from_secs(10));
    }

    #[test]
    fn test_round_trip_toml() {
        let config = SurgeConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("[tier]"));
        let parsed: SurgeConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.tier.id, config.tier.id);
    }

    #[test]
    fn env_override_wins_unless_blank() {
        let config = SurgeConfig::default();
        assert_eq!(config.tier_id(Some("pro")), "pro");
        assert_eq!(config.tier_id(Some("  ")), "free");
        assert_eq!(config.tier_id(None), "free");
    }

    #[test]
    fn custom_catalog_is_validated() {
        let toml_str = r#"
[[tiers]]
id = "solo"
max_concurrent = 10
safe_concurrent = 20
priority_slots = 1
monthly_cost = 0.0
upgrades_to = "solo"
"#;
        let config: SurgeConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SurgeConfig::load_or_default(&dir.path().join("surge.toml")).unwrap();
        assert_eq!(config.tier.id, "free");
    }

    #[test]
    fn parse_duration_values() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("7").unwrap(), Duration::from_secs(7));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn parse_duration_rejects_minute_overflow() {
        assert!(parse_duration(&format!("{}m", u64::MAX)).is_err());
        assert!(parse_duration(&format!("{}m", u64::MAX / 60)).is_ok());
    }

    #[test]
    fn zero_tick_interval_is_rejected() {
        for raw in ["0s", "0ms", "0"] {
            let toml_str = format!("[controller]\ntick_interval = \"{raw}\"\n");
            let config: SurgeConfig = toml::from_str(&toml_str).unwrap();
            assert!(config.validate().is_err(), "{raw}");
            assert!(matches!(
                config.tick_interval(),
                Err(ConfigError::InvalidDuration(_))
            ));
        }
    }
}
