//! Error types for catalog and policy configuration.

use thiserror::Error;

/// Semantic configuration errors. Parse failures surface as `anyhow` errors
/// from [`crate::SurgeConfig::from_file`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid tier '{tier}': {reason}")]
    InvalidTier { tier: String, reason: String },

    #[error("tier catalog is empty")]
    EmptyCatalog,

    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("invalid duration: {0}")]
    InvalidDuration(String),
}
