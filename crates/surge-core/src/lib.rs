//! surge-core — tier catalog, policy constants, and configuration.
//!
//! Everything here is static input to the admission engine: the catalog of
//! infrastructure tiers, the named thresholds that drive load bands, the
//! client membership types, and the `surge.toml` parser.

pub mod config;
pub mod error;
pub mod policy;
pub mod tiers;
pub mod types;

pub use config::{SurgeConfig, parse_duration};
pub use error::ConfigError;
pub use policy::PolicyConstants;
pub use tiers::{TierCatalog, TierConfig};
pub use types::*;
