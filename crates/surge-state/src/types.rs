//! Persisted record types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One capacity observation in the history ring.
///
/// Field names are camelCase on the wire; the dashboard reads them as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CapacitySample {
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    pub connections: u32,
    pub queue_length: u32,
    pub capacity_percent: f64,
    pub active_optimizations: BTreeSet<String>,
}
