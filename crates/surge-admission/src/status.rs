//! Capacity status — the per-tick view of load against the active tier.
//!
//! Only source values are stored; the advisory flags are derived on every
//! read so they can never disagree with the numbers they come from.

use serde::{Serialize, Serializer};
use serde::ser::SerializeStruct;

use surge_core::{PolicyConstants, TierConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct CapacityStatus {
    pub current_load: u32,
    pub max_capacity: u32,
    pub safe_capacity: u32,
    pub priority_slots: u32,
    throttle_percent: f64,
    degrade_percent: f64,
}

impl CapacityStatus {
    /// Compute the status of `tier` at `current_connections` with the
    /// default thresholds.
    pub fn compute(tier: &TierConfig, current_connections: u32) -> Self {
        Self::compute_with(tier, current_connections, &PolicyConstants::default())
    }

    pub fn compute_with(
        tier: &TierConfig,
        current_connections: u32,
        policy: &PolicyConstants,
    ) -> Self {
        Self {
            current_load: current_connections,
            max_capacity: tier.max_concurrent,
            safe_capacity: tier.safe_concurrent,
            priority_slots: tier.priority_slots,
            throttle_percent: policy.throttle_percent,
            degrade_percent: policy.degrade_percent,
        }
    }

    /// `current_load / safe_capacity * 100`, unbounded above 100.
    pub fn capacity_percent(&self) -> f64 {
        if self.safe_capacity == 0 {
            return if self.current_load == 0 { 0.0 } else { f64::INFINITY };
        }
        // Multiply first so exact ratios (105 of 150) land exactly on 70.0.
        self.current_load as f64 * 100.0 / self.safe_capacity as f64
    }

    pub fn available_slots(&self) -> u32 {
        self.max_capacity.saturating_sub(self.current_load)
    }

    pub fn queue_length(&self) -> u32 {
        self.current_load.saturating_sub(self.max_capacity)
    }

    pub fn should_enable_queue(&self) -> bool {
        self.current_load >= self.max_capacity
    }

    pub fn should_enable_degradation(&self) -> bool {
        self.capacity_percent() >= self.degrade_percent
    }

    pub fn should_throttle(&self) -> bool {
        self.capacity_percent() >= self.throttle_percent
    }
}

impl Serialize for CapacityStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("CapacityStatus", 10)?;
        s.serialize_field("current_load", &self.current_load)?;
        s.serialize_field("max_capacity", &self.max_capacity)?;
        s.serialize_field("safe_capacity", &self.safe_capacity)?;
        s.serialize_field("available_slots", &self.available_slots())?;
        s.serialize_field("priority_slots", &self.priority_slots)?;
        s.serialize_field("queue_length", &self.queue_length())?;
        s.serialize_field("capacity_percent", &self.capacity_percent())?;
        s.serialize_field("should_enable_queue", &self.should_enable_queue())?;
        s.serialize_field("should_enable_degradation", &self.should_enable_degradation())?;
        s.serialize_field("should_throttle", &self.should_throttle())?;
        s.end()
    }
}
