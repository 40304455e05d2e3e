//! surge-admission — capacity-aware admission control.
//!
//! Pure policy functions of (tier, load, time), plus the controller that
//! strings them together once per tick.
//!
//! # Pipeline
//!
//! ```text
//! connections ──▶ CapacityStatus ──▶ capacity_percent
//!                      │                   ├──▶ OptimizationMode (4 bands)
//!                      │                   ├──▶ UpdateCadence    (3 bands)
//!                      │                   └──▶ stale_timeout    (3 bands)
//!                      │
//!                      └── should_enable_queue?
//!                              └──▶ PriorityAccess + estimate_position
//!
//! CapacityReport ──▶ watch subscribers (ops API)
//!                └─▶ MetricsRecorder (best-effort history)
//! ```
//!
//! Bands use inclusive lower bounds: exactly 70, 85, or 100 percent selects
//! the higher band.

pub mod cadence;
pub mod controller;
pub mod estimate;
pub mod mode;
pub mod priority;
pub mod queue;
pub mod status;

pub use cadence::{UpdateCadence, is_stale, reap, stale_timeout};
pub use controller::{
    AdmissionDecision, CapacityController, CapacityReport, ClientContext, ConnectionSource,
};
pub use estimate::{OptimizationPotential, UNBOUNDED, savings};
pub use mode::{CompressionLevel, LoadBand, OptimizationMode, UpdateRate};
pub use priority::PriorityAccess;
pub use queue::{QueueEntry, QueuePosition, estimate_position, service_order};
pub use status::CapacityStatus;
