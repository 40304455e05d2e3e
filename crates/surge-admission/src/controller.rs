//! Capacity controller — the per-tick admission pipeline.
//!
//! Each tick reads the live connection count, derives the capacity status,
//! optimization mode, update cadence, and stale timeout from the injected
//! tier, publishes the resulting report to subscribers, and records a
//! history sample. Everything but the recording step is recomputed from
//! scratch, so there is no stored state to drift.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use surge_core::{ClientId, MembershipStatus, PolicyConstants, TierCatalog, TierConfig, VipStatus};
use surge_metrics::MetricsRecorder;
use surge_state::CapacitySample;

use crate::cadence::{UpdateCadence, stale_timeout};
use crate::estimate::{OptimizationPotential, savings};
use crate::mode::{LoadBand, OptimizationMode};
use crate::priority::PriorityAccess;
use crate::queue::{QueueEntry, QueuePosition, estimate_position};
use crate::status::CapacityStatus;

/// Supplier of the live connection count.
pub trait ConnectionSource: Send + Sync {
    fn current_connections(&self) -> anyhow::Result<u32>;
}

impl ConnectionSource for AtomicU32 {
    fn current_connections(&self) -> anyhow::Result<u32> {
        Ok(self.load(Ordering::Relaxed))
    }
}

/// Everything a tick derives for one connection count.
#[derive(Debug, Clone, Serialize)]
pub struct CapacityReport {
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    pub tier_id: String,
    pub band: LoadBand,
    pub status: CapacityStatus,
    pub mode: OptimizationMode,
    pub cadence: UpdateCadence,
    pub stale_timeout_ms: u64,
    pub potential: OptimizationPotential,
}

impl CapacityReport {
    pub fn to_sample(&self) -> CapacitySample {
        CapacitySample {
            timestamp: self.timestamp,
            connections: self.status.current_load,
            queue_length: self.status.queue_length(),
            capacity_percent: self.status.capacity_percent(),
            active_optimizations: self.mode.active_optimizations(),
        }
    }
}

/// A client asking to join, with whatever account data is available.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientContext {
    pub client_id: ClientId,
    pub membership: Option<MembershipStatus>,
    pub vip: Option<VipStatus>,
}

/// What the connection-accept path should do with a new client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AdmissionDecision {
    Admit,
    /// Admit, but apply the throttled update cadence.
    AdmitThrottled,
    Enqueue {
        priority: bool,
        position: QueuePosition,
    },
}

pub struct CapacityController {
    tier: TierConfig,
    catalog: TierCatalog,
    policy: PolicyConstants,
    access: PriorityAccess,
    recorder: Option<MetricsRecorder>,
    reports: watch::Sender<Option<CapacityReport>>,
}

impl CapacityController {
    pub fn new(tier: TierConfig, catalog: TierCatalog, policy: PolicyConstants) -> Self {
        let (reports, _) = watch::channel(None);
        Self {
            tier,
            catalog,
            policy,
            access: PriorityAccess::default(),
            recorder: None,
            reports,
        }
    }

    pub fn with_priority_access(mut self, access: PriorityAccess) -> Self {
        self.access = access;
        self
    }

    pub fn with_recorder(mut self, recorder: MetricsRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn tier(&self) -> &TierConfig {
        &self.tier
    }

    pub fn catalog(&self) -> &TierCatalog {
        &self.catalog
    }

    pub fn recorder(&self) -> Option<&MetricsRecorder> {
        self.recorder.as_ref()
    }

    /// Receiver that always holds the most recent tick's report.
    pub fn subscribe(&self) -> watch::Receiver<Option<CapacityReport>> {
        self.reports.subscribe()
    }

    /// Derive a report for `connections` without recording or publishing.
    pub fn evaluate(&self, connections: u32) -> CapacityReport {
        let status = CapacityStatus::compute_with(&self.tier, connections, &self.policy);
        let percent = status.capacity_percent();

        CapacityReport {
            timestamp: epoch_millis(),
            tier_id: self.tier.id.clone(),
            band: LoadBand::for_load(percent, &self.policy),
            mode: OptimizationMode::for_load(percent, &self.policy),
            cadence: UpdateCadence::for_load(percent, &self.policy),
            stale_timeout_ms: stale_timeout(percent, &self.policy).as_millis() as u64,
            potential: OptimizationPotential::for_capacity(self.tier.max_concurrent, &self.policy),
            status,
        }
    }

    /// Evaluate, publish, and record one tick.
    pub fn tick(&self, connections: u32) -> CapacityReport {
        let report = self.publish(connections);
        if let Some(recorder) = &self.recorder {
            recorder.record(&report.to_sample());
        }
        report
    }

    /// Evaluate and publish to subscribers, without recording.
    fn publish(&self, connections: u32) -> CapacityReport {
        let report = self.evaluate(connections);

        debug!(
            tier = %report.tier_id,
            connections,
            capacity_percent = report.status.capacity_percent(),
            band = report.band.label(),
            "capacity tick"
        );

        let previous_band = self.reports.borrow().as_ref().map(|r| r.band);
        if previous_band.is_some_and(|b| b != report.band) {
            info!(
                tier = %report.tier_id,
                from = previous_band.map(|b| b.label()).unwrap_or("none"),
                to = report.band.label(),
                connections,
                "load band changed"
            );
        }

        self.reports.send_replace(Some(report.clone()));
        report
    }

    /// Tick from inside the runtime. The history write is a blocking redb
    /// commit of the whole ring, so it runs on the blocking pool; the report
    /// is already published by then.
    async fn tick_async(&self, connections: u32) {
        let report = self.publish(connections);
        let Some(recorder) = self.recorder.clone() else {
            return;
        };
        let sample = report.to_sample();
        if let Err(e) = tokio::task::spawn_blocking(move || recorder.record(&sample)).await {
            warn!(error = %e, "history write task failed");
        }
    }

    /// Decide what to do with a client arriving at `status`.
    ///
    /// Priority and queue position are only looked at once the hard ceiling
    /// is reached.
    pub fn admit(
        &self,
        status: &CapacityStatus,
        client: &ClientContext,
        queue: &[QueueEntry],
    ) -> AdmissionDecision {
        if !status.should_enable_queue() {
            return if status.should_throttle() {
                AdmissionDecision::AdmitThrottled
            } else {
                AdmissionDecision::Admit
            };
        }

        let priority = self.access.has_priority(
            &client.client_id,
            client.membership.as_ref(),
            client.vip.as_ref(),
        );
        let position = self.queue_position(queue, &client.client_id);
        debug!(
            client = %client.client_id,
            priority,
            position = position.position,
            "client queued"
        );
        AdmissionDecision::Enqueue { priority, position }
    }

    pub fn queue_position(&self, queue: &[QueueEntry], client_id: &str) -> QueuePosition {
        estimate_position(queue, client_id, &self.policy)
    }

    /// Money saved so far by not upgrading the active tier.
    pub fn savings(&self, days_delayed: u32) -> f64 {
        savings(&self.catalog, &self.tier, days_delayed, &self.policy)
    }

    /// Run the tick loop until shutdown.
    pub async fn run(
        &self,
        source: &dyn ConnectionSource,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(
            tier = %self.tier.id,
            interval_ms = interval.as_millis() as u64,
            "capacity controller started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    match source.current_connections() {
                        Ok(connections) => self.tick_async(connections).await,
                        Err(e) => {
                            warn!(error = %e, "failed to read connection count, skipping tick");
                        }
                    }
                }
                _ = shutdown.changed() => {
                    info!("capacity controller shutting down");
                    break;
                }
            }
        }
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
