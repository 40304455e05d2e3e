//! Queue position estimation.
//!
//! The waiting list is two FIFO classes: every priority entry is served
//! before any regular entry, and within a class entries are served by
//! `enqueued_at` (ties keep the supplied order). The caller owns the list;
//! this module only reads it.

use serde::{Deserialize, Serialize};

use surge_core::{ClientId, PolicyConstants};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub client_id: ClientId,
    /// Unix timestamp in milliseconds.
    pub enqueued_at: u64,
    pub has_priority: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuePosition {
    /// 1-based position in service order.
    pub position: u32,
    pub estimated_wait_secs: u64,
}

/// Position and wait estimate for `client_id`.
///
/// A client that is not in the queue is reported as about to be appended:
/// position `len + 1` with the fixed fallback wait.
pub fn estimate_position(
    queue: &[QueueEntry],
    client_id: &str,
    policy: &PolicyConstants,
) -> QueuePosition {
    let (priority, regular) = classes(queue);

    if let Some(idx) = priority.iter().position(|e| e.client_id == client_id) {
        let position = idx as u32 + 1;
        return QueuePosition {
            position,
            estimated_wait_secs: position as u64 * policy.priority_wait_secs,
        };
    }

    if let Some(idx) = regular.iter().position(|e| e.client_id == client_id) {
        let position = idx as u32 + 1 + priority.len() as u32;
        return QueuePosition {
            position,
            estimated_wait_secs: position as u64 * policy.regular_wait_secs,
        };
    }

    QueuePosition {
        position: queue.len() as u32 + 1,
        estimated_wait_secs: policy.unknown_position_wait_secs,
    }
}

/// Client ids in the order they will be served.
pub fn service_order(queue: &[QueueEntry]) -> Vec<&str> {
    let (priority, regular) = classes(queue);
    priority
        .into_iter()
        .chain(regular)
        .map(|e| e.client_id.as_str())
        .collect()
}

/// Split into (priority, regular), each stably sorted by arrival time.
fn classes(queue: &[QueueEntry]) -> (Vec<&QueueEntry>, Vec<&QueueEntry>) {
    let (mut priority, mut regular): (Vec<&QueueEntry>, Vec<&QueueEntry>) =
        queue.iter().partition(|e| e.has_priority);
    priority.sort_by_key(|e| e.enqueued_at);
    regular.sort_by_key(|e| e.enqueued_at);
    (priority, regular)
}
