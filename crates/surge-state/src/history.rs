//! History repository interface and the in-memory implementation.
//!
//! Both implementations keep at most `capacity` samples and evict exactly
//! one oldest sample per append once full, so the retained window is always
//! the most recent `capacity` appends in their original order.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::{StateError, StateResult};
use crate::types::CapacitySample;

/// Append-only, capped store of capacity samples.
pub trait HistoryRepository: Send + Sync {
    /// Append one sample, evicting the oldest if the store is full.
    fn append(&self, sample: &CapacitySample) -> StateResult<()>;

    /// The most recent `limit` samples, oldest first.
    fn list_recent(&self, limit: usize) -> StateResult<Vec<CapacitySample>>;

    /// Number of samples currently retained.
    fn len(&self) -> StateResult<usize>;

    fn is_empty(&self) -> StateResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Push onto a capped deque, dropping the single oldest entry first.
pub(crate) fn push_capped(
    ring: &mut VecDeque<CapacitySample>,
    sample: CapacitySample,
    capacity: usize,
) {
    while ring.len() >= capacity {
        ring.pop_front();
    }
    ring.push_back(sample);
}

/// Tail of `ring` holding at most `limit` entries, oldest first.
pub(crate) fn tail(ring: &VecDeque<CapacitySample>, limit: usize) -> Vec<CapacitySample> {
    let skip = ring.len().saturating_sub(limit);
    ring.iter().skip(skip).cloned().collect()
}

/// Process-local history ring. Used in tests and when no data directory is
/// configured.
#[derive(Clone)]
pub struct InMemoryHistory {
    ring: Arc<Mutex<VecDeque<CapacitySample>>>,
    capacity: usize,
}

impl InMemoryHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl HistoryRepository for InMemoryHistory {
    fn append(&self, sample: &CapacitySample) -> StateResult<()> {
        let mut ring = self
            .ring
            .lock()
            .map_err(|e| StateError::Unavailable(e.to_string()))?;
        push_capped(&mut ring, sample.clone(), self.capacity);
        Ok(())
    }

    fn list_recent(&self, limit: usize) -> StateResult<Vec<CapacitySample>> {
        let ring = self
            .ring
            .lock()
            .map_err(|e| StateError::Unavailable(e.to_string()))?;
        Ok(tail(&ring, limit))
    }

    fn len(&self) -> StateResult<usize> {
        let ring = self
            .ring
            .lock()
            .map_err(|e| StateError::Unavailable(e.to_string()))?;
        Ok(ring.len())
    }
}
