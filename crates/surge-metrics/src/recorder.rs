//! Metrics recorder — best-effort capacity history.
//!
//! Appends go through an injected `HistoryRepository` under a single-writer
//! mutex so append-and-evict is never interleaved. Failures are logged and
//! swallowed; a tick never fails because history could not be written.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use surge_state::{CapacitySample, HistoryRepository};

#[derive(Clone)]
pub struct MetricsRecorder {
    repo: Arc<dyn HistoryRepository>,
    write_lock: Arc<Mutex<()>>,
}

impl MetricsRecorder {
    pub fn new(repo: Arc<dyn HistoryRepository>) -> Self {
        Self {
            repo,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Append a sample. Returns whether it was stored; never errors.
    pub fn record(&self, sample: &CapacitySample) -> bool {
        // A poisoned lock only means another writer panicked; the repository
        // itself is still consistent, so keep writing.
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match self.repo.append(sample) {
            Ok(()) => {
                debug!(
                    timestamp = sample.timestamp,
                    connections = sample.connections,
                    "capacity sample recorded"
                );
                true
            }
            Err(e) => {
                warn!(error = %e, timestamp = sample.timestamp, "failed to record capacity sample");
                false
            }
        }
    }

    /// The latest `limit` samples, oldest first. Empty if the store is
    /// unavailable.
    pub fn recent(&self, limit: usize) -> Vec<CapacitySample> {
        self.repo.list_recent(limit).unwrap_or_else(|e| {
            warn!(error = %e, "failed to read capacity history");
            Vec::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use surge_state::{InMemoryHistory, StateError, StateResult, StateStore};

    fn sample(timestamp: u64) -> CapacitySample {
        CapacitySample {
            timestamp,
            connections: 100,
            queue_length: 0,
            capacity_percent: 66.7,
            active_optimizations: BTreeSet::new(),
        }
    }

    /// Repository whose backing store is gone.
    struct BrokenHistory {
        attempts: AtomicUsize,
    }

    impl HistoryRepository for BrokenHistory {
        fn append(&self, _sample: &CapacitySample) -> StateResult<()> {
            self.attempts.fetch_add(1, Ordering::Relaxed);
            Err(StateError::Unavailable("disk detached".to_string()))
        }

        fn list_recent(&self, _limit: usize) -> StateResult<Vec<CapacitySample>> {
            Err(StateError::Unavailable("disk detached".to_string()))
        }

        fn len(&self) -> StateResult<usize> {
            Err(StateError::Unavailable("disk detached".to_string()))
        }
    }

    #[test]
    fn record_and_read_back() {
        let recorder = MetricsRecorder::new(Arc::new(InMemoryHistory::new(1000)));
        assert!(recorder.record(&sample(1)));
        assert!(recorder.record(&sample(2)));

        assert_eq!(recorder.recent(10).len(), 2);
        assert_eq!(recorder.recent(1)[0].timestamp, 2);
    }

    #[test]
    fn unavailable_store_is_swallowed() {
        let broken = Arc::new(BrokenHistory {
            attempts: AtomicUsize::new(0),
        });
        let recorder = MetricsRecorder::new(broken.clone());

        assert!(!recorder.record(&sample(1)));
        assert!(!recorder.record(&sample(2)));
        assert_eq!(broken.attempts.load(Ordering::Relaxed), 2);
        assert!(recorder.recent(10).is_empty());
    }

    #[test]
    fn never_exceeds_cap() {
        let recorder = MetricsRecorder::new(Arc::new(InMemoryHistory::new(1000)));
        for ts in 0..1001 {
            recorder.record(&sample(ts));
        }
        let all = recorder.recent(usize::MAX);
        assert_eq!(all.len(), 1000);
        assert_eq!(all[0].timestamp, 1);
        assert_eq!(all[999].timestamp, 1000);
    }

    #[test]
    fn concurrent_writers_through_redb() {
        let store = StateStore::open_in_memory(50).unwrap();
        let recorder = MetricsRecorder::new(Arc::new(store.clone()));

        let handles: Vec<_> = (0..4u64)
            .map(|worker| {
                let recorder = recorder.clone();
                std::thread::spawn(move || {
                    for i in 0..30u64 {
                        assert!(recorder.record(&sample(worker * 1000 + i)));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.len().unwrap(), 50);
    }
}
