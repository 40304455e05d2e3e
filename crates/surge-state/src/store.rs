//! StateStore — redb-backed capacity history.
//!
//! The whole history lives under one well-known key as a JSON array of
//! samples. Every append is a read-modify-write inside a single redb write
//! transaction; redb admits one writer at a time, so concurrent appends
//! never lose updates or reorder the ring. The store supports both on-disk
//! and in-memory backends (the latter for testing).

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::history::{HistoryRepository, push_capped, tail};
use crate::tables::*;
use crate::types::CapacitySample;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe capped history store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
    capacity: usize,
}

impl StateStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path, capacity: usize) -> StateResult<Self> {
        let db = match Database::create(path) {
            Ok(db) => db,
            Err(redb::DatabaseError::DatabaseAlreadyOpen) => {
                return Err(StateError::Locked(path.display().to_string()));
            }
            Err(e) => return Err(StateError::Open(e.to_string())),
        };
        let store = Self {
            db: Arc::new(db),
            capacity: capacity.max(1),
        };
        store.ensure_tables()?;
        debug!(?path, capacity, "history store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory(capacity: usize) -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self {
            db: Arc::new(db),
            capacity: capacity.max(1),
        };
        store.ensure_tables()?;
        debug!(capacity, "in-memory history store opened");
        Ok(store)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Storage))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(CAPACITY_HISTORY).map_err(map_err!(Storage))?;
        txn.commit().map_err(map_err!(Storage))?;
        Ok(())
    }

    /// Read the full ring in a read transaction.
    fn load_ring(&self) -> StateResult<VecDeque<CapacitySample>> {
        let txn = self.db.begin_read().map_err(map_err!(Storage))?;
        let table = txn.open_table(CAPACITY_HISTORY).map_err(map_err!(Storage))?;
        match table.get(HISTORY_KEY).map_err(map_err!(Storage))? {
            Some(guard) => Ok(serde_json::from_slice(guard.value())?),
            None => Ok(VecDeque::new()),
        }
    }
}

impl HistoryRepository for StateStore {
    fn append(&self, sample: &CapacitySample) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Storage))?;
        let retained;
        {
            let mut table = txn.open_table(CAPACITY_HISTORY).map_err(map_err!(Storage))?;
            let existing = table
                .get(HISTORY_KEY)
                .map_err(map_err!(Storage))?
                .map(|guard| guard.value().to_vec());
            let mut ring: VecDeque<CapacitySample> = match existing {
                Some(bytes) => serde_json::from_slice(&bytes)?,
                None => VecDeque::new(),
            };
            push_capped(&mut ring, sample.clone(), self.capacity);
            retained = ring.len();

            let value = serde_json::to_vec(&ring)?;
            table
                .insert(HISTORY_KEY, value.as_slice())
                .map_err(map_err!(Storage))?;
        }
        txn.commit().map_err(map_err!(Storage))?;
        debug!(timestamp = sample.timestamp, retained, "capacity sample stored");
        Ok(())
    }

    fn list_recent(&self, limit: usize) -> StateResult<Vec<CapacitySample>> {
        Ok(tail(&self.load_ring()?, limit))
    }

    fn len(&self) -> StateResult<usize> {
        Ok(self.load_ring()?.len())
    }
}
