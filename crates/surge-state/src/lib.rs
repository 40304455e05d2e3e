//! surge-state — capacity history persistence for Surge.
//!
//! Backed by [redb](https://docs.rs/redb). The history is an append-only,
//! capped, ordered list of `CapacitySample` records stored under a single
//! well-known key. `StateStore` is `Clone` + `Send` + `Sync` (backed by
//! `Arc<Database>`) and can be shared across async tasks; `InMemoryHistory`
//! is a drop-in substitute behind the same `HistoryRepository` trait.

pub mod error;
pub mod history;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use history::{HistoryRepository, InMemoryHistory};
pub use store::StateStore;
pub use types::*;
