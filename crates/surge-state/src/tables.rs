//! redb table definitions for the Surge state store.
//!
//! Values are JSON-serialized domain types stored in `&[u8]` columns.

use redb::TableDefinition;

/// Capacity history, a single JSON array stored under [`HISTORY_KEY`].
pub const CAPACITY_HISTORY: TableDefinition<&str, &[u8]> =
    TableDefinition::new("capacity_history");

/// Well-known key holding the ordered sample array.
pub const HISTORY_KEY: &str = "samples";
