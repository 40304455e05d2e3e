//! surge-metrics — capacity history recording and exposition.
//!
//! # Architecture
//!
//! ```text
//! MetricsRecorder
//!   ├── record() ← called once per controller tick, best-effort
//!   └── recent() → history for the dashboard
//!        │
//!        ▼
//!   HistoryRepository (redb StateStore | InMemoryHistory)
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for /metrics endpoint
//! ```

pub mod prometheus;
pub mod recorder;

pub use prometheus::render_prometheus;
pub use recorder::MetricsRecorder;
