//! Connection count sources for the tick loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU32;

use anyhow::Context;

use surge_admission::ConnectionSource;

/// Reads the count from a file that an external connection tracker
/// rewrites. The file holds a single non-negative integer.
pub struct FileConnectionSource {
    path: PathBuf,
}

impl FileConnectionSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ConnectionSource for FileConnectionSource {
    fn current_connections(&self) -> anyhow::Result<u32> {
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading connection count from {}", self.path.display()))?;
        let raw = raw.trim();
        raw.parse::<u32>().with_context(|| {
            format!("invalid connection count {raw:?} in {}", self.path.display())
        })
    }
}

/// Pick the source for `surged run`: a tracker file if given, otherwise a
/// fixed count (zero by default).
pub fn select(
    connections_file: Option<PathBuf>,
    connections: Option<u32>,
) -> Arc<dyn ConnectionSource> {
    match connections_file {
        Some(path) => Arc::new(FileConnectionSource::new(path)),
        None => Arc::new(AtomicU32::new(connections.unwrap_or(0))),
    }
}
