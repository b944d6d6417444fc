//! Calculation History Storage
//!
//! Append-only sink for lag calculation rows. The compute core writes to it
//! and never reads back for its own logic; reads exist for the history
//! endpoint and retention pruning only.
//!
//! - `HistoryStorage`: sled-backed, durable
//! - `InMemoryHistory`: bounded in-memory store for tests and minimal runs

pub mod history;
mod memory;

pub use history::{HistoryStorage, StorageStats};
pub use memory::InMemoryHistory;

use crate::types::CalculationRecord;

/// Trait for pluggable history backends
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across async tasks.
pub trait HistorySink: Send + Sync {
    /// Append one calculation row
    fn append(&self, record: &CalculationRecord) -> Result<(), StorageError>;

    /// Most recent rows, newest first
    fn recent(&self, limit: usize) -> Result<Vec<CalculationRecord>, StorageError>;

    /// Number of stored rows
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}
