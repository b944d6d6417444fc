use std::collections::VecDeque;
use std::sync::RwLock;

use super::{HistorySink, StorageError};
use crate::types::CalculationRecord;

/// In-memory history for testing and minimal deployments
///
/// Thread-safe via `RwLock`. Not durable, data lost on restart. The oldest
/// row is evicted once `capacity` is reached.
pub struct InMemoryHistory {
    records: RwLock<VecDeque<CalculationRecord>>,
    capacity: usize,
}

impl InMemoryHistory {
    /// Create a new in-memory store with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(1_000)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl HistorySink for InMemoryHistory {
    fn append(&self, record: &CalculationRecord) -> Result<(), StorageError> {
        let mut store = self.records.write().map_err(|_| StorageError::Poisoned)?;
        store.push_back(record.clone());
        while store.len() > self.capacity {
            store.pop_front();
        }
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<CalculationRecord>, StorageError> {
        let store = self.records.read().map_err(|_| StorageError::Poisoned)?;
        Ok(store.iter().rev().take(limit).cloned().collect())
    }

    fn len(&self) -> usize {
        self.records.read().map(|s| s.len()).unwrap_or(0)
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}
