//! sled-backed calculation history
//!
//! Key: 8-byte big-endian timestamp (nanoseconds since epoch) followed by an
//! 8-byte big-endian sled id, so rows sort chronologically and two rows in
//! the same nanosecond never collide.
//! Value: JSON-serialized `CalculationRecord`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{HistorySink, StorageError};
use crate::types::CalculationRecord;

/// History storage for lag calculations
#[derive(Clone)]
pub struct HistoryStorage {
    db: Arc<sled::Db>,
}

fn timestamp_key(ts: DateTime<Utc>) -> [u8; 8] {
    let nanos = ts
        .timestamp_nanos_opt()
        .unwrap_or_else(|| ts.timestamp().saturating_mul(1_000_000_000));
    // Pre-1970 timestamps sort first
    u64::try_from(nanos).unwrap_or(0).to_be_bytes()
}

fn decode_timestamp(key: &[u8]) -> Option<DateTime<Utc>> {
    let bytes: [u8; 8] = key.get(..8)?.try_into().ok()?;
    let nanos = i64::try_from(u64::from_be_bytes(bytes)).ok()?;
    Some(DateTime::from_timestamp_nanos(nanos))
}

impl HistoryStorage {
    /// Open or create the history storage at the specified path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref)?;
        info!(path = %path_ref.display(), rows = db.len(), "Lag history storage opened");
        Ok(Self { db: Arc::new(db) })
    }

    /// Store one calculation row.
    ///
    /// Does not flush on each write; sled flushes in the background and a
    /// crash loses at most the last few rows.
    pub fn store(&self, record: &CalculationRecord) -> Result<(), StorageError> {
        let mut key = Vec::with_capacity(16);
        key.extend_from_slice(&timestamp_key(record.timestamp));
        key.extend_from_slice(&self.db.generate_id()?.to_be_bytes());

        let value = serde_json::to_vec(record)?;
        self.db.insert(key, value)?;

        debug!(
            timestamp = %record.timestamp,
            lag_minutes = record.report.lag_time_minutes(),
            "Stored lag calculation"
        );
        Ok(())
    }

    /// Get the most recent N rows (newest first)
    pub fn get_recent_history(&self, limit: usize) -> Result<Vec<CalculationRecord>, StorageError> {
        let mut records = Vec::with_capacity(limit.min(1024));

        for item in self.db.iter().rev() {
            if records.len() >= limit {
                break;
            }
            let (_key, value) = item?;
            match serde_json::from_slice::<CalculationRecord>(&value) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Failed to deserialize stored calculation: {}", e),
            }
        }

        Ok(records)
    }

    /// All rows within a time range (oldest first)
    pub fn get_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalculationRecord>, StorageError> {
        let start_key = timestamp_key(start).to_vec();
        let mut end_key = timestamp_key(end).to_vec();
        end_key.extend_from_slice(&u64::MAX.to_be_bytes());

        let mut records = Vec::new();
        for item in self.db.range(start_key..=end_key) {
            let (_key, value) = item?;
            if let Ok(record) = serde_json::from_slice::<CalculationRecord>(&value) {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Get total number of stored rows
    pub fn count(&self) -> usize {
        self.db.len()
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    /// Delete rows older than the cutoff
    pub fn cleanup_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StorageError> {
        let cutoff_key = timestamp_key(cutoff);

        let mut keys_to_delete = Vec::new();
        for item in self.db.iter() {
            let (key, _) = item?;
            if key.as_ref() < cutoff_key.as_slice() {
                keys_to_delete.push(key);
            } else {
                // Keys are sorted, so we can stop once we hit newer entries
                break;
            }
        }

        let deleted = keys_to_delete.len();
        for key in keys_to_delete {
            self.db.remove(key)?;
        }

        if deleted > 0 {
            self.db.flush()?;
        }
        Ok(deleted)
    }

    /// Prune rows older than `days`
    pub fn prune_older_than_days(&self, days: u32) -> Result<usize, StorageError> {
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        let deleted = self.cleanup_before(cutoff)?;
        if deleted > 0 {
            info!(deleted, days, "Pruned old lag calculations");
        }
        Ok(deleted)
    }

    /// Get storage statistics
    pub fn stats(&self) -> StorageStats {
        let oldest = self
            .db
            .iter()
            .next()
            .and_then(Result::ok)
            .and_then(|(k, _)| decode_timestamp(&k));
        let newest = self
            .db
            .iter()
            .next_back()
            .and_then(Result::ok)
            .and_then(|(k, _)| decode_timestamp(&k));

        StorageStats {
            total_count: self.count(),
            size_bytes: self.db.size_on_disk().unwrap_or(0),
            oldest_timestamp: oldest,
            newest_timestamp: newest,
        }
    }
}

impl HistorySink for HistoryStorage {
    fn append(&self, record: &CalculationRecord) -> Result<(), StorageError> {
        self.store(record)
    }

    fn recent(&self, limit: usize) -> Result<Vec<CalculationRecord>, StorageError> {
        self.get_recent_history(limit)
    }

    fn len(&self) -> usize {
        self.count()
    }

    fn backend_name(&self) -> &'static str {
        "sled"
    }
}

/// Statistics about the storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageStats {
    pub total_count: usize,
    pub size_bytes: u64,
    pub oldest_timestamp: Option<DateTime<Utc>>,
    pub newest_timestamp: Option<DateTime<Utc>>,
}
