//! In-memory ledger
//!
//! A `BTreeMap` behind a lock. Scans copy the requested range up front, so a
//! cursor sees the key space as it was when the scan opened. The ledger keeps
//! counters for writes and for cursors that have not been released yet.

use crate::storage::{KeyValue, LedgerPort, LedgerResult, RangeScan};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Ledger held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
    writes: AtomicU64,
    open_scans: Arc<AtomicUsize>,
}

impl MemoryLedger {
    /// Empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when no key holds a value
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Puts performed since creation
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Cursors handed out and not yet dropped
    pub fn open_scans(&self) -> usize {
        self.open_scans.load(Ordering::Acquire)
    }
}

impl LedgerPort for MemoryLedger {
    fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> LedgerResult<()> {
        self.entries.write().insert(key.to_string(), value.to_vec());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn scan(&self, start_key: &str, end_key: &str) -> LedgerResult<RangeScan<'_>> {
        let upper = if end_key.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end_key)
        };

        let snapshot: Vec<KeyValue> = {
            let entries = self.entries.read();
            if !end_key.is_empty() && start_key >= end_key {
                Vec::new()
            } else {
                entries
                    .range::<str, _>((Bound::Included(start_key), upper))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            }
        };

        Ok(Box::new(MemoryScan::new(snapshot, self.open_scans.clone())))
    }
}

/// Cursor over a copied range; decrements the open count when dropped
struct MemoryScan {
    items: std::vec::IntoIter<KeyValue>,
    open_scans: Arc<AtomicUsize>,
}

impl MemoryScan {
    fn new(items: Vec<KeyValue>, open_scans: Arc<AtomicUsize>) -> Self {
        open_scans.fetch_add(1, Ordering::AcqRel);
        Self {
            items: items.into_iter(),
            open_scans,
        }
    }
}

impl Iterator for MemoryScan {
    type Item = LedgerResult<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next().map(Ok)
    }
}

impl Drop for MemoryScan {
    fn drop(&mut self) {
        self.open_scans.fetch_sub(1, Ordering::AcqRel);
    }
}
