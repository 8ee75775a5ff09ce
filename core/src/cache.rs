use crate::error::Result;
use crate::storage::{read_partition_table, IndexPaths, PartitionTable};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Bounded LRU cache of loaded merged-partition files.
///
/// Strict least-recently-used by access recency: a hit re-marks the entry as
/// most recent, a miss loads the file (a partition with no merged file is a
/// valid empty partition) and evicts the least recently used entry once over
/// capacity. Partitions are read-only at query time, so eviction never
/// writes back. Loaded tables are shared out as `Arc`s so concurrent readers
/// keep using an evicted partition while the lock only covers recency
/// bookkeeping and loads.
pub struct PartitionCache {
    paths: IndexPaths,
    capacity: usize,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    resident: HashMap<String, Arc<PartitionTable>>,
    // Access order, least recent first. Capacity is small; linear reorder
    // is fine.
    order: Vec<String>,
}

impl PartitionCache {
    /// `capacity` is clamped to at least 1.
    pub fn new(paths: IndexPaths, capacity: usize) -> Self {
        Self {
            paths,
            capacity: capacity.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn get(&self, partition: &str) -> Result<Arc<PartitionTable>> {
        let mut inner = self.inner.lock();

        if let Some(table) = inner.resident.get(partition).cloned() {
            mark_recent(&mut inner.order, partition);
            return Ok(table);
        }

        let table = read_partition_table(&self.paths.partition_file(partition))?
            .unwrap_or_default();
        let table = Arc::new(table);
        inner
            .resident
            .insert(partition.to_string(), Arc::clone(&table));
        inner.order.push(partition.to_string());

        if inner.resident.len() > self.capacity {
            let evicted = inner.order.remove(0);
            inner.resident.remove(&evicted);
            tracing::debug!(partition = %evicted, "evicted partition from cache");
        }
        Ok(table)
    }

    /// Partitions currently resident, least recently used first. Test and
    /// diagnostics hook.
    pub fn resident_order(&self) -> Vec<String> {
        self.inner.lock().order.clone()
    }
}

fn mark_recent(order: &mut Vec<String>, partition: &str) {
    if let Some(pos) = order.iter().position(|p| p == partition) {
        let key = order.remove(pos);
        order.push(key);
    }
}
