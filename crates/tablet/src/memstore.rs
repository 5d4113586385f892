// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

//! The delta memstore (DMS, C3): a concurrent, ordered, MVCC-consistent
//! store of per-row updates (spec §4.3).

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_skiplist::SkipMap;
use kudu_anchor::{LogAnchorRegistry, MinLogIndexAnchorer};
use kudu_core::{Error, Result};
use kudu_delta::encoding::{ENCODED_LEN, decode_delta_key, encode_delta_key};
use kudu_delta::{Delta, DeltaKey, OpId, RowChangeList, RowId, RowIteratorOptions, Timestamp};
use parking_lot::Mutex;
use tracing::{instrument, trace};

use crate::arena::Arena;
use crate::iterator::DmsIterator;

type EncodedKey = [u8; ENCODED_LEN];

#[derive(Debug, Clone, Copy)]
struct TimestampBounds {
    lowest: Timestamp,
    highest: Timestamp,
}

/// The lock-free, shareable core of a DMS: the ordered map, the arena,
/// and the diagnostic counters. Split out from [`DeltaMemStore`] so that
/// a [`DmsIterator`] can hold an `Arc` clone without needing the
/// registry lifetime the owning memstore carries (spec §5: "readers hold
/// shared ownership of the DMS so that arena memory outlives any
/// outstanding iterator").
pub(crate) struct DeltaMemStoreCore {
    pub(crate) map: SkipMap<EncodedKey, Arc<[u8]>>,
    arena: Arena,
    count: AtomicUsize,
    deleted_row_count: AtomicUsize,
    bounds: Mutex<Option<TimestampBounds>>,
}

impl DeltaMemStoreCore {
    fn new(arena_chunk_bytes: usize) -> Self {
        Self {
            map: SkipMap::new(),
            arena: Arena::new(arena_chunk_bytes),
            count: AtomicUsize::new(0),
            deleted_row_count: AtomicUsize::new(0),
            bounds: Mutex::new(None),
        }
    }

    fn update_bounds(&self, ts: Timestamp) {
        let mut bounds = self.bounds.lock();
        *bounds = Some(match *bounds {
            None => TimestampBounds { lowest: ts, highest: ts },
            Some(b) => TimestampBounds {
                lowest: if ts < b.lowest { ts } else { b.lowest },
                highest: if ts > b.highest { ts } else { b.highest },
            },
        });
    }

    fn lowest_timestamp(&self) -> Option<Timestamp> {
        self.bounds.lock().map(|b| b.lowest)
    }
}

/// A concurrent, ordered map of `DeltaKey -> RowChangeList` backed by a
/// thread-safe arena (spec §4.3).
///
/// Constructed only through [`DeltaMemStore::create`], which hands back
/// a shared handle (spec §9: "construct via factory; the factory hands
/// out a shared handle").
pub struct DeltaMemStore<'r> {
    core: Arc<DeltaMemStoreCore>,
    anchorer: MinLogIndexAnchorer<'r>,
}

impl<'r> DeltaMemStore<'r> {
    /// Builds a fresh, empty DMS anchored against `registry`.
    pub fn create(
        registry: &'r LogAnchorRegistry,
        owner: impl Into<String>,
        arena_chunk_bytes: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            core: Arc::new(DeltaMemStoreCore::new(arena_chunk_bytes)),
            anchorer: MinLogIndexAnchorer::new(registry, owner),
        })
    }

    /// Encodes and inserts one mutation. Retries with an incremented
    /// disambiguator on a literal `(row_ordinal, timestamp)` collision
    /// (spec §4.3, scenario 5 in spec §8).
    #[instrument(level = "trace", skip(self, change_list))]
    pub fn update(
        &self,
        timestamp: Timestamp,
        row_ordinal: RowId,
        change_list: RowChangeList,
        op_id: OpId,
    ) -> Result<()> {
        let encoded_change_list = self.core.arena.alloc_copy(change_list.as_encoded_bytes());
        let mut disambiguator = 0u32;
        loop {
            let key = DeltaKey::with_disambiguator(row_ordinal, timestamp, disambiguator);
            let encoded_key = encode_delta_key(&key);
            let entry = self.core.map.get_or_insert(encoded_key, Arc::clone(&encoded_change_list));
            if Arc::ptr_eq(entry.value(), &encoded_change_list) {
                break;
            }
            disambiguator = disambiguator
                .checked_add(1)
                .ok_or_else(|| Error::illegal_state("disambiguator space exhausted for one key"))?;
        }

        self.core.update_bounds(timestamp);
        self.core.count.fetch_add(1, Ordering::Relaxed);
        if change_list.is_delete() {
            self.core.deleted_row_count.fetch_add(1, Ordering::Relaxed);
        }
        self.anchorer.anchor_if_minimum(op_id.index)?;
        trace!(row_ordinal = row_ordinal.0, timestamp = timestamp.0, index = op_id.index, "applied delta");
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.core.count.load(Ordering::Relaxed)
    }

    pub fn deleted_row_count(&self) -> usize {
        self.core.deleted_row_count.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Arena memory footprint, in bytes.
    pub fn estimate_size(&self) -> usize {
        self.core.arena.allocated_bytes()
    }

    pub fn min_log_index(&self) -> Option<u64> {
        self.anchorer.current_min_index()
    }

    /// Iterates the tree in key order and emits every delta to `writer`;
    /// on success, releases the anchor (spec §4.3).
    #[instrument(level = "debug", skip(self, writer))]
    pub fn flush_to_file(&self, writer: &mut dyn crate::delta_iterator::DeltaFileWriter) -> Result<()> {
        for entry in self.core.map.iter() {
            let key = decode_delta_key(entry.key())?;
            let change_list = RowChangeList::from_encoded(Arc::clone(entry.value()))?;
            writer.write_delta(&Delta::new(key, change_list))?;
        }
        writer.finish()?;
        self.anchorer.release_anchor();
        Ok(())
    }

    /// Constructs a [`DmsIterator`] scoped to `opts`'s MVCC snapshot. If
    /// the snapshot demonstrably excludes every delta in this DMS, this
    /// returns `NotFound` so the caller can skip this store entirely.
    pub fn new_delta_iterator(&self, opts: &RowIteratorOptions<'_>) -> Result<DmsIterator> {
        if let Some(lowest) = self.core.lowest_timestamp() {
            if opts.snapshot.excludes_everything_from(lowest) {
                return Err(Error::not_found("snapshot excludes every delta in this memstore"));
            }
        }
        Ok(DmsIterator::new(Arc::clone(&self.core)))
    }

    /// Scans deltas for `row_ordinal`, honoring the snapshot in `opts`,
    /// and reports the MVCC-consistent deleted-ness of the row.
    pub fn check_row_deleted(&self, row_ordinal: RowId, opts: &RowIteratorOptions<'_>) -> Result<bool> {
        let lower = encode_delta_key(&DeltaKey::new(row_ordinal, Timestamp::MIN));
        let upper_ordinal = row_ordinal.0.checked_add(1);
        let mut last_visible_is_delete = false;
        let mut saw_any_visible = false;

        for entry in self.core.map.range(lower..) {
            let key = decode_delta_key(entry.key())?;
            if let Some(next_row) = upper_ordinal {
                if key.row_ordinal.0 >= next_row {
                    break;
                }
            }
            if key.row_ordinal != row_ordinal {
                break;
            }
            if !opts.snapshot.is_visible(key.timestamp) {
                continue;
            }
            let change_list = RowChangeList::from_encoded(Arc::clone(entry.value()))?;
            last_visible_is_delete = change_list.is_delete();
            saw_any_visible = true;
        }

        Ok(saw_any_visible && last_visible_is_delete)
    }
}
