// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

//! The shared contract both [`crate::iterator::DmsIterator`] and any
//! frozen-delta-file iterator (out of scope: on-disk formats, spec §1)
//! implement, and the contract [`crate::merger::DeltaIteratorMerger`]
//! (C4) operates over generically.

use kudu_core::Result;
use kudu_delta::{ColumnBlock, ColumnId, Delta, RowId, RowIteratorOptions, SelectionVector};

/// States a [`DeltaIterator`] moves through, in this strict order:
/// `Init` must precede everything; `SeekToOrdinal` must precede
/// `PrepareBatch`; after a prepared batch is consumed, the caller may
/// seek again or prepare again (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IteratorState {
    Constructed,
    Initted,
    Seeked,
    Preparing,
    Prepared,
    Exhausted,
}

/// Combines N delta iterators into one virtual iterator over the same
/// row range (C4), and is itself implemented by the delta memstore's own
/// iterator (C3).
///
/// Every method requires the preceding state transition to already have
/// happened; implementors return `IllegalState` if called out of order.
pub trait DeltaIterator: Send {
    fn init(&mut self, opts: &RowIteratorOptions<'_>) -> Result<()>;

    fn seek_to_ordinal(&mut self, ordinal: RowId) -> Result<()>;

    /// Fixes the window of (up to `max_rows`) rows that subsequent
    /// `apply_updates` / `apply_deletes` / `select_deltas` /
    /// `collect_mutations` calls operate on. `deltas_selected` is a
    /// running counter threaded across every child of a merger so a
    /// global cap on selected deltas can be honored by the caller.
    fn prepare_batch(&mut self, max_rows: usize, deltas_selected: &mut usize) -> Result<usize>;

    fn has_next(&self) -> bool;

    /// Whether this iterator *might* hold deltas relevant to the current
    /// position — a cheap, possibly-overestimating check (spec §4.4:
    /// disjunction over children).
    fn may_have_deltas(&self) -> bool;

    /// Applies every visible update for `column_id` within the prepared
    /// batch into `dst`, in insertion (REDO-timestamp ascending) order,
    /// so the last-applied write wins per row.
    fn apply_updates(&mut self, column_id: ColumnId, dst: &mut ColumnBlock<'_>) -> Result<()>;

    /// Clears the selection bit for every row the prepared batch deletes
    /// under the current snapshot.
    fn apply_deletes(&mut self, selection: &mut SelectionVector) -> Result<()>;

    /// Collects every visible delta in the prepared batch touching any
    /// of `column_ids` (all columns if empty) into `out`, incrementing
    /// `deltas_selected` per delta collected.
    fn select_deltas(
        &mut self,
        column_ids: &[ColumnId],
        deltas_selected: &mut usize,
        out: &mut Vec<Delta>,
    ) -> Result<()>;

    /// Collects every visible delta in the prepared batch, grouped by
    /// row ordinal, for diagnostic/compaction consumers.
    fn collect_mutations(&mut self, out: &mut Vec<(RowId, Vec<Delta>)>) -> Result<()>;
}

/// The on-disk delta file writer's contract (spec §6): accepts deltas in
/// key order and must tolerate the exact order a DMS flush emits.
/// Internals (actual file format) are out of scope.
pub trait DeltaFileWriter {
    fn write_delta(&mut self, delta: &Delta) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

/// An in-memory stand-in for the out-of-scope on-disk writer, used by
/// tests to exercise `FlushToFile` and the "flush then re-read yields
/// the same multiset" round-trip law (spec §8).
#[derive(Debug, Default)]
pub struct InMemoryDeltaFileWriter {
    pub deltas: Vec<Delta>,
    pub finished: bool,
}

impl DeltaFileWriter for InMemoryDeltaFileWriter {
    fn write_delta(&mut self, delta: &Delta) -> Result<()> {
        self.deltas.push(delta.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
