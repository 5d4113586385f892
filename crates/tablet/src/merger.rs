// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

//! The delta iterator merger (C4): unifies iteration across the delta
//! memstore's own iterator and zero or more frozen delta-file iterators
//! into a single virtual [`DeltaIterator`] over the same row range
//! (spec §4.4).

use std::collections::BTreeMap;

use kudu_core::Result;
use kudu_delta::{ColumnBlock, ColumnId, Delta, RowId, RowIteratorOptions, SelectionVector};

use crate::delta_iterator::DeltaIterator;

/// Combines `children` into one [`DeltaIterator`]. If there is exactly
/// one child, the merger is bypassed entirely and that child is
/// returned directly (spec §4.4: "If `Create(stores, opts)` yields
/// exactly one child, the merger is bypassed and that child is
/// returned directly").
///
/// Callers are expected to order `children` so that REDO timestamps
/// ascend within the same row across children (e.g. the DMS iterator
/// first, then frozen delta-file iterators oldest to newest) — the
/// merger itself does not reorder children, only what each child
/// produces within a batch.
pub fn create(children: Vec<Box<dyn DeltaIterator>>) -> Box<dyn DeltaIterator> {
    let mut children = children;
    if children.len() == 1 {
        return children.pop().expect("len checked above");
    }
    Box::new(DeltaIteratorMerger { children })
}

/// See [`create`]. Broadcasts `Init`/`SeekToOrdinal`/`PrepareBatch` to
/// every child, short-circuiting on the first failure.
pub struct DeltaIteratorMerger {
    children: Vec<Box<dyn DeltaIterator>>,
}

impl DeltaIterator for DeltaIteratorMerger {
    fn init(&mut self, opts: &RowIteratorOptions<'_>) -> Result<()> {
        for child in &mut self.children {
            child.init(opts)?;
        }
        Ok(())
    }

    fn seek_to_ordinal(&mut self, ordinal: RowId) -> Result<()> {
        for child in &mut self.children {
            child.seek_to_ordinal(ordinal)?;
        }
        Ok(())
    }

    /// Threads the running `deltas_selected` counter through every
    /// child so a global cap on selected deltas is honored across the
    /// whole merged iterator, not just per child (spec §4.4).
    fn prepare_batch(&mut self, max_rows: usize, deltas_selected: &mut usize) -> Result<usize> {
        let mut rows_prepared = max_rows;
        for child in &mut self.children {
            let got = child.prepare_batch(max_rows, deltas_selected)?;
            rows_prepared = rows_prepared.min(got);
        }
        Ok(rows_prepared)
    }

    fn has_next(&self) -> bool {
        self.children.iter().any(|c| c.has_next())
    }

    fn may_have_deltas(&self) -> bool {
        self.children.iter().any(|c| c.may_have_deltas())
    }

    /// Invokes every child's `apply_updates` in insertion (child) order;
    /// child ordering guarantees REDO-timestamp ascending within the
    /// same row, so the last child to write a cell wins, matching "last
    /// write wins" semantics.
    fn apply_updates(&mut self, column_id: ColumnId, dst: &mut ColumnBlock<'_>) -> Result<()> {
        for child in &mut self.children {
            child.apply_updates(column_id, dst)?;
        }
        Ok(())
    }

    fn apply_deletes(&mut self, selection: &mut SelectionVector) -> Result<()> {
        for child in &mut self.children {
            child.apply_deletes(selection)?;
        }
        Ok(())
    }

    /// Accumulates entries across children into one output vector, then
    /// stable-sorts by `DeltaKey` (REDO ordering) — stable so two
    /// updates sharing a key preserve their intra-batch order (spec
    /// §4.4).
    fn select_deltas(
        &mut self,
        column_ids: &[ColumnId],
        deltas_selected: &mut usize,
        out: &mut Vec<Delta>,
    ) -> Result<()> {
        let mut collected = Vec::new();
        for child in &mut self.children {
            child.select_deltas(column_ids, deltas_selected, &mut collected)?;
        }
        collected.sort_by(|a, b| a.key.cmp(&b.key));
        out.extend(collected);
        Ok(())
    }

    /// Open question (spec §9) resolved: re-sorts on collect. Deltas
    /// from every child are grouped by row ordinal and, within each
    /// row, stable-sorted by `DeltaKey` — the same discipline
    /// `select_deltas` already applies, so the two merge paths cannot
    /// silently disagree on ordering when timestamps arrive out of
    /// order across children.
    fn collect_mutations(&mut self, out: &mut Vec<(RowId, Vec<Delta>)>) -> Result<()> {
        let mut per_child = Vec::new();
        for child in &mut self.children {
            child.collect_mutations(&mut per_child)?;
        }

        let mut by_row: BTreeMap<RowId, Vec<Delta>> = BTreeMap::new();
        for (row, deltas) in per_child {
            by_row.entry(row).or_default().extend(deltas);
        }
        for deltas in by_row.values_mut() {
            deltas.sort_by(|a, b| a.key.cmp(&b.key));
        }
        out.extend(by_row);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use kudu_anchor::LogAnchorRegistry;
    use kudu_delta::change_list::RowChangeListBuilder;
    use kudu_delta::{IoContext, MvccSnapshot, OpId, ProjectionSchema, RowChangeList, Timestamp};

    use super::*;
    use crate::memstore::DeltaMemStore;

    fn opts<'a>(
        snapshot: MvccSnapshot,
        projection: &'a ProjectionSchema,
        io: &'a IoContext,
    ) -> RowIteratorOptions<'a> {
        RowIteratorOptions::new(snapshot, projection, io)
    }

    /// A fixed set of deltas standing in for a frozen delta-file
    /// iterator (on-disk format out of scope, spec §1); behaves like a
    /// `DmsIterator` with a pre-baked batch so tests can exercise the
    /// merger without a real file.
    struct FixedDeltaIterator {
        deltas: Vec<Delta>,
        initted: bool,
    }

    impl FixedDeltaIterator {
        fn new(deltas: Vec<Delta>) -> Self {
            Self { deltas, initted: false }
        }
    }

    impl DeltaIterator for FixedDeltaIterator {
        fn init(&mut self, _opts: &RowIteratorOptions<'_>) -> Result<()> {
            self.initted = true;
            Ok(())
        }

        fn seek_to_ordinal(&mut self, _ordinal: RowId) -> Result<()> {
            Ok(())
        }

        fn prepare_batch(&mut self, max_rows: usize, deltas_selected: &mut usize) -> Result<usize> {
            *deltas_selected += self.deltas.len();
            Ok(max_rows)
        }

        fn has_next(&self) -> bool {
            true
        }

        fn may_have_deltas(&self) -> bool {
            !self.deltas.is_empty()
        }

        fn apply_updates(&mut self, column_id: ColumnId, dst: &mut ColumnBlock<'_>) -> Result<()> {
            for delta in &self.deltas {
                for change in delta.change_list.column_changes() {
                    let change = change?;
                    if change.column_id == column_id {
                        dst.write_cell(delta.key.row_ordinal.0 as usize, change.value);
                    }
                }
            }
            Ok(())
        }

        fn apply_deletes(&mut self, _selection: &mut SelectionVector) -> Result<()> {
            Ok(())
        }

        fn select_deltas(
            &mut self,
            _column_ids: &[ColumnId],
            deltas_selected: &mut usize,
            out: &mut Vec<Delta>,
        ) -> Result<()> {
            out.extend(self.deltas.iter().cloned());
            *deltas_selected += self.deltas.len();
            Ok(())
        }

        fn collect_mutations(&mut self, out: &mut Vec<(RowId, Vec<Delta>)>) -> Result<()> {
            for delta in &self.deltas {
                out.push((delta.key.row_ordinal, vec![delta.clone()]));
            }
            Ok(())
        }
    }

    #[test]
    fn single_child_bypasses_the_merger() {
        let child: Box<dyn DeltaIterator> = Box::new(FixedDeltaIterator::new(Vec::new()));
        let merged = create(vec![child]);
        // A real merger would report `may_have_deltas` as a disjunction;
        // here there is exactly one (empty) child, so both answers
        // happen to coincide, but we can check we got the child itself
        // by observing there is no extra indirection cost in debug form.
        assert!(!merged.may_have_deltas());
    }

    #[test]
    fn apply_updates_applies_children_in_order_so_last_child_wins() {
        let registry = LogAnchorRegistry::new();
        let dms = DeltaMemStore::create(&registry, "t", 4096);
        let old_change = RowChangeListBuilder::new().add_column_change(ColumnId(0), b"old").build();
        dms.update(Timestamp(1), RowId(0), old_change, OpId::new(1, 1)).unwrap();

        let projection = ProjectionSchema::default();
        let io = IoContext::default();
        let o = opts(MvccSnapshot::all_committed(), &projection, &io);

        let dms_iter = dms.new_delta_iterator(&o).unwrap();
        let new_change = RowChangeListBuilder::new().add_column_change(ColumnId(0), b"new!").build();
        let frozen = FixedDeltaIterator::new(vec![Delta::new(
            kudu_delta::DeltaKey::new(RowId(0), Timestamp(2)),
            new_change,
        )]);

        let mut merged = create(vec![Box::new(dms_iter), Box::new(frozen)]);
        merged.init(&o).unwrap();
        merged.seek_to_ordinal(RowId(0)).unwrap();
        let mut deltas_selected = 0;
        merged.prepare_batch(1, &mut deltas_selected).unwrap();

        let mut data = vec![0u8; 4];
        let mut block = ColumnBlock::new(&mut data, 4);
        merged.apply_updates(ColumnId(0), &mut block).unwrap();
        assert_eq!(block.cell(0), b"new!");
    }

    #[test]
    fn select_deltas_stable_sorts_across_children_by_key() {
        let change = || RowChangeList::new_update(&[1]);
        let frozen_a = FixedDeltaIterator::new(vec![Delta::new(
            kudu_delta::DeltaKey::new(RowId(5), Timestamp(100)),
            change(),
        )]);
        let frozen_b = FixedDeltaIterator::new(vec![Delta::new(
            kudu_delta::DeltaKey::new(RowId(1), Timestamp(10)),
            change(),
        )]);

        let projection = ProjectionSchema::default();
        let io = IoContext::default();
        let o = opts(MvccSnapshot::all_committed(), &projection, &io);

        let mut merged = create(vec![Box::new(frozen_a), Box::new(frozen_b)]);
        merged.init(&o).unwrap();
        merged.seek_to_ordinal(RowId(0)).unwrap();
        let mut deltas_selected = 0;
        merged.prepare_batch(10, &mut deltas_selected).unwrap();

        let mut out = Vec::new();
        merged.select_deltas(&[], &mut deltas_selected, &mut out).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].key.row_ordinal, RowId(1), "lower row ordinal sorts first");
        assert_eq!(out[1].key.row_ordinal, RowId(5));
    }

    #[test]
    fn collect_mutations_merges_and_sorts_rows_across_children() {
        let change = || RowChangeList::new_update(&[1]);
        let frozen_a = FixedDeltaIterator::new(vec![Delta::new(
            kudu_delta::DeltaKey::with_disambiguator(RowId(2), Timestamp(50), 0),
            change(),
        )]);
        let frozen_b = FixedDeltaIterator::new(vec![Delta::new(
            kudu_delta::DeltaKey::with_disambiguator(RowId(2), Timestamp(10), 0),
            change(),
        )]);

        let projection = ProjectionSchema::default();
        let io = IoContext::default();
        let o = opts(MvccSnapshot::all_committed(), &projection, &io);

        let mut merged = create(vec![Box::new(frozen_a), Box::new(frozen_b)]);
        merged.init(&o).unwrap();
        merged.seek_to_ordinal(RowId(0)).unwrap();
        let mut deltas_selected = 0;
        merged.prepare_batch(10, &mut deltas_selected).unwrap();

        let mut out = Vec::new();
        merged.collect_mutations(&mut out).unwrap();
        assert_eq!(out.len(), 1);
        let (row, deltas) = &out[0];
        assert_eq!(*row, RowId(2));
        assert_eq!(deltas.len(), 2);
        assert!(deltas[0].key.timestamp < deltas[1].key.timestamp, "re-sorted into timestamp order");
    }
}
