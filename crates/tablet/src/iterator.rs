// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

//! The delta memstore's own [`DeltaIterator`] implementation (part of
//! C3): walks the DMS's ordered map in one row-ordinal window at a time.

use std::sync::Arc;

use kudu_core::{Error, Result};
use kudu_delta::encoding::{decode_delta_key, encode_delta_key};
use kudu_delta::{ColumnBlock, ColumnId, Delta, DeltaKey, MvccSnapshot, RowChangeList, RowId, RowIteratorOptions, SelectionVector};

use crate::delta_iterator::{DeltaIterator, IteratorState};
use crate::memstore::DeltaMemStoreCore;

/// Reads a [`crate::memstore::DeltaMemStore`]'s contents one row-ordinal
/// window at a time, honoring an [`MvccSnapshot`].
pub struct DmsIterator {
    core: Arc<DeltaMemStoreCore>,
    state: IteratorState,
    snapshot: MvccSnapshot,
    next_ordinal: u64,
    batch_start: u64,
    batch_len: usize,
    batch: Vec<(DeltaKey, RowChangeList)>,
}

impl DmsIterator {
    pub(crate) fn new(core: Arc<DeltaMemStoreCore>) -> Self {
        Self {
            core,
            state: IteratorState::Constructed,
            snapshot: MvccSnapshot::all_committed(),
            next_ordinal: 0,
            batch_start: 0,
            batch_len: 0,
            batch: Vec::new(),
        }
    }

    fn require_state(&self, expected: &[IteratorState], action: &str) -> Result<()> {
        if expected.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::illegal_state(format!(
                "cannot {action} while in state {:?}",
                self.state
            )))
        }
    }

    fn row_in_batch(&self, row_ordinal: RowId) -> Option<usize> {
        let ordinal = row_ordinal.0 as u64;
        if ordinal < self.batch_start || ordinal >= self.batch_start + self.batch_len as u64 {
            return None;
        }
        Some((ordinal - self.batch_start) as usize)
    }
}

impl DeltaIterator for DmsIterator {
    fn init(&mut self, opts: &RowIteratorOptions<'_>) -> Result<()> {
        self.require_state(&[IteratorState::Constructed], "Init")?;
        self.snapshot = opts.snapshot;
        self.state = IteratorState::Initted;
        Ok(())
    }

    fn seek_to_ordinal(&mut self, ordinal: RowId) -> Result<()> {
        self.require_state(
            &[IteratorState::Initted, IteratorState::Seeked, IteratorState::Prepared],
            "SeekToOrdinal",
        )?;
        self.next_ordinal = ordinal.0 as u64;
        self.batch_start = self.next_ordinal;
        self.batch_len = 0;
        self.batch.clear();
        self.state = IteratorState::Seeked;
        Ok(())
    }

    fn prepare_batch(&mut self, max_rows: usize, deltas_selected: &mut usize) -> Result<usize> {
        self.require_state(&[IteratorState::Seeked, IteratorState::Prepared], "PrepareBatch")?;
        self.state = IteratorState::Preparing;

        self.batch_start = self.next_ordinal;
        self.batch.clear();
        let window_end = self.batch_start.saturating_add(max_rows as u64);

        let lower = encode_delta_key(&DeltaKey::new(RowId(self.batch_start as u32), kudu_delta::Timestamp::MIN));
        for entry in self.core.map.range(lower..) {
            let key = decode_delta_key(entry.key())?;
            if key.row_ordinal.0 as u64 >= window_end {
                break;
            }
            if !self.snapshot.is_visible(key.timestamp) {
                continue;
            }
            let change_list = RowChangeList::from_encoded(Arc::clone(entry.value()))?;
            *deltas_selected += 1;
            self.batch.push((key, change_list));
        }

        self.batch_len = max_rows;
        self.next_ordinal = window_end;
        self.state = IteratorState::Prepared;
        Ok(max_rows)
    }

    fn has_next(&self) -> bool {
        matches!(self.state, IteratorState::Seeked | IteratorState::Prepared)
    }

    fn may_have_deltas(&self) -> bool {
        !self.batch.is_empty()
    }

    fn apply_updates(&mut self, column_id: ColumnId, dst: &mut ColumnBlock<'_>) -> Result<()> {
        self.require_state(&[IteratorState::Prepared], "ApplyUpdates")?;
        for (key, change_list) in &self.batch {
            if change_list.is_delete() {
                continue;
            }
            let Some(row_index) = self.row_in_batch(key.row_ordinal) else {
                continue;
            };
            for change in change_list.column_changes() {
                let change = change?;
                if change.column_id == column_id {
                    dst.write_cell(row_index, change.value);
                }
            }
        }
        Ok(())
    }

    fn apply_deletes(&mut self, selection: &mut SelectionVector) -> Result<()> {
        self.require_state(&[IteratorState::Prepared], "ApplyDeletes")?;
        for (key, change_list) in &self.batch {
            if !change_list.is_delete() {
                continue;
            }
            if let Some(row_index) = self.row_in_batch(key.row_ordinal) {
                if row_index < selection.len() {
                    selection.set_not_selected(row_index);
                }
            }
        }
        Ok(())
    }

    fn select_deltas(
        &mut self,
        column_ids: &[ColumnId],
        deltas_selected: &mut usize,
        out: &mut Vec<Delta>,
    ) -> Result<()> {
        self.require_state(&[IteratorState::Prepared], "SelectDeltas")?;
        for (key, change_list) in &self.batch {
            let matches = column_ids.is_empty()
                || change_list.is_delete()
                || change_list
                    .column_changes()
                    .collect::<Result<Vec<_>>>()?
                    .iter()
                    .any(|c| column_ids.contains(&c.column_id));
            if matches {
                out.push(Delta::new(*key, change_list.clone()));
                *deltas_selected += 1;
            }
        }
        Ok(())
    }

    fn collect_mutations(&mut self, out: &mut Vec<(RowId, Vec<Delta>)>) -> Result<()> {
        self.require_state(&[IteratorState::Prepared], "CollectMutations")?;
        for (key, change_list) in &self.batch {
            match out.last_mut() {
                Some((row, deltas)) if *row == key.row_ordinal => {
                    deltas.push(Delta::new(*key, change_list.clone()));
                }
                _ => {
                    out.push((key.row_ordinal, vec![Delta::new(*key, change_list.clone())]));
                }
            }
        }
        Ok(())
    }
}
