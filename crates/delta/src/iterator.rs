// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

use crate::key::Timestamp;

/// The set of committed timestamps visible to a reader; defines which
/// deltas a scan applies (spec GLOSSARY: MVCC snapshot).
///
/// This core does not implement cross-tablet transaction visibility
/// (non-goal, spec §1) so a snapshot is modeled as the single inclusive
/// upper bound a real MVCC manager would compute once transactions are
/// in scope: every timestamp `<= all_committed_before` is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MvccSnapshot {
    pub all_committed_before: Timestamp,
}

impl MvccSnapshot {
    /// A snapshot that sees everything ever inserted.
    pub fn all_committed() -> Self {
        Self { all_committed_before: Timestamp(u64::MAX) }
    }

    /// A snapshot that sees nothing at or after `ts`.
    pub fn before(ts: Timestamp) -> Self {
        Self { all_committed_before: Timestamp(ts.0.saturating_sub(1)) }
    }

    pub fn is_visible(&self, ts: Timestamp) -> bool {
        ts <= self.all_committed_before
    }

    /// `true` if no timestamp `>= lowest` can possibly be visible under
    /// this snapshot — the condition `DMS::NewDeltaIterator` uses to
    /// short-circuit a store that the snapshot demonstrably excludes
    /// entirely (spec §4.3).
    pub fn excludes_everything_from(&self, lowest: Timestamp) -> bool {
        lowest > self.all_committed_before
    }
}

/// Placeholder for the projection a scan applies deltas against.
///
/// Schema resolution is out of scope for this core (non-goal: schema
/// evolution); callers only need enough here to know which column ids
/// are being materialized in the current row block.
#[derive(Debug, Clone, Default)]
pub struct ProjectionSchema {
    pub column_ids: Vec<crate::column::ColumnId>,
}

impl ProjectionSchema {
    pub fn new(column_ids: Vec<crate::column::ColumnId>) -> Self {
        Self { column_ids }
    }
}

/// Opaque I/O accounting/cancellation context threaded through read-path
/// calls. The real implementation (out of scope: block cache, I/O
/// metrics) is an external collaborator; this core only needs a handle
/// to pass along.
#[derive(Debug, Clone, Copy, Default)]
pub struct IoContext {
    pub is_hole_punch_pending: bool,
}

/// A snapshot, a projection schema, and an I/O context, bundled the way
/// every delta-iterator constructor wants them (spec §4.7).
///
/// Lifetime `'a` ties the options to the projection/context they borrow;
/// the caller guarantees those outlive any iterator built from these
/// options.
#[derive(Debug, Clone, Copy)]
pub struct RowIteratorOptions<'a> {
    pub snapshot: MvccSnapshot,
    pub projection: &'a ProjectionSchema,
    pub io_context: &'a IoContext,
}

impl<'a> RowIteratorOptions<'a> {
    pub fn new(snapshot: MvccSnapshot, projection: &'a ProjectionSchema, io_context: &'a IoContext) -> Self {
        Self { snapshot, projection, io_context }
    }
}
