// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A zero-based row index within a rowset, stable for the rowset's
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub u32);

impl RowId {
    pub fn new(ordinal: u32) -> Self {
        Self(ordinal)
    }
}

impl From<u32> for RowId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// A monotonic 64-bit hybrid logical clock value. Totally ordered;
/// [`Timestamp::MIN`] is the sentinel meaning "no value" (`kMin` in
/// spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Sentinel meaning "no value". Never produced by a real clock tick.
    pub const MIN: Timestamp = Timestamp(0);

    pub fn is_min(self) -> bool {
        self == Self::MIN
    }
}

impl From<u64> for Timestamp {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies an entry in the replicated log: `index` is strictly
/// increasing within a `term`; `term` is non-decreasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpId {
    pub term: u64,
    pub index: u64,
}

impl OpId {
    pub fn new(term: u64, index: u64) -> Self {
        Self { term, index }
    }
}

impl PartialOrd for OpId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpId {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.term, self.index).cmp(&(other.term, other.index))
    }
}

/// Which temporal direction a delta moves a row: the core only
/// implements REDO (spec §1/GLOSSARY); `Undo` exists so call sites have
/// an explicit place to name the other direction rather than assuming
/// REDO silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKind {
    Redo,
    Undo,
}

/// `(row_ordinal, timestamp, disambiguator)`.
///
/// The disambiguator is a per-DMS monotonic counter used only when two
/// mutations collide on `(row_ordinal, timestamp)` — e.g. the same batch
/// mutating one row twice.
///
/// Sort order (REDO, the only direction this core implements):
/// `row_ordinal` asc, `timestamp` asc, `disambiguator` asc. The [`Ord`]
/// impl always applies the REDO order; [`DeltaKey::sort_kind`] is
/// informational for callers that need to know which direction a key
/// was produced under (it is not consulted by `Ord`, since mixing REDO
/// and UNDO keys in the same ordered container is itself a programming
/// error the type does not attempt to paper over).
///
/// `PartialEq`/`Eq`/`Hash` are hand-written over the same three ordered
/// fields `Ord` compares and deliberately exclude `sort_kind`: it is the
/// one field the encoded byte form (`encoding::encode_delta_key`) does
/// not carry, so keeping it out of equality/ordering keeps `Ord`/`Eq`
/// consistent (`cmp() == Equal` iff `==`) and keeps `decode(encode(k))
/// == k` regardless of which `sort_kind` `k` was built with.
#[derive(Debug, Clone, Copy)]
pub struct DeltaKey {
    pub row_ordinal: RowId,
    pub timestamp: Timestamp,
    pub disambiguator: u32,
    pub sort_kind: SortKind,
}

impl PartialEq for DeltaKey {
    fn eq(&self, other: &Self) -> bool {
        (self.row_ordinal, self.timestamp, self.disambiguator)
            == (other.row_ordinal, other.timestamp, other.disambiguator)
    }
}

impl Eq for DeltaKey {}

impl std::hash::Hash for DeltaKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (self.row_ordinal, self.timestamp, self.disambiguator).hash(state);
    }
}

impl DeltaKey {
    pub fn new(row_ordinal: RowId, timestamp: Timestamp) -> Self {
        Self { row_ordinal, timestamp, disambiguator: 0, sort_kind: SortKind::Redo }
    }

    pub fn with_disambiguator(row_ordinal: RowId, timestamp: Timestamp, disambiguator: u32) -> Self {
        Self { row_ordinal, timestamp, disambiguator, sort_kind: SortKind::Redo }
    }

    /// The literal `(row_ordinal, timestamp)` pair this key collides on
    /// with any other key sharing it; used to detect the case the
    /// disambiguator exists for.
    pub fn collision_key(&self) -> (RowId, Timestamp) {
        (self.row_ordinal, self.timestamp)
    }
}

impl PartialOrd for DeltaKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DeltaKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.row_ordinal, self.timestamp, self.disambiguator).cmp(&(
            other.row_ordinal,
            other.timestamp,
            other.disambiguator,
        ))
    }
}
