// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

use std::sync::Arc;

use kudu_core::{Error, Result};

use crate::column::ColumnId;

const TAG_UPDATE: u8 = 0;
const TAG_DELETE: u8 = 1;

/// One column's new raw value within an update change list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnChange<'a> {
    pub column_id: ColumnId,
    pub value: &'a [u8],
}

/// Builds an update change list's payload from a sequence of per-column
/// changes: `[column_id: u32 BE][value_len: u32 BE][value bytes]`,
/// repeated. This is the one piece of structure this core imposes on an
/// otherwise opaque payload, needed so `ApplyUpdates` (spec §4.4) has
/// something concrete to decode; everything else about column encoding
/// (types, defaults, schema) is the out-of-scope collaborator's
/// business.
#[derive(Debug, Default)]
pub struct RowChangeListBuilder {
    payload: Vec<u8>,
}

impl RowChangeListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_column_change(mut self, column_id: ColumnId, value: &[u8]) -> Self {
        self.payload.extend_from_slice(&column_id.0.to_be_bytes());
        self.payload.extend_from_slice(&(value.len() as u32).to_be_bytes());
        self.payload.extend_from_slice(value);
        self
    }

    pub fn build(self) -> RowChangeList {
        RowChangeList::new_update(&self.payload)
    }
}

/// An opaque, length-prefixed byte blob encoding a set of column updates
/// or a delete marker.
///
/// Treated as immutable after insertion (spec §4.1): the only bit this
/// type interprets is the leading tag byte that distinguishes an update
/// from a delete, since `DeltaMemStore::Update` needs that much to
/// maintain `deleted_row_count` (spec §4.3). Everything after the tag is
/// opaque column-update payload a higher layer (out of scope here)
/// produces and interprets.
///
/// Backed by `Arc<[u8]>` rather than a raw arena pointer: once a change
/// list is copied into a `DeltaMemStore`'s arena, any number of
/// concurrent readers hold a cheap, reference-counted clone of the same
/// immutable bytes — this is the safe-Rust rendition of "producers copy
/// it into the DMS's arena so that downstream readers see a stable
/// slice" (see `kudu_tablet::arena` for the allocation side).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowChangeList(Arc<[u8]>);

impl RowChangeList {
    /// Builds an update change list from an already-encoded column-update
    /// payload (opaque to this type).
    pub fn new_update(payload: &[u8]) -> Self {
        let mut buf = Vec::with_capacity(payload.len() + 1);
        buf.push(TAG_UPDATE);
        buf.extend_from_slice(payload);
        Self(buf.into())
    }

    /// Builds a delete-marker change list.
    pub fn new_delete() -> Self {
        Self(Arc::from([TAG_DELETE]))
    }

    /// Reconstructs a change list from its full encoded bytes (tag
    /// included), e.g. when reading one back from a delta file.
    pub fn from_encoded(bytes: Arc<[u8]>) -> Result<Self> {
        match bytes.first() {
            Some(&TAG_UPDATE) | Some(&TAG_DELETE) => Ok(Self(bytes)),
            Some(other) => {
                Err(Error::corruption(format!("unrecognized row change list tag {other}")))
            }
            None => Err(Error::corruption("empty row change list")),
        }
    }

    /// `true` if this change list encodes a delete marker rather than
    /// column updates.
    pub fn is_delete(&self) -> bool {
        self.0[0] == TAG_DELETE
    }

    /// The full encoded form (tag included), as written verbatim to a
    /// delta file.
    pub fn as_encoded_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The opaque column-update payload, tag stripped. Empty for a
    /// delete marker.
    pub fn payload(&self) -> &[u8] {
        &self.0[1..]
    }

    pub fn encoded_len(&self) -> usize {
        self.0.len()
    }

    /// Iterates the per-column changes encoded in this list's payload.
    ///
    /// Empty (and an error, surfaced lazily via [`ColumnChanges::next`])
    /// for a delete marker — deletes carry no column payload.
    pub fn column_changes(&self) -> ColumnChanges<'_> {
        ColumnChanges { remaining: self.payload() }
    }
}

/// Iterator over a [`RowChangeList`]'s decoded [`ColumnChange`]s.
pub struct ColumnChanges<'a> {
    remaining: &'a [u8],
}

impl<'a> Iterator for ColumnChanges<'a> {
    type Item = Result<ColumnChange<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }
        if self.remaining.len() < 8 {
            self.remaining = &[];
            return Some(Err(Error::corruption("truncated column change header")));
        }
        let column_id = u32::from_be_bytes(self.remaining[0..4].try_into().unwrap());
        let value_len = u32::from_be_bytes(self.remaining[4..8].try_into().unwrap()) as usize;
        let rest = &self.remaining[8..];
        if rest.len() < value_len {
            self.remaining = &[];
            return Some(Err(Error::corruption("truncated column change value")));
        }
        let (value, after) = rest.split_at(value_len);
        self.remaining = after;
        Some(Ok(ColumnChange { column_id: ColumnId(column_id), value }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_round_trips_through_encoded_form() {
        let change = RowChangeList::new_update(&[1, 2, 3]);
        assert!(!change.is_delete());
        assert_eq!(change.payload(), &[1, 2, 3]);

        let reconstructed = RowChangeList::from_encoded(Arc::from(change.as_encoded_bytes())).unwrap();
        assert_eq!(reconstructed, change);
    }

    #[test]
    fn delete_marker_has_no_payload() {
        let change = RowChangeList::new_delete();
        assert!(change.is_delete());
        assert!(change.payload().is_empty());
    }

    #[test]
    fn rejects_empty_and_unrecognized_tags() {
        assert!(RowChangeList::from_encoded(Arc::from([])).is_err());
        assert!(RowChangeList::from_encoded(Arc::from([0xffu8])).is_err());
    }

    #[test]
    fn builder_round_trips_column_changes() {
        let change = RowChangeListBuilder::new()
            .add_column_change(ColumnId(1), b"hello")
            .add_column_change(ColumnId(2), b"")
            .build();

        let changes: Vec<_> = change.column_changes().collect::<Result<_>>().unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].column_id, ColumnId(1));
        assert_eq!(changes[0].value, b"hello");
        assert_eq!(changes[1].column_id, ColumnId(2));
        assert_eq!(changes[1].value, b"");
    }

    #[test]
    fn delete_marker_has_no_column_changes() {
        let change = RowChangeList::new_delete();
        assert!(change.column_changes().next().is_none());
    }

    #[test]
    fn truncated_payload_surfaces_corruption() {
        let bogus = RowChangeList::new_update(&[0, 0, 0, 1]);
        let err = bogus.column_changes().next().unwrap().unwrap_err();
        assert_eq!(err.kind, kudu_core::ErrorKind::Corruption);
    }
}
