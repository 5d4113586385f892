// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

use kudu_anchor::LogAnchorRegistry;
use kudu_delta::{IoContext, MvccSnapshot, OpId, ProjectionSchema, RowChangeList, RowId, RowIteratorOptions, Timestamp};
use kudu_tablet::delta_iterator::InMemoryDeltaFileWriter;
use kudu_tablet::memstore::DeltaMemStore;

/// Scenario 5 (spec §8): two `Update(ts=100, row=42, …)` calls in the
/// same tablet must both be retrievable, with disambiguators 0 and 1
/// respectively.
#[test]
fn scenario_dms_collision() {
    let registry = LogAnchorRegistry::new();
    let dms = DeltaMemStore::create(&registry, "tablet-1", 4096);

    dms.update(Timestamp(100), RowId(42), RowChangeList::new_update(&[1]), OpId::new(1, 1)).unwrap();
    dms.update(Timestamp(100), RowId(42), RowChangeList::new_update(&[2]), OpId::new(1, 2)).unwrap();

    assert_eq!(dms.count(), 2);

    let mut writer = InMemoryDeltaFileWriter::default();
    dms.flush_to_file(&mut writer).unwrap();

    let mut disambiguators: Vec<u32> = writer
        .deltas
        .iter()
        .filter(|d| d.key.row_ordinal == RowId(42) && d.key.timestamp == Timestamp(100))
        .map(|d| d.key.disambiguator)
        .collect();
    disambiguators.sort();
    assert_eq!(disambiguators, vec![0, 1]);
}

/// Round-trip law (spec §8): flushing a DMS and re-reading via the file
/// iterator yields the same multiset of `(DeltaKey, RowChangeList)` as
/// was inserted.
#[test]
fn flush_then_reread_preserves_multiset() {
    let registry = LogAnchorRegistry::new();
    let dms = DeltaMemStore::create(&registry, "tablet-1", 4096);

    let mut inserted = Vec::new();
    for i in 0..30u32 {
        let change = RowChangeList::new_update(&[i as u8]);
        dms.update(Timestamp(i as u64 + 1), RowId(i % 5), change.clone(), OpId::new(1, i as u64 + 1)).unwrap();
        inserted.push((RowId(i % 5), Timestamp(i as u64 + 1), change));
    }

    let mut writer = InMemoryDeltaFileWriter::default();
    dms.flush_to_file(&mut writer).unwrap();

    assert_eq!(writer.deltas.len(), inserted.len());
    let mut from_file: Vec<_> =
        writer.deltas.iter().map(|d| (d.key.row_ordinal, d.key.timestamp, d.change_list.clone())).collect();
    from_file.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
    inserted.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
    assert_eq!(from_file, inserted);

    // flush released the anchor.
    assert!(registry.is_empty());
}

/// A snapshot whose upper bound excludes every delta in the DMS makes
/// `NewDeltaIterator` report `NotFound` so the caller can skip the
/// store entirely (spec §4.3).
#[test]
fn new_delta_iterator_skips_stores_excluded_by_snapshot() {
    let registry = LogAnchorRegistry::new();
    let dms = DeltaMemStore::create(&registry, "tablet-1", 4096);
    dms.update(Timestamp(500), RowId(0), RowChangeList::new_update(&[1]), OpId::new(1, 1)).unwrap();

    let projection = ProjectionSchema::default();
    let io = IoContext::default();
    let opts = RowIteratorOptions::new(MvccSnapshot::before(Timestamp(10)), &projection, &io);

    let err = dms.new_delta_iterator(&opts).unwrap_err();
    assert!(err.is_not_found());

    // clean up so the registry drop assertion holds.
    let mut writer = InMemoryDeltaFileWriter::default();
    dms.flush_to_file(&mut writer).unwrap();
}
