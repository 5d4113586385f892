// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

use kudu_delta::encoding::encode_delta_key;
use kudu_delta::{DeltaKey, RowId, Timestamp};

/// Scenario 5 (spec §8): two `Update(ts=100, row=42, ...)` calls in the
/// same tablet must both be retrievable, with disambiguators 0 and 1
/// respectively, and sort after each other in that order.
#[test]
fn colliding_keys_are_disambiguated_and_ordered() {
    let first = DeltaKey::with_disambiguator(RowId(42), Timestamp(100), 0);
    let second = DeltaKey::with_disambiguator(RowId(42), Timestamp(100), 1);

    assert_ne!(first, second);
    assert!(first < second);
    assert!(encode_delta_key(&first) < encode_delta_key(&second));
}

#[test]
fn sorting_a_shuffled_key_set_matches_row_then_timestamp_then_disambiguator() {
    let mut keys = vec![
        DeltaKey::new(RowId(3), Timestamp(1)),
        DeltaKey::new(RowId(1), Timestamp(50)),
        DeltaKey::with_disambiguator(RowId(1), Timestamp(10), 2),
        DeltaKey::new(RowId(1), Timestamp(10)),
        DeltaKey::with_disambiguator(RowId(1), Timestamp(10), 1),
        DeltaKey::new(RowId(2), Timestamp(0)),
    ];
    keys.sort();

    let expected = vec![
        DeltaKey::new(RowId(1), Timestamp(10)),
        DeltaKey::with_disambiguator(RowId(1), Timestamp(10), 1),
        DeltaKey::with_disambiguator(RowId(1), Timestamp(10), 2),
        DeltaKey::new(RowId(1), Timestamp(50)),
        DeltaKey::new(RowId(2), Timestamp(0)),
        DeltaKey::new(RowId(3), Timestamp(1)),
    ];
    assert_eq!(keys, expected);
}
