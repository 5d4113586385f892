// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

//! Order-preserving byte encoding for [`DeltaKey`].
//!
//! Modeled on the teacher's `keycode` serializer: fixed-width big-endian
//! fields so that byte-lexicographic order of the encoded form equals
//! [`DeltaKey`]'s own `Ord` order. Unlike the teacher's general-purpose
//! `serde`-driven codec (which has to handle signed integers, strings and
//! floats), every field here is an unsigned fixed-width integer, so plain
//! big-endian encoding is already order-preserving with no sign-bit
//! flipping required.

use kudu_core::{Error, Result};

use crate::key::{DeltaKey, RowId, SortKind, Timestamp};

/// Encoded width of a [`DeltaKey`]: `u32` row ordinal + `u64` timestamp +
/// `u32` disambiguator.
pub const ENCODED_LEN: usize = 4 + 8 + 4;

/// Encodes `key` into its order-preserving byte representation.
///
/// `sort_kind` is not part of the encoding: it is a property of the
/// container the key lives in (this core only ever builds REDO
/// containers), not of the individual key bytes.
pub fn encode_delta_key(key: &DeltaKey) -> [u8; ENCODED_LEN] {
    let mut buf = [0u8; ENCODED_LEN];
    buf[0..4].copy_from_slice(&key.row_ordinal.0.to_be_bytes());
    buf[4..12].copy_from_slice(&key.timestamp.0.to_be_bytes());
    buf[12..16].copy_from_slice(&key.disambiguator.to_be_bytes());
    buf
}

/// Decodes a [`DeltaKey`] previously produced by [`encode_delta_key`].
///
/// The decoded key is always tagged [`SortKind::Redo`] since that is the
/// only direction this core emits.
pub fn decode_delta_key(bytes: &[u8]) -> Result<DeltaKey> {
    if bytes.len() != ENCODED_LEN {
        return Err(Error::corruption(format!(
            "delta key must be {ENCODED_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    let row_ordinal = u32::from_be_bytes(bytes[0..4].try_into().unwrap());
    let timestamp = u64::from_be_bytes(bytes[4..12].try_into().unwrap());
    let disambiguator = u32::from_be_bytes(bytes[12..16].try_into().unwrap());
    Ok(DeltaKey {
        row_ordinal: RowId(row_ordinal),
        timestamp: Timestamp(timestamp),
        disambiguator,
        sort_kind: SortKind::Redo,
    })
}
