// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

#![cfg_attr(not(debug_assertions), deny(warnings))]

//! Delta memstore (C3) and delta iterator merger (C4): the tablet's
//! mutation & read core (spec §4.3, §4.4).

pub mod arena;
pub mod delta_iterator;
pub mod iterator;
pub mod memstore;
pub mod merger;

pub use delta_iterator::{DeltaFileWriter, DeltaIterator, InMemoryDeltaFileWriter, IteratorState};
pub use iterator::DmsIterator;
pub use memstore::DeltaMemStore;
pub use merger::{DeltaIteratorMerger, create as create_merged_iterator};

pub use kudu_core::{Error, ErrorKind, Result};
