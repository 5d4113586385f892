// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

#![cfg_attr(not(debug_assertions), deny(warnings))]

//! Wire representation of a row mutation (C1), plus the external
//! interfaces (C7) that the delta store and iterator merger depend on but
//! do not themselves implement.

pub mod cache;
pub mod change_list;
pub mod column;
pub mod delta;
pub mod encoding;
pub mod iterator;
pub mod key;

pub use cache::EvictionCallback;
pub use change_list::RowChangeList;
pub use column::{ColumnBlock, ColumnId, SelectionVector};
pub use delta::Delta;
pub use iterator::{IoContext, MvccSnapshot, ProjectionSchema, RowIteratorOptions};
pub use key::{DeltaKey, OpId, RowId, SortKind, Timestamp};

pub use kudu_core::{Error, ErrorKind, Result};
