// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

//! The thread-safe arena a [`crate::memstore::DeltaMemStore`] copies
//! every inserted change list into (spec §4.1, §5).
//!
//! `bumpalo::Bump` is the teacher's own bump-allocation crate, chosen
//! here for the same reason: cheap, fast allocation for short-lived
//! buffers. `Bump` itself is `!Sync`, so concurrent writers stage their
//! copy under a short-held `parking_lot::Mutex` — this core does not use
//! `unsafe` to hand out arena-backed references across that lock
//! boundary (the workspace denies `unsafe_code`), so the staged bytes
//! are copied once more into a reference-counted, immutably-shared
//! `Arc<[u8]>` that readers can hold onto for as long as they like
//! without needing the arena itself to stay locked or even alive.
//! `EstimateSize` still reports real arena bytes allocated, since that
//! is what `bumpalo::Bump::allocated_bytes` tracks regardless of what
//! happens to the bytes afterward.

use std::sync::Arc;

use bumpalo::Bump;
use parking_lot::Mutex;

pub struct Arena {
    bump: Mutex<Bump>,
}

impl Arena {
    pub fn new(chunk_bytes: usize) -> Self {
        Self { bump: Mutex::new(Bump::with_capacity(chunk_bytes)) }
    }

    /// Copies `bytes` into the arena and returns a cheaply-clonable,
    /// immutable handle to the copy.
    pub fn alloc_copy(&self, bytes: &[u8]) -> Arc<[u8]> {
        let mut bump = self.bump.lock();
        let staged = bump.alloc_slice_copy(bytes);
        Arc::from(&*staged)
    }

    /// Total bytes the arena has allocated so far (monotonically
    /// non-decreasing; the arena never shrinks mid-lifetime).
    pub fn allocated_bytes(&self) -> usize {
        self.bump.lock().allocated_bytes()
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena").field("allocated_bytes", &self.allocated_bytes()).finish()
    }
}
