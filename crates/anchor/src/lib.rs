// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

#![cfg_attr(not(debug_assertions), deny(warnings))]

//! Log anchor registry (C2): pins the earliest WAL index required by any
//! in-memory structure (e.g. an unflushed delta memstore), preventing
//! premature log GC (spec §4.2).

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use kudu_core::{Error, Result};
use parking_lot::Mutex;
use tracing::{debug, error, trace};

/// An opaque handle identifying one registered anchor.
///
/// Produced by [`LogAnchorRegistry::new_anchor`]; carries no state of its
/// own beyond identity, mirroring the upstream design where the anchor
/// object is a thin token the owner holds and the registry is the only
/// place that knows what index (if any) it is currently pinned at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnchorHandle(u64);

struct Inner {
    by_index: BTreeMap<u64, BTreeSet<AnchorHandle>>,
    by_handle: HashMap<AnchorHandle, (u64, String)>,
}

impl Inner {
    fn is_empty(&self) -> bool {
        self.by_index.is_empty() && self.by_handle.is_empty()
    }
}

/// Holds a sorted multimap from `log_index` to anchor handles so the
/// minimum pinned index can be read in O(log n).
///
/// A single mutex guards the map; it is never held while invoking owner
/// callbacks, because this design has none (spec §4.2).
pub struct LogAnchorRegistry {
    next_handle: AtomicU64,
    inner: Mutex<Inner>,
}

impl Default for LogAnchorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LogAnchorRegistry {
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            inner: Mutex::new(Inner { by_index: BTreeMap::new(), by_handle: HashMap::new() }),
        }
    }

    /// Mints a fresh, unregistered anchor handle.
    pub fn new_anchor(&self) -> AnchorHandle {
        AnchorHandle(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers `anchor` at `index`. An anchor may be registered exactly
    /// once until unregistered; registering an already-registered anchor
    /// is an invalid-argument error.
    pub fn register(&self, index: u64, owner: impl Into<String>, anchor: AnchorHandle) -> Result<()> {
        let owner = owner.into();
        let mut inner = self.inner.lock();
        if inner.by_handle.contains_key(&anchor) {
            return Err(Error::invalid_argument(format!(
                "anchor {anchor:?} is already registered"
            )));
        }
        inner.by_index.entry(index).or_default().insert(anchor);
        inner.by_handle.insert(anchor, (index, owner));
        trace!(index, anchor = ?anchor, "registered log anchor");
        Ok(())
    }

    /// If `anchor` is already registered, atomically unregisters then
    /// re-registers it at `index`; otherwise registers it fresh.
    pub fn register_or_update(&self, index: u64, owner: impl Into<String>, anchor: AnchorHandle) -> Result<()> {
        let owner = owner.into();
        let mut inner = self.inner.lock();
        if let Some((old_index, _)) = inner.by_handle.remove(&anchor) {
            Self::remove_from_index(&mut inner, old_index, anchor);
        }
        inner.by_index.entry(index).or_default().insert(anchor);
        inner.by_handle.insert(anchor, (index, owner));
        trace!(index, anchor = ?anchor, "registered (or updated) log anchor");
        Ok(())
    }

    /// Removes `anchor`. Fails if it is not registered.
    pub fn unregister(&self, anchor: AnchorHandle) -> Result<()> {
        let mut inner = self.inner.lock();
        let Some((index, _)) = inner.by_handle.remove(&anchor) else {
            return Err(Error::invalid_argument(format!("anchor {anchor:?} is not registered")));
        };
        Self::remove_from_index(&mut inner, index, anchor);
        trace!(anchor = ?anchor, "unregistered log anchor");
        Ok(())
    }

    /// Idempotent unregister: a no-op, not an error, if `anchor` is not
    /// currently registered. Returns whether an anchor was actually
    /// removed.
    pub fn unregister_if_anchored(&self, anchor: AnchorHandle) -> bool {
        let mut inner = self.inner.lock();
        let Some((index, _)) = inner.by_handle.remove(&anchor) else {
            return false;
        };
        Self::remove_from_index(&mut inner, index, anchor);
        trace!(anchor = ?anchor, "unregistered (idempotent) log anchor");
        true
    }

    /// The smallest index with a registered anchor, or `NotFound` if the
    /// registry is empty.
    pub fn earliest_registered_log_index(&self) -> Result<u64> {
        let inner = self.inner.lock();
        inner
            .by_index
            .keys()
            .next()
            .copied()
            .ok_or_else(|| Error::not_found("no anchors registered"))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().by_handle.is_empty()
    }

    fn remove_from_index(inner: &mut Inner, index: u64, anchor: AnchorHandle) {
        if let Some(set) = inner.by_index.get_mut(&index) {
            set.remove(&anchor);
            if set.is_empty() {
                inner.by_index.remove(&index);
            }
        }
    }
}

impl Drop for LogAnchorRegistry {
    fn drop(&mut self) {
        let inner = self.inner.lock();
        if !inner.is_empty() {
            error!(
                remaining = inner.by_handle.len(),
                "log anchor registry dropped with anchors still registered"
            );
            debug_assert!(inner.is_empty(), "leaking anchors is a programming error");
        }
    }
}

/// Wraps a single anchor for a holder that wants "pin the lowest index
/// I have ever seen" semantics (spec §4.2).
///
/// This is the shape a delta-memstore-style holder uses: every
/// mutation observes an `OpId`, and the memstore wants its anchor to
/// track the smallest index among everything it has ever inserted,
/// without re-registering on every single write that does not actually
/// lower the minimum.
pub struct MinLogIndexAnchorer<'r> {
    registry: &'r LogAnchorRegistry,
    owner: String,
    anchor: AnchorHandle,
    current_min: Mutex<Option<u64>>,
}

impl<'r> MinLogIndexAnchorer<'r> {
    pub fn new(registry: &'r LogAnchorRegistry, owner: impl Into<String>) -> Self {
        Self {
            registry,
            owner: owner.into(),
            anchor: registry.new_anchor(),
            current_min: Mutex::new(None),
        }
    }

    /// Updates the held anchor to `index` only if `index` is lower than
    /// the current minimum (or no anchor is currently held).
    pub fn anchor_if_minimum(&self, index: u64) -> Result<()> {
        let mut current = self.current_min.lock();
        let should_update = match *current {
            None => true,
            Some(min) => index < min,
        };
        if should_update {
            self.registry.register_or_update(index, self.owner.clone(), self.anchor)?;
            *current = Some(index);
            debug!(index, owner = %self.owner, "advanced min-log-index anchor");
        }
        Ok(())
    }

    /// Idempotent: releases the anchor if held, no-op otherwise.
    pub fn release_anchor(&self) {
        let mut current = self.current_min.lock();
        if current.take().is_some() {
            self.registry.unregister_if_anchored(self.anchor);
            debug!(owner = %self.owner, "released min-log-index anchor");
        }
    }

    pub fn current_min_index(&self) -> Option<u64> {
        *self.current_min.lock()
    }
}

impl Drop for MinLogIndexAnchorer<'_> {
    fn drop(&mut self) {
        self.release_anchor();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_unregister_leaves_registry_empty() {
        let registry = LogAnchorRegistry::new();
        let anchor = registry.new_anchor();
        registry.register(10, "owner", anchor).unwrap();
        assert!(!registry.is_empty());
        registry.unregister(anchor).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn registering_twice_is_an_error() {
        let registry = LogAnchorRegistry::new();
        let anchor = registry.new_anchor();
        registry.register(10, "owner", anchor).unwrap();
        let err = registry.register(20, "owner", anchor).unwrap_err();
        assert_eq!(err.kind, kudu_core::ErrorKind::InvalidArgument);
    }

    #[test]
    fn unregistering_unknown_anchor_is_an_error() {
        let registry = LogAnchorRegistry::new();
        let anchor = registry.new_anchor();
        let err = registry.unregister(anchor).unwrap_err();
        assert_eq!(err.kind, kudu_core::ErrorKind::InvalidArgument);
    }

    #[test]
    fn unregister_if_anchored_is_idempotent() {
        let registry = LogAnchorRegistry::new();
        let anchor = registry.new_anchor();
        assert!(!registry.unregister_if_anchored(anchor));
        registry.register(5, "owner", anchor).unwrap();
        assert!(registry.unregister_if_anchored(anchor));
        assert!(!registry.unregister_if_anchored(anchor));
    }

    #[test]
    fn earliest_registered_log_index_tracks_the_minimum() {
        let registry = LogAnchorRegistry::new();
        let a = registry.new_anchor();
        let b = registry.new_anchor();
        let c = registry.new_anchor();
        registry.register(50, "a", a).unwrap();
        registry.register(30, "b", b).unwrap();
        registry.register(90, "c", c).unwrap();

        assert_eq!(registry.earliest_registered_log_index().unwrap(), 30);
        registry.unregister(b).unwrap();
        assert_eq!(registry.earliest_registered_log_index().unwrap(), 50);
    }

    #[test]
    fn empty_registry_reports_not_found() {
        let registry = LogAnchorRegistry::new();
        let err = registry.earliest_registered_log_index().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn min_log_index_anchorer_only_advances_downward() {
        let registry = LogAnchorRegistry::new();
        let anchorer = MinLogIndexAnchorer::new(&registry, "dms-1");

        anchorer.anchor_if_minimum(100).unwrap();
        assert_eq!(anchorer.current_min_index(), Some(100));
        assert_eq!(registry.earliest_registered_log_index().unwrap(), 100);

        anchorer.anchor_if_minimum(150).unwrap();
        assert_eq!(anchorer.current_min_index(), Some(100), "must not move the anchor upward");

        anchorer.anchor_if_minimum(50).unwrap();
        assert_eq!(anchorer.current_min_index(), Some(50));
        assert_eq!(registry.earliest_registered_log_index().unwrap(), 50);

        anchorer.release_anchor();
        assert!(registry.is_empty());
        anchorer.release_anchor();
    }
}
