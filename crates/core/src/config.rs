// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

//! Explicit configuration, threaded through constructors instead of living
//! behind process-wide flags (spec §9: "global gflag state becomes an
//! explicit configuration struct").

use std::time::Duration;

/// Tunables for a single tablet's write/read core.
///
/// Every field has the default the spec's prose implies; callers override
/// only what they need to for tests (e.g. a short vote timeout to keep
/// election tests fast).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabletCoreConfig {
    /// Per-peer vote RPC timeout, carried on every `RequestVote` call.
    pub vote_rpc_timeout: Duration,
    /// Default `PrepareBatch` window size used when a caller does not
    /// specify one explicitly.
    pub default_prepare_batch_size: usize,
    /// Size in bytes of each chunk the DMS arena grows by.
    pub arena_chunk_bytes: usize,
}

impl Default for TabletCoreConfig {
    fn default() -> Self {
        Self {
            vote_rpc_timeout: Duration::from_millis(1500),
            default_prepare_batch_size: 1024,
            arena_chunk_bytes: 256 * 1024,
        }
    }
}

impl TabletCoreConfig {
    pub fn with_vote_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.vote_rpc_timeout = timeout;
        self
    }

    pub fn with_default_prepare_batch_size(mut self, size: usize) -> Self {
        self.default_prepare_batch_size = size;
        self
    }

    pub fn with_arena_chunk_bytes(mut self, bytes: usize) -> Self {
        self.arena_chunk_bytes = bytes;
        self
    }
}
