// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

//! `PeerProxy` / `PeerProxyFactory` (C7, consensus side): the RPC stub
//! seam a real transport crate (out of scope, spec §1) would implement.
//! Modeled with `#[async_trait]`, the teacher's own idiom for
//! trait-object-safe async interfaces.

use std::sync::Arc;

use async_trait::async_trait;
use kudu_core::Result;

use crate::wire::{Peer, VoteRequest, VoteResponse};

/// A per-peer RPC stub. Real implementations wrap a transport client;
/// this core only depends on the one call an election round makes.
#[async_trait]
pub trait PeerProxy: Send + Sync {
    async fn request_vote(&self, request: VoteRequest) -> Result<VoteResponse>;
}

/// Builds per-peer [`PeerProxy`] stubs. `new_proxy` may fail for reasons
/// unrelated to the election round itself (DNS failure, stale peer
/// metadata); a failure here is recorded as a `DENIED` vote for that
/// peer rather than aborting the whole round (spec §4.6 step 1).
#[async_trait]
pub trait PeerProxyFactory: Send + Sync {
    async fn new_proxy(&self, peer: &Peer) -> Result<Arc<dyn PeerProxy>>;
}
