// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

#![cfg_attr(not(debug_assertions), deny(warnings))]

//! Vote counter (C5) and leader election (C6): the single-round vote
//! protocol that gates which replica may accept writes (spec §4.5,
//! §4.6).

pub mod election;
pub mod peer;
pub mod vote_counter;
pub mod wire;

pub use election::{ElectionResult, LeaderElection, seed_self_vote};
pub use peer::{PeerProxy, PeerProxyFactory};
pub use vote_counter::{Decision, VoteCounter};
pub use wire::{Peer, PeerRole, RaftConfig, VoteRequest, VoteResponse};

pub use kudu_core::{Error, ErrorKind, Result};
