// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

//! Vote RPC wire types (spec §6). Transport (tonic/gRPC) is out of
//! scope for this core (spec §1); these are plain `serde`-derived
//! structs a transport crate would carry over the wire, matching the
//! teacher's own `serde` + `postcard` wire-format stack.

use kudu_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Which role a peer in the Raft config plays. Only `Voter` peers count
/// toward quorum; all other roles never send or receive vote RPCs
/// (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeerRole {
    Voter,
    /// Observer/learner-style roles: replicates the log but never votes.
    NonVoter,
}

/// One peer in the tablet's Raft configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub uuid: String,
    pub role: PeerRole,
}

impl Peer {
    pub fn new(uuid: impl Into<String>, role: PeerRole) -> Self {
        Self { uuid: uuid.into(), role }
    }

    /// Mints a peer with a fresh random uuid, the way a tablet server
    /// picks its own server uuid at first startup rather than having
    /// one assigned.
    pub fn new_with_random_uuid(role: PeerRole) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), role)
    }

    pub fn is_voter(&self) -> bool {
        self.role == PeerRole::Voter
    }
}

/// The tablet's Raft configuration: the list of peers a leader election
/// is run against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RaftConfig {
    pub peers: Vec<Peer>,
}

impl RaftConfig {
    pub fn new(peers: Vec<Peer>) -> Self {
        Self { peers }
    }

    /// Number of `Voter`-role peers in this config, including the
    /// candidate itself if it appears in `peers`. Quorum math (spec §3,
    /// §4.5) is always computed over this count.
    pub fn voter_count(&self) -> usize {
        self.peers.iter().filter(|p| p.is_voter()).count()
    }
}

/// `RequestVote` request (spec §6). `candidate_last_logged_opid`
/// supplements the distilled spec: the upstream protocol always lets a
/// voter compare the candidate's log recency against its own before
/// granting, and a request without that field would be unusable by any
/// real voter implementation even though the voter side is out of scope
/// here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub candidate_uuid: String,
    pub candidate_term: u64,
    pub tablet_id: String,
    pub dest_uuid: String,
    pub is_pre_election: bool,
    pub candidate_last_logged_opid: kudu_delta::OpId,
}

impl VoteRequest {
    pub fn new(
        candidate_uuid: impl Into<String>,
        candidate_term: u64,
        tablet_id: impl Into<String>,
        is_pre_election: bool,
        candidate_last_logged_opid: kudu_delta::OpId,
    ) -> Self {
        Self {
            candidate_uuid: candidate_uuid.into(),
            candidate_term,
            tablet_id: tablet_id.into(),
            dest_uuid: String::new(),
            is_pre_election,
            candidate_last_logged_opid,
        }
    }

    /// Returns a copy addressed to `dest_uuid`, as the election sends a
    /// distinct request per voter carrying that voter's uuid as
    /// `dest_uuid` (spec §4.6).
    pub fn addressed_to(&self, dest_uuid: impl Into<String>) -> Self {
        Self { dest_uuid: dest_uuid.into(), ..self.clone() }
    }
}

/// `RequestVote` response (spec §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteResponse {
    pub responder_uuid: String,
    pub responder_term: u64,
    pub vote_granted: bool,
    pub consensus_error: Option<String>,
}

impl VoteResponse {
    pub fn granted(responder_uuid: impl Into<String>, responder_term: u64) -> Self {
        Self { responder_uuid: responder_uuid.into(), responder_term, vote_granted: true, consensus_error: None }
    }

    pub fn denied(responder_uuid: impl Into<String>, responder_term: u64) -> Self {
        Self { responder_uuid: responder_uuid.into(), responder_term, vote_granted: false, consensus_error: None }
    }

    pub fn tablet_error(responder_uuid: impl Into<String>, responder_term: u64, message: impl Into<String>) -> Self {
        Self {
            responder_uuid: responder_uuid.into(),
            responder_term,
            vote_granted: false,
            consensus_error: Some(message.into()),
        }
    }
}

/// Encodes `request` the way a transport crate would serialize it onto
/// the wire.
pub fn encode_vote_request(request: &VoteRequest) -> Result<Vec<u8>> {
    postcard::to_allocvec(request).map_err(|e| Error::corruption(format!("encode vote request: {e}")))
}

pub fn decode_vote_request(bytes: &[u8]) -> Result<VoteRequest> {
    postcard::from_bytes(bytes).map_err(|e| Error::corruption(format!("decode vote request: {e}")))
}

pub fn encode_vote_response(response: &VoteResponse) -> Result<Vec<u8>> {
    postcard::to_allocvec(response).map_err(|e| Error::corruption(format!("encode vote response: {e}")))
}

pub fn decode_vote_response(bytes: &[u8]) -> Result<VoteResponse> {
    postcard::from_bytes(bytes).map_err(|e| Error::corruption(format!("decode vote response: {e}")))
}
