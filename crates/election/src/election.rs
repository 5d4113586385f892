// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

//! Leader election (C6): drives one round of remote vote RPCs to a
//! decision (spec §4.6).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use kudu_core::Result;
use parking_lot::Mutex;
use tracing::{instrument, trace, warn};

use crate::peer::PeerProxyFactory;
use crate::vote_counter::{Decision, VoteCounter};
use crate::wire::{PeerRole, RaftConfig, VoteRequest, VoteResponse};

/// The result of a completed election round, delivered to the
/// [`LeaderElection`]'s callback exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectionResult {
    pub vote_request: VoteRequest,
    pub decision: Decision,
    pub highest_voter_term: u64,
    pub message: String,
}

struct ElectionState {
    counter: VoteCounter,
    highest_voter_term: u64,
    result: Option<ElectionResult>,
}

type ResultCallback = dyn FnOnce(ElectionResult) + Send;

/// One election object drives one vote round (spec §4.6).
///
/// Construct with [`LeaderElection::new`], then drive it to completion
/// with [`LeaderElection::run`]. The result callback fires exactly
/// once; the destructor asserts this held if the election was actually
/// run ("the destructor asserts this", spec §4.6).
pub struct LeaderElection {
    config: RaftConfig,
    proxy_factory: Arc<dyn PeerProxyFactory>,
    request: VoteRequest,
    timeout: Duration,
    state: Mutex<ElectionState>,
    has_responded: AtomicBool,
    started: AtomicBool,
    callback: Mutex<Option<Box<ResultCallback>>>,
}

impl LeaderElection {
    /// `counter` must already be seeded with the candidate's self-vote
    /// (spec §3: "an election is created with a vote counter seeded by
    /// the self-vote").
    pub fn new(
        config: RaftConfig,
        proxy_factory: Arc<dyn PeerProxyFactory>,
        counter: VoteCounter,
        request: VoteRequest,
        timeout: Duration,
        callback: impl FnOnce(ElectionResult) + Send + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            proxy_factory,
            request,
            timeout,
            state: Mutex::new(ElectionState { counter, highest_voter_term: 0, result: None }),
            has_responded: AtomicBool::new(false),
            started: AtomicBool::new(false),
            callback: Mutex::new(Some(Box::new(callback))),
        })
    }

    /// Drives the election round to completion: builds proxies, checks
    /// for an already-decided outcome (the single-node / self-vote-is-a-
    /// majority case), then issues one vote RPC per live voter proxy and
    /// awaits every response (spec §4.6 steps 1-4).
    #[instrument(level = "debug", skip(self), fields(candidate = %self.request.candidate_uuid, term = self.request.candidate_term))]
    pub async fn run(self: &Arc<Self>) {
        self.started.store(true, Ordering::SeqCst);

        let candidate_uuid = self.request.candidate_uuid.clone();
        let mut live_proxies = Vec::new();
        let mut other_voters = 0usize;

        for peer in &self.config.peers {
            if peer.uuid == candidate_uuid {
                continue;
            }
            if peer.role != PeerRole::Voter {
                continue;
            }
            other_voters += 1;
            match self.proxy_factory.new_proxy(peer).await {
                Ok(proxy) => live_proxies.push((peer.uuid.clone(), proxy)),
                Err(e) => {
                    warn!(peer = %peer.uuid, error = %e, "failed to build peer proxy; recording denied vote");
                    self.apply_vote(&peer.uuid, false, None, false);
                }
            }
        }

        {
            let state = self.state.lock();
            let expected = state.counter.num_voters();
            debug_assert_eq!(
                1 + other_voters,
                expected,
                "self_votes_counted + other_voters must equal num_voters_expected"
            );
        }

        // Covers single-node configs where the self-vote is already a
        // majority (spec §4.6 step 3).
        self.check_for_decision();

        let mut handles = Vec::new();
        for (voter_uuid, proxy) in live_proxies {
            let this = Arc::clone(self);
            let request = self.request.addressed_to(voter_uuid.clone());
            let timeout = self.timeout;
            handles.push(tokio::spawn(async move {
                trace!(voter = %voter_uuid, "sending vote rpc");
                let outcome = tokio::time::timeout(timeout, proxy.request_vote(request)).await;
                this.handle_response(&voter_uuid, outcome);
            }));
        }

        for handle in handles {
            let _ = handle.await;
        }
    }

    fn handle_response(&self, voter_uuid: &str, outcome: std::result::Result<Result<VoteResponse>, tokio::time::error::Elapsed>) {
        match outcome {
            Err(_elapsed) => {
                trace!(voter = %voter_uuid, "vote rpc timed out; recording denied vote");
                self.apply_vote(voter_uuid, false, None, false);
            }
            Ok(Err(e)) => {
                trace!(voter = %voter_uuid, error = %e, "vote rpc failed; recording denied vote");
                self.apply_vote(voter_uuid, false, None, false);
            }
            Ok(Ok(response)) => {
                if response.consensus_error.is_some() {
                    trace!(voter = %voter_uuid, "tablet-level error in vote response; recording denied vote");
                    self.apply_vote(voter_uuid, false, Some(response.responder_term), false);
                    return;
                }
                if response.responder_uuid != voter_uuid {
                    warn!(
                        voter = %voter_uuid,
                        responder = %response.responder_uuid,
                        "responder uuid mismatch; recording denied vote"
                    );
                    self.apply_vote(voter_uuid, false, Some(response.responder_term), false);
                    return;
                }
                self.apply_vote(voter_uuid, response.vote_granted, Some(response.responder_term), true);
            }
        }
    }

    /// Records one voter's vote, tracks `highest_voter_term`, and — if
    /// the vote is a legitimately-denied response carrying a higher
    /// term than the candidate's — cancels the election immediately
    /// with a `DENIED` decision even if the counter is not yet strictly
    /// majority-decided (spec §4.6: "immediate election cancellation").
    fn apply_vote(&self, voter_uuid: &str, granted: bool, responder_term: Option<u64>, legit_response: bool) {
        {
            let mut state = self.state.lock();
            if let Some(term) = responder_term {
                state.highest_voter_term = state.highest_voter_term.max(term);
            }

            match state.counter.register_vote(voter_uuid, granted) {
                Ok(_is_duplicate) => {}
                Err(e) => warn!(voter = %voter_uuid, error = %e, "ignoring protocol-violating vote"),
            }

            if legit_response && !granted {
                if let Some(term) = responder_term {
                    if term > self.request.candidate_term && state.result.is_none() {
                        state.result = Some(ElectionResult {
                            vote_request: self.request.clone(),
                            decision: Decision::Denied,
                            highest_voter_term: term,
                            message: format!(
                                "cancelled: voter {voter_uuid} reports higher term {term} (candidate term {})",
                                self.request.candidate_term
                            ),
                        });
                    }
                }
            }
        }
        self.check_for_decision();
    }

    /// Under the lock: if not already finalized and the counter is
    /// decided (or a higher-term cancellation already populated the
    /// result), marks `has_responded = true`, releases the lock, then
    /// invokes the callback. The callback fires exactly once (spec
    /// §4.6).
    fn check_for_decision(&self) {
        let result = {
            let mut state = self.state.lock();
            if self.has_responded.load(Ordering::Acquire) {
                return;
            }

            if state.result.is_none() && state.counter.is_decided() {
                let decision = state.counter.decision().expect("counter reported decided");
                state.result = Some(ElectionResult {
                    vote_request: self.request.clone(),
                    decision,
                    highest_voter_term: state.highest_voter_term,
                    message: format!(
                        "yes={}, no={}, majority={}",
                        state.counter.yes_count(),
                        state.counter.no_count(),
                        state.counter.majority_size()
                    ),
                });
            }

            match &state.result {
                Some(result) => {
                    self.has_responded.store(true, Ordering::Release);
                    Some(result.clone())
                }
                None => None,
            }
        };

        if let Some(result) = result {
            if let Some(callback) = self.callback.lock().take() {
                callback(result);
            }
        }
    }

    pub fn has_responded(&self) -> bool {
        self.has_responded.load(Ordering::Acquire)
    }
}

impl Drop for LeaderElection {
    fn drop(&mut self) {
        if self.started.load(Ordering::Acquire) {
            debug_assert!(
                self.has_responded.load(Ordering::Acquire),
                "election result callback must fire exactly once before the election is dropped"
            );
        }
    }
}

/// Seeds a [`VoteCounter`] for `config` with the candidate's own
/// self-vote already recorded, matching "a candidate constructs the
/// counter with `num_voters = |VOTERS in config|` ... then records its
/// own self-vote before the election begins" (spec §4.5).
pub fn seed_self_vote(config: &RaftConfig, candidate_uuid: &str) -> Result<VoteCounter> {
    let num_voters = config.voter_count();
    let majority = VoteCounter::majority_size_for(num_voters);
    let mut counter = VoteCounter::new(num_voters, majority)?;
    counter.register_vote(candidate_uuid, true)?;
    Ok(counter)
}
