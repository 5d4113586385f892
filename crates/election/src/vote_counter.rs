// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

//! Vote counter (C5): tallies yes/no votes, detects a decision, and
//! rejects duplicate/conflicting votes (spec §4.5).

use std::collections::HashMap;

use kudu_core::{Error, Result};

/// The outcome of a decided election round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Granted,
    Denied,
}

/// Holds `num_voters`, `majority_size`, and a mapping from voter
/// identity to the vote it cast.
///
/// A candidate constructs this with `num_voters = |VOTERS in config|`
/// and `majority_size = floor(num_voters/2) + 1`, then records its own
/// self-vote before the election begins (spec §4.5, §3 invariants).
#[derive(Debug)]
pub struct VoteCounter {
    num_voters: usize,
    majority_size: usize,
    votes: HashMap<String, bool>,
    yes: usize,
    no: usize,
}

impl VoteCounter {
    /// `num_voters > 0` and `0 < majority_size <= num_voters` (spec §4.5
    /// invariant); violating either is an invalid-argument error.
    pub fn new(num_voters: usize, majority_size: usize) -> Result<Self> {
        if num_voters == 0 {
            return Err(Error::invalid_argument("num_voters must be greater than zero"));
        }
        if majority_size == 0 || majority_size > num_voters {
            return Err(Error::invalid_argument(format!(
                "majority_size ({majority_size}) must be in (0, num_voters={num_voters}]"
            )));
        }
        Ok(Self { num_voters, majority_size, votes: HashMap::new(), yes: 0, no: 0 })
    }

    /// The majority size implied by Raft quorum math: `floor(n/2) + 1`.
    pub fn majority_size_for(num_voters: usize) -> usize {
        num_voters / 2 + 1
    }

    pub fn num_voters(&self) -> usize {
        self.num_voters
    }

    pub fn majority_size(&self) -> usize {
        self.majority_size
    }

    pub fn yes_count(&self) -> usize {
        self.yes
    }

    pub fn no_count(&self) -> usize {
        self.no
    }

    /// Records `voter`'s vote. Returns `Ok(true)` if this is a duplicate
    /// of an identical previously-recorded vote (a no-op, not an error).
    /// Fails with `InvalidArgument` if the voter previously voted the
    /// *other* way (a protocol violation — a voter flipping its vote),
    /// or if recording a new voter would exceed `num_voters`.
    pub fn register_vote(&mut self, voter: impl Into<String>, vote: bool) -> Result<bool> {
        let voter = voter.into();
        if let Some(&existing) = self.votes.get(&voter) {
            if existing != vote {
                return Err(Error::invalid_argument(format!(
                    "voter {voter} changed its vote from {existing} to {vote}"
                )));
            }
            return Ok(true);
        }

        if self.votes.len() >= self.num_voters {
            return Err(Error::invalid_argument(format!(
                "recording a vote from {voter} would exceed num_voters={}",
                self.num_voters
            )));
        }

        self.votes.insert(voter, vote);
        if vote {
            self.yes += 1;
        } else {
            self.no += 1;
        }
        Ok(false)
    }

    /// `true` iff `yes >= majority_size` or `no > num_voters - majority_size`.
    pub fn is_decided(&self) -> bool {
        self.yes >= self.majority_size || self.no > self.num_voters - self.majority_size
    }

    /// Returns the decision if one has been reached; `IllegalState` if
    /// queried before a decision exists (spec §7).
    pub fn decision(&self) -> Result<Decision> {
        if self.yes >= self.majority_size {
            Ok(Decision::Granted)
        } else if self.no > self.num_voters - self.majority_size {
            Ok(Decision::Denied)
        } else {
            Err(Error::illegal_state("vote counter queried for a decision before one was reached"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_construction() {
        assert!(VoteCounter::new(0, 1).is_err());
        assert!(VoteCounter::new(3, 0).is_err());
        assert!(VoteCounter::new(3, 4).is_err());
        assert!(VoteCounter::new(3, 2).is_ok());
    }

    #[test]
    fn majority_decides_granted() {
        let mut counter = VoteCounter::new(3, 2).unwrap();
        counter.register_vote("a", true).unwrap();
        assert!(!counter.is_decided());
        counter.register_vote("b", true).unwrap();
        assert!(counter.is_decided());
        assert_eq!(counter.decision().unwrap(), Decision::Granted);
    }

    #[test]
    fn enough_denials_decide_denied() {
        let mut counter = VoteCounter::new(3, 2).unwrap();
        counter.register_vote("a", false).unwrap();
        assert!(!counter.is_decided());
        counter.register_vote("b", false).unwrap();
        assert!(counter.is_decided());
        assert_eq!(counter.decision().unwrap(), Decision::Denied);
    }

    #[test]
    fn decision_before_decided_is_illegal_state() {
        let mut counter = VoteCounter::new(3, 2).unwrap();
        counter.register_vote("a", true).unwrap();
        let err = counter.decision().unwrap_err();
        assert_eq!(err.kind, kudu_core::ErrorKind::IllegalState);
    }

    /// Scenario 4 (spec §8): a voter replying twice `GRANTED` is flagged
    /// a duplicate on the second call and the tally is unchanged.
    #[test]
    fn scenario_duplicate_vote_is_a_no_op() {
        let mut counter = VoteCounter::new(3, 2).unwrap();
        let first = counter.register_vote("b", true).unwrap();
        assert!(!first, "first vote from b is not a duplicate");
        assert_eq!(counter.yes_count(), 1);

        let second = counter.register_vote("b", true).unwrap();
        assert!(second, "second identical vote from b is a duplicate");
        assert_eq!(counter.yes_count(), 1, "tally must not double-count a duplicate");
    }

    #[test]
    fn flipping_a_vote_is_an_invalid_argument_error() {
        let mut counter = VoteCounter::new(3, 2).unwrap();
        counter.register_vote("b", true).unwrap();
        let err = counter.register_vote("b", false).unwrap_err();
        assert_eq!(err.kind, kudu_core::ErrorKind::InvalidArgument);
    }

    #[test]
    fn exceeding_num_voters_is_an_invalid_argument_error() {
        let mut counter = VoteCounter::new(2, 2).unwrap();
        counter.register_vote("a", true).unwrap();
        counter.register_vote("b", true).unwrap();
        let err = counter.register_vote("c", true).unwrap_err();
        assert_eq!(err.kind, kudu_core::ErrorKind::InvalidArgument);
    }

    #[test]
    fn majority_size_for_matches_raft_quorum_math() {
        assert_eq!(VoteCounter::majority_size_for(1), 1);
        assert_eq!(VoteCounter::majority_size_for(3), 2);
        assert_eq!(VoteCounter::majority_size_for(5), 3);
    }
}
