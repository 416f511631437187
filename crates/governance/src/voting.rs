//! Weighted tallies and the execution rule
//!
//! A proposal passes when the total weighted vote reaches quorum and votes
//! for strictly exceed votes against. Abstentions count toward quorum only.

use serde::{Deserialize, Serialize};

use steward_core::{VoteChoice, Weight, SECONDS_PER_DAY};

/// Execution policy, fixed when the ledger is first initialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernancePolicy {
    /// Minimum total weighted votes required before execution
    pub quorum: Weight,
    /// Seconds from creation to the voting deadline
    pub voting_period: u64,
}

impl Default for GovernancePolicy {
    fn default() -> Self {
        Self {
            quorum: 100,
            voting_period: 7 * SECONDS_PER_DAY,
        }
    }
}

impl GovernancePolicy {
    pub fn new(quorum: Weight, voting_period: u64) -> Self {
        Self { quorum, voting_period }
    }

    /// Evaluate a tally against this policy
    pub fn evaluate(&self, tally: &Tally) -> VotingResult {
        let total_votes = tally.total();
        let has_quorum = total_votes >= self.quorum;
        let approved = has_quorum && tally.votes_for > tally.votes_against;

        VotingResult {
            approved,
            has_quorum,
            votes_for: tally.votes_for,
            votes_against: tally.votes_against,
            votes_abstain: tally.votes_abstain,
            total_votes,
            quorum: self.quorum,
        }
    }
}

/// Weighted vote totals of one proposal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub votes_for: Weight,
    pub votes_against: Weight,
    pub votes_abstain: Weight,
}

impl Tally {
    /// Sum of all three tallies
    pub fn total(&self) -> Weight {
        self.votes_for
            .saturating_add(self.votes_against)
            .saturating_add(self.votes_abstain)
    }

    /// Add `weight` to the tally for `choice`.
    ///
    /// Returns `None` if the chosen tally or the overall total would overflow,
    /// so `total()` never saturates for a tally built through this method.
    pub fn with_vote(&self, choice: VoteChoice, weight: Weight) -> Option<Tally> {
        self.votes_for
            .checked_add(self.votes_against)?
            .checked_add(self.votes_abstain)?
            .checked_add(weight)?;

        let mut next = *self;
        match choice {
            VoteChoice::For => next.votes_for += weight,
            VoteChoice::Against => next.votes_against += weight,
            VoteChoice::Abstain => next.votes_abstain += weight,
        }
        Some(next)
    }
}

/// Result of evaluating a tally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingResult {
    /// Quorum reached and votes for exceed votes against
    pub approved: bool,
    pub has_quorum: bool,
    pub votes_for: Weight,
    pub votes_against: Weight,
    pub votes_abstain: Weight,
    pub total_votes: Weight,
    /// Quorum the tally was measured against
    pub quorum: Weight,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(votes_for: Weight, votes_against: Weight, votes_abstain: Weight) -> Tally {
        Tally { votes_for, votes_against, votes_abstain }
    }

    #[test]
    fn test_majority_with_quorum() {
        let policy = GovernancePolicy::new(100, 60);
        let result = policy.evaluate(&tally(80, 30, 0));

        assert!(result.has_quorum);
        assert!(result.approved);
        assert_eq!(result.total_votes, 110);
    }

    #[test]
    fn test_against_majority_rejected() {
        let policy = GovernancePolicy::new(100, 60);
        let result = policy.evaluate(&tally(50, 60, 0));

        assert!(result.has_quorum);
        assert!(!result.approved);
    }

    #[test]
    fn test_tie_is_rejected() {
        let policy = GovernancePolicy::new(10, 60);
        assert!(!policy.evaluate(&tally(50, 50, 0)).approved);
    }

    #[test]
    fn test_abstain_counts_toward_quorum_only() {
        let policy = GovernancePolicy::new(100, 60);

        let result = policy.evaluate(&tally(10, 0, 95));
        assert!(result.has_quorum);
        assert!(result.approved);

        let result = policy.evaluate(&tally(10, 0, 89));
        assert!(!result.has_quorum);
        assert!(!result.approved);
    }

    #[test]
    fn test_with_vote_adds_to_chosen_tally() {
        let start = Tally::default();
        let next = start.with_vote(VoteChoice::Against, 7).unwrap();
        assert_eq!(next, tally(0, 7, 0));
        assert_eq!(start, Tally::default());

        let next = next.with_vote(VoteChoice::Abstain, 3).unwrap();
        assert_eq!(next.total(), 10);
    }

    #[test]
    fn test_with_vote_rejects_overflow() {
        let full = tally(Weight::MAX - 5, 0, 0);
        assert!(full.with_vote(VoteChoice::Against, 10).is_none());
        assert!(full.with_vote(VoteChoice::Against, 5).is_some());
    }
}
