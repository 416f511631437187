//! Governance module for Steward
//!
//! Weighted proposal voting: the [`AccessRegistry`] assigns voting power, the
//! [`ProposalLedger`] records proposals, votes and executions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use steward_core::{
    ErrorKind, PrincipalId, ProposalId, StorageError, Timestamp, VoteChoice, Weight,
};

pub mod ledger;
pub mod registry;
pub mod voting;

pub use ledger::ProposalLedger;
pub use registry::AccessRegistry;
pub use voting::{GovernancePolicy, Tally, VotingResult};

/// Error types for governance operations
#[derive(Error, Debug)]
pub enum GovernanceError {
    /// Caller does not hold the role the operation requires
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Caller has no voting weight
    #[error("No voting power: {0}")]
    NoVotingPower(PrincipalId),

    #[error("Proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    #[error("Voting on proposal {proposal_id} closed at {deadline}")]
    VotingClosed { proposal_id: ProposalId, deadline: Timestamp },

    #[error("Voting on proposal {proposal_id} is open until {deadline}")]
    VotingOpen { proposal_id: ProposalId, deadline: Timestamp },

    #[error("{voter} already voted on proposal {proposal_id}")]
    AlreadyVoted { proposal_id: ProposalId, voter: PrincipalId },

    #[error("Proposal already executed: {0}")]
    AlreadyExecuted(ProposalId),

    #[error("Quorum not met: required {required}, actual {actual}")]
    QuorumNotMet { required: Weight, actual: Weight },

    #[error("Proposal rejected: {votes_for} for does not exceed {votes_against} against")]
    Rejected { votes_for: Weight, votes_against: Weight },

    #[error("Vote tally overflow on proposal {0}")]
    TallyOverflow(ProposalId),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

impl GovernanceError {
    /// The error class this failure belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            GovernanceError::PermissionDenied(_) | GovernanceError::NoVotingPower(_) => {
                ErrorKind::Authorization
            }
            GovernanceError::ProposalNotFound(_)
            | GovernanceError::VotingClosed { .. }
            | GovernanceError::VotingOpen { .. }
            | GovernanceError::AlreadyVoted { .. }
            | GovernanceError::AlreadyExecuted(_) => ErrorKind::State,
            GovernanceError::QuorumNotMet { .. }
            | GovernanceError::Rejected { .. }
            | GovernanceError::TallyOverflow(_) => ErrorKind::Policy,
            GovernanceError::StorageError(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for governance operations
pub type GovernanceResult<T> = Result<T, GovernanceError>;

/// A proposal put to a weighted vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Position in the ledger's proposal counter
    pub id: ProposalId,
    pub title: String,
    pub description: String,
    /// The principal that opened the proposal
    pub proposer: PrincipalId,
    pub created_at: Timestamp,
    /// Votes are accepted strictly before this time, execution at or after it
    pub deadline: Timestamp,
    /// Weighted totals per choice
    pub tally: Tally,
    /// Set once on successful execution, never cleared
    pub executed: bool,
}

impl Proposal {
    /// Whether votes are still accepted at `now`
    pub fn is_open(&self, now: Timestamp) -> bool {
        !self.executed && now < self.deadline
    }
}

/// One principal's vote on one proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub proposal_id: ProposalId,
    pub voter: PrincipalId,
    pub choice: VoteChoice,
    /// The voter's weight when the vote was cast
    pub weight: Weight,
    pub cast_at: Timestamp,
}

/// Anything that accepts votes on numbered proposals.
///
/// The treasury holds `Arc<dyn VotingLedger>` handles to cast votes on the
/// agent's behalf.
#[async_trait]
pub trait VotingLedger: Send + Sync {
    /// Name the ledger is addressed by
    fn name(&self) -> &str;

    /// Cast `choice` on `proposal_id` as `caller`
    async fn cast_vote(
        &self,
        proposal_id: ProposalId,
        choice: VoteChoice,
        caller: &PrincipalId,
    ) -> GovernanceResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(GovernanceError::PermissionDenied("x".into()).kind(), ErrorKind::Authorization);
        assert_eq!(GovernanceError::NoVotingPower("x".into()).kind(), ErrorKind::Authorization);
        assert_eq!(GovernanceError::AlreadyExecuted(1).kind(), ErrorKind::State);
        assert_eq!(
            GovernanceError::Rejected { votes_for: 1, votes_against: 2 }.kind(),
            ErrorKind::Policy
        );
        assert_eq!(
            GovernanceError::StorageError(StorageError::KeyNotFound("k".into())).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_proposal_open_window() {
        let proposal = Proposal {
            id: 0,
            title: "t".into(),
            description: "d".into(),
            proposer: "alice".into(),
            created_at: 100,
            deadline: 200,
            tally: Tally::default(),
            executed: false,
        };
        assert!(proposal.is_open(199));
        assert!(!proposal.is_open(200));
    }
}
