//! Treasury module for Steward
//!
//! The [`TreasuryCustodian`] holds the shared balance. The agent moves funds
//! out of it under a rolling daily limit and votes through it on governance
//! ledgers; governance sets the limit and the emergency admin can pause it.

use thiserror::Error;

use steward_core::{Amount, ErrorKind, PrincipalId, Role, StorageError};
use steward_governance::GovernanceError;

pub mod custodian;
pub mod disburser;
pub mod window;

pub use custodian::{CustodianState, ProxiedVote, TreasuryCustodian};
pub use disburser::{DirectDisburser, DisbursementError, Disburser};
pub use window::SpendWindow;

/// Error types for treasury operations
#[derive(Error, Debug)]
pub enum TreasuryError {
    #[error("{caller} does not hold the {role} role")]
    Unauthorized { caller: PrincipalId, role: Role },

    #[error("Treasury is paused")]
    Paused,

    #[error("Daily spend limit exceeded: {requested} requested, {spent_today} of {limit} already spent")]
    SpendLimitExceeded {
        requested: Amount,
        spent_today: Amount,
        limit: Amount,
    },

    #[error("Insufficient balance: {requested} requested, {balance} available")]
    InsufficientBalance { requested: Amount, balance: Amount },

    #[error("Balance overflow")]
    AmountOverflow,

    #[error("Disbursement failed: {0}")]
    DisbursementFailed(#[from] DisbursementError),

    #[error("Proxied vote on ledger {ledger} failed: {source}")]
    ProxyVoteFailed {
        ledger: String,
        #[source]
        source: GovernanceError,
    },

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

impl TreasuryError {
    /// The error class this failure belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            TreasuryError::Unauthorized { .. } => ErrorKind::Authorization,
            TreasuryError::Paused => ErrorKind::State,
            TreasuryError::SpendLimitExceeded { .. }
            | TreasuryError::InsufficientBalance { .. }
            | TreasuryError::AmountOverflow => ErrorKind::Policy,
            TreasuryError::DisbursementFailed(_) | TreasuryError::ProxyVoteFailed { .. } => {
                ErrorKind::ExternalCall
            }
            TreasuryError::StorageError(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for treasury operations
pub type TreasuryResult<T> = Result<T, TreasuryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let unauthorized = TreasuryError::Unauthorized {
            caller: "x".into(),
            role: Role::Agent,
        };
        assert_eq!(unauthorized.kind(), ErrorKind::Authorization);
        assert_eq!(unauthorized.to_string(), "x does not hold the agent role");
        assert_eq!(TreasuryError::Paused.kind(), ErrorKind::State);
        assert_eq!(TreasuryError::AmountOverflow.kind(), ErrorKind::Policy);

        // Whatever went wrong inside the ledger, the proxy reports an external failure
        let nested = TreasuryError::ProxyVoteFailed {
            ledger: "governance".into(),
            source: GovernanceError::NoVotingPower("treasury".into()),
        };
        assert_eq!(nested.kind(), ErrorKind::ExternalCall);
    }
}
