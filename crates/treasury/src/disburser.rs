//! Disbursement sink
//!
//! Funds leaving the treasury are handed to a [`Disburser`]. A refusal makes
//! the whole transfer fail and roll back.

use std::collections::HashSet;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use steward_core::{Amount, PrincipalId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DisbursementError {
    #[error("Recipient {recipient} rejected the payment: {reason}")]
    Rejected { recipient: PrincipalId, reason: String },

    #[error("Payment channel unavailable: {0}")]
    Unavailable(String),
}

/// Where transferred funds go
#[async_trait]
pub trait Disburser: Send + Sync {
    /// Pay `amount` to `to`. An error means nothing was paid.
    async fn disburse(&self, to: &PrincipalId, amount: Amount) -> Result<(), DisbursementError>;
}

/// Pays every recipient except those on its block list
#[derive(Debug, Clone, Default)]
pub struct DirectDisburser {
    blocked: HashSet<PrincipalId>,
}

impl DirectDisburser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse payments to `recipients`
    pub fn with_blocked<I, P>(mut self, recipients: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PrincipalId>,
    {
        self.blocked.extend(recipients.into_iter().map(Into::into));
        self
    }
}

#[async_trait]
impl Disburser for DirectDisburser {
    async fn disburse(&self, to: &PrincipalId, amount: Amount) -> Result<(), DisbursementError> {
        if self.blocked.contains(to) {
            warn!(recipient = %to, amount, "Refusing payment to blocked recipient");
            return Err(DisbursementError::Rejected {
                recipient: to.clone(),
                reason: "recipient is blocked".to_string(),
            });
        }

        info!(recipient = %to, amount, "Disbursed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blocked_recipient_is_refused() {
        let disburser = DirectDisburser::new().with_blocked(["mallory"]);

        assert!(disburser.disburse(&"alice".into(), 10).await.is_ok());
        let err = disburser.disburse(&"mallory".into(), 10).await.unwrap_err();
        assert!(matches!(err, DisbursementError::Rejected { .. }));
    }
}
