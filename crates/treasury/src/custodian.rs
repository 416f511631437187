//! Treasury custodian
//!
//! Role gates:
//! - agent: `transfer`, `cast_vote_proxy`
//! - governance: `update_spend_limit`
//! - emergency admin: `pause`, `unpause`
//! - anyone: `deposit`
//!
//! Each mutation computes the next state on a copy and swaps it in only after
//! the notification commit succeeds. A transfer pays out through the
//! [`Disburser`] before committing, so a refused payment leaves the balance,
//! the spend counter and the window untouched.
//!
//! Once a payment or a nested ledger vote has gone through it cannot be taken
//! back. If the commit that follows fails, the call reports the storage error
//! but the in-memory state still records the payment or the vote. A recorded
//! payment is persisted by the next successful state commit.

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use steward_core::{
    Amount, Authority, Clock, JsonStorage, Notification, NotificationLog, PrincipalId,
    ProposalId, Role, Storage, Timestamp, VoteChoice, WriteBatch,
};
use steward_governance::VotingLedger;

use crate::{Disburser, SpendWindow, TreasuryError, TreasuryResult};

const STATE_PATH: &str = "treasury/state";
const PROXIED_VOTES_PATH: &str = "treasury/proxied_votes";

/// Persisted custodian state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodianState {
    pub balance: Amount,
    pub daily_spend_limit: Amount,
    pub window: SpendWindow,
    /// Blocks transfers and proxied votes while set
    pub paused: bool,
}

/// A vote the custodian cast on the agent's behalf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxiedVote {
    /// Name of the ledger the vote went to
    pub ledger: String,
    pub proposal_id: ProposalId,
    pub choice: VoteChoice,
    pub cast_at: Timestamp,
}

struct Inner {
    state: CustodianState,
    proxied: Vec<ProxiedVote>,
}

pub struct TreasuryCustodian {
    /// Identity the custodian votes under
    principal: PrincipalId,
    authority: Arc<dyn Authority>,
    disburser: Arc<dyn Disburser>,
    log: Arc<NotificationLog>,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

impl TreasuryCustodian {
    /// Open the custodian stored in `storage`.
    ///
    /// `daily_spend_limit` only applies the first time; afterwards the limit
    /// is whatever governance last set.
    pub async fn new(
        principal: impl Into<PrincipalId>,
        daily_spend_limit: Amount,
        authority: Arc<dyn Authority>,
        disburser: Arc<dyn Disburser>,
        storage: Arc<dyn Storage>,
        log: Arc<NotificationLog>,
        clock: Arc<dyn Clock>,
    ) -> TreasuryResult<Self> {
        let principal = principal.into();

        let state = match storage.get_json_opt::<CustodianState>(STATE_PATH).await? {
            Some(state) => state,
            None => {
                let state = CustodianState {
                    balance: 0,
                    daily_spend_limit,
                    window: SpendWindow::new(clock.now()),
                    paused: false,
                };
                storage.put_json(STATE_PATH, &state).await?;
                info!(principal = %principal, daily_spend_limit, "Initialized treasury");
                state
            }
        };

        let mut proxied = Vec::new();
        for key in storage.list(&format!("{}/", PROXIED_VOTES_PATH)).await? {
            proxied.push(storage.get_json::<ProxiedVote>(&key).await?);
        }

        info!(
            principal = %principal,
            balance = state.balance,
            limit = state.daily_spend_limit,
            paused = state.paused,
            "Loaded treasury with {} proxied votes",
            proxied.len()
        );

        Ok(Self {
            principal,
            authority,
            disburser,
            log,
            clock,
            inner: Mutex::new(Inner { state, proxied }),
        })
    }

    fn require(&self, caller: &PrincipalId, role: Role) -> TreasuryResult<()> {
        if self.authority.holds(caller, role) {
            Ok(())
        } else {
            warn!(caller = %caller, %role, "Treasury call rejected");
            Err(TreasuryError::Unauthorized {
                caller: caller.clone(),
                role,
            })
        }
    }

    fn state_batch(state: &CustodianState) -> TreasuryResult<WriteBatch> {
        let mut batch = WriteBatch::new();
        batch.put_json(STATE_PATH, state)?;
        Ok(batch)
    }

    fn proxied_key(index: usize) -> String {
        format!("{}/{:020}", PROXIED_VOTES_PATH, index)
    }

    /// Add funds. Anyone may deposit, paused or not.
    pub async fn deposit(&self, amount: Amount, caller: &PrincipalId) -> TreasuryResult<Amount> {
        let mut inner = self.inner.lock().await;
        let now = self.clock.now();

        let mut next = inner.state;
        next.balance = next
            .balance
            .checked_add(amount)
            .ok_or(TreasuryError::AmountOverflow)?;

        self.log
            .commit(
                Self::state_batch(&next)?,
                now,
                Notification::Deposit {
                    from: caller.clone(),
                    amount,
                    balance: next.balance,
                },
            )
            .await?;

        info!(from = %caller, amount, balance = next.balance, "Deposit received");
        inner.state = next;
        Ok(next.balance)
    }

    /// Pay `amount` to `to` within the daily limit
    pub async fn transfer(
        &self,
        to: &PrincipalId,
        amount: Amount,
        caller: &PrincipalId,
    ) -> TreasuryResult<CustodianState> {
        self.require(caller, Role::Agent)?;

        let mut inner = self.inner.lock().await;
        if inner.state.paused {
            return Err(TreasuryError::Paused);
        }

        let now = self.clock.now();
        let mut next = inner.state;
        next.window.roll(now);

        let spent = next.window.spent_today;
        let limit = next.daily_spend_limit;
        let exceeded = TreasuryError::SpendLimitExceeded {
            requested: amount,
            spent_today: spent,
            limit,
        };
        match spent.checked_add(amount) {
            Some(total) if total <= limit => next.window.spent_today = total,
            _ => return Err(exceeded),
        }

        if next.balance < amount {
            return Err(TreasuryError::InsufficientBalance {
                requested: amount,
                balance: next.balance,
            });
        }
        next.balance -= amount;

        let batch = Self::state_batch(&next)?;
        self.disburser.disburse(to, amount).await?;
        inner.state = next;

        let committed = self
            .log
            .commit(
                batch,
                now,
                Notification::Transfer {
                    to: to.clone(),
                    amount,
                    spent_today: next.window.spent_today,
                    balance: next.balance,
                },
            )
            .await;
        if let Err(e) = committed {
            error!(to = %to, amount, "Paid out but failed to record the transfer: {}", e);
            return Err(e.into());
        }

        info!(
            to = %to,
            amount,
            spent_today = next.window.spent_today,
            balance = next.balance,
            "Transfer complete"
        );
        Ok(next)
    }

    /// Vote on `target` as the custodian, on the agent's behalf.
    ///
    /// The custodian stays locked while the target ledger processes the vote.
    pub async fn cast_vote_proxy(
        &self,
        target: &dyn VotingLedger,
        proposal_id: ProposalId,
        choice: VoteChoice,
        caller: &PrincipalId,
    ) -> TreasuryResult<ProxiedVote> {
        self.require(caller, Role::Agent)?;

        let mut inner = self.inner.lock().await;
        if inner.state.paused {
            return Err(TreasuryError::Paused);
        }

        let ledger = target.name().to_string();
        if let Err(source) = target.cast_vote(proposal_id, choice, &self.principal).await {
            warn!(ledger = %ledger, proposal_id, "Proxied vote failed: {}", source);
            return Err(TreasuryError::ProxyVoteFailed { ledger, source });
        }

        let now = self.clock.now();
        let record = ProxiedVote {
            ledger: ledger.clone(),
            proposal_id,
            choice,
            cast_at: now,
        };

        let key = Self::proxied_key(inner.proxied.len());
        inner.proxied.push(record.clone());

        let mut batch = WriteBatch::new();
        batch.put_json(key, &record)?;
        let committed = self
            .log
            .commit(
                batch,
                now,
                Notification::VoteProxied {
                    ledger,
                    proposal_id,
                    choice,
                    voter: self.principal.clone(),
                },
            )
            .await;
        if let Err(e) = committed {
            error!(ledger = %record.ledger, proposal_id, "Vote cast but failed to record it: {}", e);
            return Err(e.into());
        }

        info!(ledger = %record.ledger, proposal_id, %choice, "Proxied vote cast");
        Ok(record)
    }

    /// Replace the daily spend limit. Returns the previous limit.
    pub async fn update_spend_limit(&self, new_limit: Amount, caller: &PrincipalId) -> TreasuryResult<Amount> {
        self.require(caller, Role::Governance)?;

        let mut inner = self.inner.lock().await;
        let now = self.clock.now();
        let previous = inner.state.daily_spend_limit;

        let mut next = inner.state;
        next.daily_spend_limit = new_limit;

        self.log
            .commit(
                Self::state_batch(&next)?,
                now,
                Notification::SpendLimitUpdated {
                    previous,
                    limit: new_limit,
                },
            )
            .await?;

        info!(previous, limit = new_limit, "Daily spend limit updated");
        inner.state = next;
        Ok(previous)
    }

    pub async fn pause(&self, caller: &PrincipalId) -> TreasuryResult<()> {
        self.set_paused(true, caller).await
    }

    pub async fn unpause(&self, caller: &PrincipalId) -> TreasuryResult<()> {
        self.set_paused(false, caller).await
    }

    async fn set_paused(&self, paused: bool, caller: &PrincipalId) -> TreasuryResult<()> {
        self.require(caller, Role::EmergencyAdmin)?;

        let mut inner = self.inner.lock().await;
        let now = self.clock.now();

        if inner.state.paused == paused {
            warn!(by = %caller, paused, "Pause flag already in requested state");
        }

        let mut next = inner.state;
        next.paused = paused;

        let notification = if paused {
            Notification::Paused { by: caller.clone() }
        } else {
            Notification::Unpaused { by: caller.clone() }
        };
        self.log.commit(Self::state_batch(&next)?, now, notification).await?;

        if paused {
            warn!(by = %caller, "Treasury paused");
        } else {
            info!(by = %caller, "Treasury unpaused");
        }
        inner.state = next;
        Ok(())
    }

    /// How much could be transferred right now, counting a pending window reset
    pub async fn remaining_daily_allowance(&self) -> Amount {
        let inner = self.inner.lock().await;
        inner
            .state
            .window
            .remaining(inner.state.daily_spend_limit, self.clock.now())
    }

    pub async fn balance(&self) -> Amount {
        self.inner.lock().await.state.balance
    }

    pub async fn is_paused(&self) -> bool {
        self.inner.lock().await.state.paused
    }

    /// Snapshot of the stored state, without applying a pending window reset
    pub async fn state(&self) -> CustodianState {
        self.inner.lock().await.state
    }

    /// Votes cast through `cast_vote_proxy`, oldest first
    pub async fn proxied_votes(&self) -> Vec<ProxiedVote> {
        self.inner.lock().await.proxied.clone()
    }

    /// Identity the custodian votes under
    pub fn principal(&self) -> &PrincipalId {
        &self.principal
    }
}
