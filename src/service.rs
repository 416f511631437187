//! Typed request/response surface
//!
//! One [`Request`] variant per operation. The caller identity travels next to
//! the request, never inside it, so every role check sees the same principal.

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use steward_core::{Amount, NotificationRecord, PrincipalId, ProposalId, VoteChoice, Weight};
use steward_governance::{Proposal, VoteRecord, VotingResult};
use steward_treasury::{CustodianState, ProxiedVote};

use crate::{Steward, StewardResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    SetWeight { principal: PrincipalId, weight: Weight },
    GetWeight { principal: PrincipalId },
    ListWeights,
    CreateProposal { title: String, description: String },
    CastVote { proposal_id: ProposalId, choice: VoteChoice },
    ExecuteProposal { proposal_id: ProposalId },
    GetProposal { proposal_id: ProposalId },
    HasVoted { proposal_id: ProposalId, principal: PrincipalId },
    ListProposals,
    ListVotes { proposal_id: ProposalId },
    /// Evaluate the execution gate without executing
    Outcome { proposal_id: ProposalId },
    Policy,
    Deposit { amount: Amount },
    Transfer { to: PrincipalId, amount: Amount },
    CastVoteProxy { ledger: String, proposal_id: ProposalId, choice: VoteChoice },
    UpdateSpendLimit { limit: Amount },
    Pause,
    Unpause,
    RemainingDailyAllowance,
    TreasuryState,
    ProxiedVotes,
    ReadNotifications { from: u64, limit: usize },
}

impl Request {
    /// Whether handling this request appends to the notification log
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Request::SetWeight { .. }
                | Request::CreateProposal { .. }
                | Request::CastVote { .. }
                | Request::ExecuteProposal { .. }
                | Request::Deposit { .. }
                | Request::Transfer { .. }
                | Request::CastVoteProxy { .. }
                | Request::UpdateSpendLimit { .. }
                | Request::Pause
                | Request::Unpause
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Response {
    WeightSet { principal: PrincipalId, weight: Weight, previous: Weight },
    Weight { principal: PrincipalId, weight: Weight },
    Weights(Vec<(PrincipalId, Weight)>),
    ProposalCreated { proposal_id: ProposalId },
    VoteCast(VoteRecord),
    Executed(VotingResult),
    Proposal(Proposal),
    HasVoted { proposal_id: ProposalId, principal: PrincipalId, voted: bool },
    Proposals(Vec<Proposal>),
    Votes(Vec<VoteRecord>),
    Outcome(VotingResult),
    Policy { quorum: Weight, voting_period: u64 },
    Balance { balance: Amount },
    Transferred(CustodianState),
    VoteProxied(ProxiedVote),
    SpendLimitUpdated { previous: Amount, limit: Amount },
    Paused { paused: bool },
    Allowance { remaining: Amount },
    TreasuryState(CustodianState),
    ProxiedVotes(Vec<ProxiedVote>),
    Notifications(Vec<NotificationRecord>),
}

/// Dispatches requests to the components of one [`Steward`]
#[derive(Clone)]
pub struct StewardService {
    steward: Arc<Steward>,
}

impl StewardService {
    pub fn new(steward: Arc<Steward>) -> Self {
        Self { steward }
    }

    pub fn steward(&self) -> &Arc<Steward> {
        &self.steward
    }

    /// Handle one request on behalf of `caller`.
    ///
    /// A rejected mutation is logged at `warn`; failed reads are not.
    pub async fn handle(&self, caller: &PrincipalId, request: Request) -> StewardResult<Response> {
        debug!(caller = %caller, ?request, "Handling request");

        let mutation = request.is_mutation();
        let result = self.dispatch(caller, request).await;
        if let Err(e) = &result {
            if mutation {
                warn!(caller = %caller, kind = ?e.kind(), "Request rejected: {}", e);
            }
        }
        result
    }

    async fn dispatch(&self, caller: &PrincipalId, request: Request) -> StewardResult<Response> {
        let registry = self.steward.registry();
        let ledger = self.steward.ledger();
        let custodian = self.steward.custodian();

        let response = match request {
            Request::SetWeight { principal, weight } => {
                let previous = registry.set_weight(&principal, weight, caller).await?;
                Response::WeightSet { principal, weight, previous }
            }
            Request::GetWeight { principal } => {
                let weight = registry.get_weight(&principal).await;
                Response::Weight { principal, weight }
            }
            Request::ListWeights => Response::Weights(registry.weights().await),

            Request::CreateProposal { title, description } => {
                let proposal_id = ledger.create_proposal(title, description, caller).await?;
                Response::ProposalCreated { proposal_id }
            }
            Request::CastVote { proposal_id, choice } => {
                Response::VoteCast(ledger.cast_vote(proposal_id, choice, caller).await?)
            }
            Request::ExecuteProposal { proposal_id } => {
                Response::Executed(ledger.execute_proposal(proposal_id, caller).await?)
            }
            Request::GetProposal { proposal_id } => {
                Response::Proposal(ledger.get_proposal(proposal_id).await?)
            }
            Request::HasVoted { proposal_id, principal } => {
                let voted = ledger.has_voted(proposal_id, &principal).await?;
                Response::HasVoted { proposal_id, principal, voted }
            }
            Request::ListProposals => Response::Proposals(ledger.list_proposals().await),
            Request::ListVotes { proposal_id } => {
                Response::Votes(ledger.votes_for(proposal_id).await?)
            }
            Request::Outcome { proposal_id } => {
                Response::Outcome(ledger.outcome(proposal_id).await?)
            }
            Request::Policy => Response::Policy {
                quorum: ledger.quorum(),
                voting_period: ledger.voting_period(),
            },

            Request::Deposit { amount } => Response::Balance {
                balance: custodian.deposit(amount, caller).await?,
            },
            Request::Transfer { to, amount } => {
                Response::Transferred(custodian.transfer(&to, amount, caller).await?)
            }
            Request::CastVoteProxy { ledger: name, proposal_id, choice } => {
                let target = self.steward.voting_ledger(&name)?;
                let vote = custodian
                    .cast_vote_proxy(target.as_ref(), proposal_id, choice, caller)
                    .await?;
                Response::VoteProxied(vote)
            }
            Request::UpdateSpendLimit { limit } => {
                let previous = custodian.update_spend_limit(limit, caller).await?;
                Response::SpendLimitUpdated { previous, limit }
            }
            Request::Pause => {
                custodian.pause(caller).await?;
                Response::Paused { paused: true }
            }
            Request::Unpause => {
                custodian.unpause(caller).await?;
                Response::Paused { paused: false }
            }
            Request::RemainingDailyAllowance => Response::Allowance {
                remaining: custodian.remaining_daily_allowance().await,
            },
            Request::TreasuryState => Response::TreasuryState(custodian.state().await),
            Request::ProxiedVotes => Response::ProxiedVotes(custodian.proxied_votes().await),

            Request::ReadNotifications { from, limit } => {
                Response::Notifications(self.steward.log().read(from, limit).await?)
            }
        };

        Ok(response)
    }
}
