//! Proposal ledger
//!
//! Owns proposals, their tallies and the per-(proposal, principal) vote
//! records. Every mutating call holds the ledger lock for its whole duration
//! and commits its writes together with a notification; in-memory state is
//! only updated after that commit succeeds.
//!
//! Each ledger keeps its keys under `ledgers/<name>/`, so several ledgers can
//! share one storage backend.

use std::collections::BTreeMap;
use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use steward_core::{
    key_segment, Clock, JsonStorage, Notification, NotificationLog, PrincipalId, ProposalId,
    Storage, Timestamp, VoteChoice, WriteBatch,
};

use crate::{
    AccessRegistry, GovernanceError, GovernancePolicy, GovernanceResult, Proposal, Tally,
    VoteRecord, VotingLedger, VotingResult,
};

/// Path constants for storage, relative to the ledger's own prefix
const LEDGERS_PATH: &str = "ledgers";
const POLICY_PATH: &str = "policy";
const COUNTER_PATH: &str = "next_proposal_id";
const PROPOSALS_PATH: &str = "proposals";
const VOTES_PATH: &str = "votes";

#[derive(Default)]
struct LedgerState {
    next_id: ProposalId,
    proposals: BTreeMap<ProposalId, Proposal>,
    votes: BTreeMap<(ProposalId, PrincipalId), VoteRecord>,
}

pub struct ProposalLedger {
    name: String,
    prefix: String,
    policy: GovernancePolicy,
    registry: Arc<AccessRegistry>,
    log: Arc<NotificationLog>,
    clock: Arc<dyn Clock>,
    state: Mutex<LedgerState>,
}

impl ProposalLedger {
    /// Open the ledger stored in `storage`.
    ///
    /// `policy` is recorded the first time a ledger is opened. Afterwards the
    /// recorded policy wins; quorum and voting period never change.
    pub async fn new(
        name: impl Into<String>,
        policy: GovernancePolicy,
        registry: Arc<AccessRegistry>,
        storage: Arc<dyn Storage>,
        log: Arc<NotificationLog>,
        clock: Arc<dyn Clock>,
    ) -> GovernanceResult<Self> {
        let name = name.into();
        let prefix = format!("{}/{}", LEDGERS_PATH, key_segment(&name));
        let policy = Self::load_policy(storage.as_ref(), &prefix, policy).await?;
        let state = Self::load_state(storage.as_ref(), &prefix).await?;

        info!(
            ledger = %name,
            quorum = policy.quorum,
            voting_period = policy.voting_period,
            "Loaded {} proposals and {} votes",
            state.proposals.len(),
            state.votes.len()
        );

        Ok(Self {
            name,
            prefix,
            policy,
            registry,
            log,
            clock,
            state: Mutex::new(state),
        })
    }

    async fn load_policy(
        storage: &dyn Storage,
        prefix: &str,
        configured: GovernancePolicy,
    ) -> GovernanceResult<GovernancePolicy> {
        let key = format!("{}/{}", prefix, POLICY_PATH);
        match storage.get_json_opt::<GovernancePolicy>(&key).await? {
            Some(stored) => {
                if stored != configured {
                    warn!(
                        "Ignoring configured policy {:?}; ledger was initialized with {:?}",
                        configured, stored
                    );
                }
                Ok(stored)
            }
            None => {
                storage.put_json(&key, &configured).await?;
                Ok(configured)
            }
        }
    }

    async fn load_state(storage: &dyn Storage, prefix: &str) -> GovernanceResult<LedgerState> {
        let mut state = LedgerState::default();

        for key in storage.list(&format!("{}/{}/", prefix, PROPOSALS_PATH)).await? {
            let proposal: Proposal = storage.get_json(&key).await?;
            state.proposals.insert(proposal.id, proposal);
        }

        for key in storage.list(&format!("{}/{}/", prefix, VOTES_PATH)).await? {
            let record: VoteRecord = storage.get_json(&key).await?;
            state.votes.insert((record.proposal_id, record.voter.clone()), record);
        }

        let stored_counter = storage
            .get_json_opt::<ProposalId>(&format!("{}/{}", prefix, COUNTER_PATH))
            .await?;
        let after_last = state.proposals.keys().next_back().map(|id| id + 1).unwrap_or(0);
        state.next_id = stored_counter.unwrap_or(0).max(after_last);

        Ok(state)
    }

    fn proposal_key(&self, id: ProposalId) -> String {
        format!("{}/{}/{}", self.prefix, PROPOSALS_PATH, id)
    }

    fn vote_key(&self, id: ProposalId, voter: &PrincipalId) -> String {
        format!("{}/{}/{}/{}", self.prefix, VOTES_PATH, id, key_segment(voter.as_str()))
    }

    fn counter_key(&self) -> String {
        format!("{}/{}", self.prefix, COUNTER_PATH)
    }

    /// Ledger name, used to address it as a vote-proxy target
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quorum(&self) -> u64 {
        self.policy.quorum
    }

    pub fn voting_period(&self) -> u64 {
        self.policy.voting_period
    }

    /// Open a proposal. The caller must hold nonzero voting weight.
    pub async fn create_proposal(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
        caller: &PrincipalId,
    ) -> GovernanceResult<ProposalId> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();

        if self.registry.get_weight(caller).await == 0 {
            warn!("{} attempted to create a proposal without voting power", caller);
            return Err(GovernanceError::NoVotingPower(caller.clone()));
        }

        let id = state.next_id;
        let proposal = Proposal {
            id,
            title: title.into(),
            description: description.into(),
            proposer: caller.clone(),
            created_at: now,
            deadline: now.saturating_add(self.policy.voting_period),
            tally: Tally::default(),
            executed: false,
        };

        let mut batch = WriteBatch::new();
        batch.put_json(self.proposal_key(id), &proposal)?;
        batch.put_json(self.counter_key(), &(id + 1))?;
        self.log
            .commit(
                batch,
                now,
                Notification::ProposalCreated {
                    proposal_id: id,
                    proposer: caller.clone(),
                    title: proposal.title.clone(),
                    deadline: proposal.deadline,
                },
            )
            .await?;

        info!(proposal_id = id, proposer = %caller, deadline = proposal.deadline, "Proposal created");
        state.proposals.insert(id, proposal);
        state.next_id = id + 1;
        Ok(id)
    }

    /// Record a weighted vote. The caller's current weight is snapshotted.
    pub async fn cast_vote(
        &self,
        proposal_id: ProposalId,
        choice: VoteChoice,
        caller: &PrincipalId,
    ) -> GovernanceResult<VoteRecord> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();

        let proposal = state
            .proposals
            .get(&proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))?;

        if proposal.executed {
            return Err(GovernanceError::AlreadyExecuted(proposal_id));
        }

        if now >= proposal.deadline {
            return Err(GovernanceError::VotingClosed {
                proposal_id,
                deadline: proposal.deadline,
            });
        }

        if state.votes.contains_key(&(proposal_id, caller.clone())) {
            return Err(GovernanceError::AlreadyVoted {
                proposal_id,
                voter: caller.clone(),
            });
        }

        let weight = self.registry.get_weight(caller).await;
        if weight == 0 {
            return Err(GovernanceError::NoVotingPower(caller.clone()));
        }

        let mut updated = proposal.clone();
        updated.tally = updated
            .tally
            .with_vote(choice, weight)
            .ok_or(GovernanceError::TallyOverflow(proposal_id))?;

        let record = VoteRecord {
            proposal_id,
            voter: caller.clone(),
            choice,
            weight,
            cast_at: now,
        };

        let mut batch = WriteBatch::new();
        batch.put_json(self.proposal_key(proposal_id), &updated)?;
        batch.put_json(self.vote_key(proposal_id, caller), &record)?;
        self.log
            .commit(
                batch,
                now,
                Notification::VoteCast {
                    proposal_id,
                    voter: caller.clone(),
                    choice,
                    weight,
                },
            )
            .await?;

        info!(proposal_id, voter = %caller, %choice, weight, "Vote cast");
        state.proposals.insert(proposal_id, updated);
        state.votes.insert((proposal_id, caller.clone()), record.clone());
        Ok(record)
    }

    /// Execute a proposal whose voting period is over.
    ///
    /// Succeeds only if quorum is met and votes for exceed votes against.
    /// Any failure is final for that proposal: there is no way to reopen it.
    pub async fn execute_proposal(
        &self,
        proposal_id: ProposalId,
        caller: &PrincipalId,
    ) -> GovernanceResult<VotingResult> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();

        let proposal = state
            .proposals
            .get(&proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))?;

        let result = match self.check_execution(proposal, now) {
            Ok(result) => result,
            Err(e) => {
                debug!(proposal_id, caller = %caller, "Execution refused: {}", e);
                return Err(e);
            }
        };

        let mut updated = proposal.clone();
        updated.executed = true;

        let mut batch = WriteBatch::new();
        batch.put_json(self.proposal_key(proposal_id), &updated)?;
        self.log
            .commit(
                batch,
                now,
                Notification::ProposalExecuted {
                    proposal_id,
                    executor: caller.clone(),
                    votes_for: result.votes_for,
                    votes_against: result.votes_against,
                    votes_abstain: result.votes_abstain,
                },
            )
            .await?;

        info!(proposal_id, executor = %caller, total = result.total_votes, "Proposal executed");
        state.proposals.insert(proposal_id, updated);
        Ok(result)
    }

    /// What `execute_proposal` would do right now, without doing it
    pub async fn outcome(&self, proposal_id: ProposalId) -> GovernanceResult<VotingResult> {
        let state = self.state.lock().await;
        let proposal = state
            .proposals
            .get(&proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))?;
        self.check_execution(proposal, self.clock.now())
    }

    fn check_execution(&self, proposal: &Proposal, now: Timestamp) -> GovernanceResult<VotingResult> {
        if proposal.executed {
            return Err(GovernanceError::AlreadyExecuted(proposal.id));
        }

        if now < proposal.deadline {
            return Err(GovernanceError::VotingOpen {
                proposal_id: proposal.id,
                deadline: proposal.deadline,
            });
        }

        let result = self.policy.evaluate(&proposal.tally);

        if !result.has_quorum {
            return Err(GovernanceError::QuorumNotMet {
                required: result.quorum,
                actual: result.total_votes,
            });
        }

        if !result.approved {
            return Err(GovernanceError::Rejected {
                votes_for: result.votes_for,
                votes_against: result.votes_against,
            });
        }

        Ok(result)
    }

    pub async fn get_proposal(&self, proposal_id: ProposalId) -> GovernanceResult<Proposal> {
        self.state
            .lock()
            .await
            .proposals
            .get(&proposal_id)
            .cloned()
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))
    }

    pub async fn has_voted(&self, proposal_id: ProposalId, principal: &PrincipalId) -> GovernanceResult<bool> {
        let state = self.state.lock().await;
        if !state.proposals.contains_key(&proposal_id) {
            return Err(GovernanceError::ProposalNotFound(proposal_id));
        }
        Ok(state.votes.contains_key(&(proposal_id, principal.clone())))
    }

    /// Vote records of one proposal, ordered by voter
    pub async fn votes_for(&self, proposal_id: ProposalId) -> GovernanceResult<Vec<VoteRecord>> {
        let state = self.state.lock().await;
        if !state.proposals.contains_key(&proposal_id) {
            return Err(GovernanceError::ProposalNotFound(proposal_id));
        }

        Ok(state
            .votes
            .range((proposal_id, PrincipalId::new(""))..)
            .take_while(|((id, _), _)| *id == proposal_id)
            .map(|(_, record)| record.clone())
            .collect())
    }

    /// Number of proposals ever created
    pub async fn proposal_count(&self) -> u64 {
        self.state.lock().await.next_id
    }

    /// Every proposal, ordered by id
    pub async fn list_proposals(&self) -> Vec<Proposal> {
        self.state.lock().await.proposals.values().cloned().collect()
    }
}

#[async_trait]
impl VotingLedger for ProposalLedger {
    fn name(&self) -> &str {
        &self.name
    }

    async fn cast_vote(
        &self,
        proposal_id: ProposalId,
        choice: VoteChoice,
        caller: &PrincipalId,
    ) -> GovernanceResult<()> {
        ProposalLedger::cast_vote(self, proposal_id, choice, caller)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steward_core::{ErrorKind, ManualClock, MemoryStorage, Role, RoleTable};

    const START: Timestamp = 1_700_000_000;
    const PERIOD: u64 = 3_600;

    struct Fixture {
        clock: Arc<ManualClock>,
        log: Arc<NotificationLog>,
        registry: Arc<AccessRegistry>,
        ledger: ProposalLedger,
    }

    async fn setup(storage: Arc<dyn Storage>, quorum: u64, weights: &[(&str, u64)]) -> Fixture {
        let clock = Arc::new(ManualClock::new(START));
        let authority = Arc::new(RoleTable::new().with(Role::Admin, "admin"));
        let log = Arc::new(NotificationLog::open(storage.clone()).await.unwrap());
        let registry = Arc::new(
            AccessRegistry::new(authority, storage.clone(), log.clone(), clock.clone())
                .await
                .unwrap(),
        );
        for (principal, weight) in weights {
            registry
                .set_weight(&PrincipalId::new(*principal), *weight, &"admin".into())
                .await
                .unwrap();
        }
        let ledger = ProposalLedger::new(
            "governance",
            GovernancePolicy::new(quorum, PERIOD),
            registry.clone(),
            storage,
            log.clone(),
            clock.clone(),
        )
        .await
        .unwrap();

        Fixture { clock, log, registry, ledger }
    }

    fn p(id: &str) -> PrincipalId {
        PrincipalId::new(id)
    }

    #[tokio::test]
    async fn test_create_proposal_assigns_sequential_ids() {
        let f = setup(Arc::new(MemoryStorage::new()), 100, &[("alice", 10)]).await;

        let first = f.ledger.create_proposal("One", "first", &p("alice")).await.unwrap();
        let second = f.ledger.create_proposal("Two", "second", &p("alice")).await.unwrap();
        assert_eq!((first, second), (0, 1));
        assert_eq!(f.ledger.proposal_count().await, 2);

        let proposal = f.ledger.get_proposal(first).await.unwrap();
        assert_eq!(proposal.deadline, START + PERIOD);
        assert_eq!(proposal.proposer, p("alice"));
        assert!(!proposal.executed);
    }

    #[tokio::test]
    async fn test_create_requires_weight() {
        let f = setup(Arc::new(MemoryStorage::new()), 100, &[]).await;

        let err = f.ledger.create_proposal("t", "d", &p("mallory")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(f.ledger.proposal_count().await, 0);
    }

    #[tokio::test]
    async fn test_scenario_against_majority_fails_execution() {
        let f = setup(Arc::new(MemoryStorage::new()), 100, &[("a", 50), ("b", 60)]).await;
        let id = f.ledger.create_proposal("t", "d", &p("a")).await.unwrap();

        f.ledger.cast_vote(id, VoteChoice::For, &p("a")).await.unwrap();
        f.ledger.cast_vote(id, VoteChoice::Against, &p("b")).await.unwrap();

        f.clock.advance(PERIOD);
        let err = f.ledger.execute_proposal(id, &p("anyone")).await.unwrap_err();
        assert!(matches!(err, GovernanceError::Rejected { votes_for: 50, votes_against: 60 }));
        assert_eq!(err.kind(), ErrorKind::Policy);
        assert!(!f.ledger.get_proposal(id).await.unwrap().executed);
    }

    #[tokio::test]
    async fn test_scenario_for_majority_executes_once() {
        let f = setup(Arc::new(MemoryStorage::new()), 100, &[("a", 80), ("b", 30)]).await;
        let id = f.ledger.create_proposal("t", "d", &p("a")).await.unwrap();

        f.ledger.cast_vote(id, VoteChoice::For, &p("a")).await.unwrap();
        f.ledger.cast_vote(id, VoteChoice::Against, &p("b")).await.unwrap();

        f.clock.advance(PERIOD);
        let result = f.ledger.execute_proposal(id, &p("b")).await.unwrap();
        assert!(result.approved);
        assert!(f.ledger.get_proposal(id).await.unwrap().executed);

        let err = f.ledger.execute_proposal(id, &p("b")).await.unwrap_err();
        assert!(matches!(err, GovernanceError::AlreadyExecuted(_)));
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[tokio::test]
    async fn test_execute_before_deadline_is_state_error() {
        let f = setup(Arc::new(MemoryStorage::new()), 10, &[("a", 80)]).await;
        let id = f.ledger.create_proposal("t", "d", &p("a")).await.unwrap();
        f.ledger.cast_vote(id, VoteChoice::For, &p("a")).await.unwrap();

        f.clock.advance(PERIOD - 1);
        let err = f.ledger.execute_proposal(id, &p("a")).await.unwrap_err();
        assert!(matches!(err, GovernanceError::VotingOpen { .. }));

        f.clock.advance(1);
        assert!(f.ledger.execute_proposal(id, &p("a")).await.is_ok());
    }

    #[tokio::test]
    async fn test_quorum_not_met_is_policy_violation() {
        let f = setup(Arc::new(MemoryStorage::new()), 100, &[("a", 40), ("b", 20)]).await;
        let id = f.ledger.create_proposal("t", "d", &p("a")).await.unwrap();
        f.ledger.cast_vote(id, VoteChoice::For, &p("a")).await.unwrap();
        f.ledger.cast_vote(id, VoteChoice::Abstain, &p("b")).await.unwrap();

        f.clock.advance(PERIOD);
        let preview = f.ledger.outcome(id).await.unwrap_err();
        assert!(matches!(preview, GovernanceError::QuorumNotMet { required: 100, actual: 60 }));

        let err = f.ledger.execute_proposal(id, &p("a")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Policy);
    }

    #[tokio::test]
    async fn test_second_vote_rejected() {
        let f = setup(Arc::new(MemoryStorage::new()), 100, &[("a", 50)]).await;
        let id = f.ledger.create_proposal("t", "d", &p("a")).await.unwrap();

        f.ledger.cast_vote(id, VoteChoice::For, &p("a")).await.unwrap();
        let err = f.ledger.cast_vote(id, VoteChoice::Against, &p("a")).await.unwrap_err();
        assert!(matches!(err, GovernanceError::AlreadyVoted { .. }));
        assert_eq!(err.kind(), ErrorKind::State);

        let proposal = f.ledger.get_proposal(id).await.unwrap();
        assert_eq!(proposal.tally, Tally { votes_for: 50, votes_against: 0, votes_abstain: 0 });
        assert!(f.ledger.has_voted(id, &p("a")).await.unwrap());
    }

    #[tokio::test]
    async fn test_vote_rules() {
        let f = setup(Arc::new(MemoryStorage::new()), 100, &[("a", 50)]).await;

        let err = f.ledger.cast_vote(9, VoteChoice::For, &p("a")).await.unwrap_err();
        assert!(matches!(err, GovernanceError::ProposalNotFound(9)));

        let id = f.ledger.create_proposal("t", "d", &p("a")).await.unwrap();
        let err = f.ledger.cast_vote(id, VoteChoice::For, &p("nobody")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert!(!f.ledger.has_voted(id, &p("nobody")).await.unwrap());

        f.clock.advance(PERIOD);
        let err = f.ledger.cast_vote(id, VoteChoice::For, &p("a")).await.unwrap_err();
        assert!(matches!(err, GovernanceError::VotingClosed { .. }));
    }

    #[tokio::test]
    async fn test_weight_is_snapshotted_at_vote_time() {
        let f = setup(Arc::new(MemoryStorage::new()), 100, &[("a", 50)]).await;
        let id = f.ledger.create_proposal("t", "d", &p("a")).await.unwrap();
        f.ledger.cast_vote(id, VoteChoice::For, &p("a")).await.unwrap();

        f.registry.set_weight(&p("a"), 500, &p("admin")).await.unwrap();

        let proposal = f.ledger.get_proposal(id).await.unwrap();
        assert_eq!(proposal.tally.votes_for, 50);
        let votes = f.ledger.votes_for(id).await.unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].weight, 50);
    }

    #[tokio::test]
    async fn test_reads_on_unknown_proposal() {
        let f = setup(Arc::new(MemoryStorage::new()), 100, &[]).await;
        assert_eq!(f.ledger.get_proposal(3).await.unwrap_err().kind(), ErrorKind::State);
        assert_eq!(f.ledger.has_voted(3, &p("a")).await.unwrap_err().kind(), ErrorKind::State);
        assert!(f.ledger.votes_for(3).await.is_err());
    }

    #[tokio::test]
    async fn test_votes_for_only_lists_one_proposal() {
        let f = setup(Arc::new(MemoryStorage::new()), 100, &[("a", 5), ("b", 6)]).await;
        let first = f.ledger.create_proposal("one", "d", &p("a")).await.unwrap();
        let second = f.ledger.create_proposal("two", "d", &p("a")).await.unwrap();

        f.ledger.cast_vote(first, VoteChoice::For, &p("b")).await.unwrap();
        f.ledger.cast_vote(second, VoteChoice::Against, &p("a")).await.unwrap();
        f.ledger.cast_vote(second, VoteChoice::Abstain, &p("b")).await.unwrap();

        let voters: Vec<_> = f
            .ledger
            .votes_for(second)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.voter)
            .collect();
        assert_eq!(voters, vec![p("a"), p("b")]);
        assert_eq!(f.ledger.votes_for(first).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_state_reloads_and_policy_is_fixed() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        {
            let f = setup(storage.clone(), 100, &[("a", 80)]).await;
            let id = f.ledger.create_proposal("t", "d", &p("a")).await.unwrap();
            f.ledger.cast_vote(id, VoteChoice::For, &p("a")).await.unwrap();
        }

        // Reopen with a different configured quorum: the stored one stays
        let f = setup(storage, 5, &[]).await;
        assert_eq!(f.ledger.quorum(), 100);
        assert_eq!(f.ledger.proposal_count().await, 1);
        assert!(f.ledger.has_voted(0, &p("a")).await.unwrap());
        assert_eq!(f.ledger.get_proposal(0).await.unwrap().tally.votes_for, 80);

        let next = f.ledger.create_proposal("t2", "d", &p("a")).await.unwrap();
        assert_eq!(next, 1);
    }

    #[tokio::test]
    async fn test_voting_ledger_interface() {
        let f = setup(Arc::new(MemoryStorage::new()), 100, &[("a", 5)]).await;
        let id = f.ledger.create_proposal("t", "d", &p("a")).await.unwrap();

        let handle: &dyn VotingLedger = &f.ledger;
        assert_eq!(handle.name(), "governance");
        handle.cast_vote(id, VoteChoice::Abstain, &p("a")).await.unwrap();
        assert_eq!(f.ledger.get_proposal(id).await.unwrap().tally.votes_abstain, 5);
    }

    #[tokio::test]
    async fn test_ledgers_sharing_storage_stay_separate() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let f = setup(storage.clone(), 100, &[("a", 50), ("org/treasurer", 20)]).await;
        let council = ProposalLedger::new(
            "council",
            GovernancePolicy::new(10, 60),
            f.registry.clone(),
            storage.clone(),
            f.log.clone(),
            f.clock.clone(),
        )
        .await
        .unwrap();

        let main_id = f.ledger.create_proposal("main", "d", &p("a")).await.unwrap();
        let council_id = council.create_proposal("council", "d", &p("a")).await.unwrap();
        assert_eq!((main_id, council_id), (0, 0));
        council
            .cast_vote(council_id, VoteChoice::For, &p("org/treasurer"))
            .await
            .unwrap();

        assert_eq!(council.quorum(), 10);
        assert!(!f.ledger.has_voted(main_id, &p("org/treasurer")).await.unwrap());

        let reopened = ProposalLedger::new(
            "governance",
            GovernancePolicy::new(100, PERIOD),
            f.registry.clone(),
            storage,
            f.log.clone(),
            f.clock.clone(),
        )
        .await
        .unwrap();
        assert_eq!(reopened.quorum(), 100);
        assert_eq!(reopened.proposal_count().await, 1);
        assert_eq!(reopened.get_proposal(main_id).await.unwrap().title, "main");
        assert!(reopened.votes_for(main_id).await.unwrap().is_empty());
    }
}
