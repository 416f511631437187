//! Steward - weighted proposal governance and an agent-operated treasury
//!
//! [`Steward`] is the context object built once at start-up. It owns the
//! storage backend, the notification log, the access registry, the proposal
//! ledger and the treasury custodian, and hands them the role table taken from
//! configuration.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use steward_config::{ConfigError, RolesConfig, StewardConfig};
use steward_core::{
    Clock, ErrorKind, FileStorage, NotificationLog, Role, RoleTable, Storage, StorageError,
    StorageOptions, SystemClock,
};
use steward_governance::{
    AccessRegistry, GovernanceError, GovernancePolicy, ProposalLedger, VotingLedger,
};
use steward_treasury::{DirectDisburser, Disburser, TreasuryCustodian, TreasuryError};

pub mod feed;
pub mod service;

pub use service::{Request, Response, StewardService};

/// Errors surfaced by the Steward context and service
#[derive(Error, Debug)]
pub enum StewardError {
    #[error("Governance error: {0}")]
    Governance(#[from] GovernanceError),

    #[error("Treasury error: {0}")]
    Treasury(#[from] TreasuryError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown ledger: {0}")]
    UnknownLedger(String),
}

impl StewardError {
    /// The error class this failure belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            StewardError::Governance(e) => e.kind(),
            StewardError::Treasury(e) => e.kind(),
            StewardError::UnknownLedger(_) => ErrorKind::State,
            StewardError::Storage(_) | StewardError::Config(_) => ErrorKind::Internal,
        }
    }
}

pub type StewardResult<T> = Result<T, StewardError>;

/// Build the role table described by `roles`
pub fn role_table(roles: &RolesConfig) -> RoleTable {
    RoleTable::new()
        .with(Role::Admin, roles.admin.clone())
        .with(Role::Governance, roles.governance.clone())
        .with(Role::Agent, roles.agent.clone())
        .with(Role::EmergencyAdmin, roles.emergency_admin.clone())
}

pub struct Steward {
    config: StewardConfig,
    roles: Arc<RoleTable>,
    log: Arc<NotificationLog>,
    registry: Arc<AccessRegistry>,
    ledger: Arc<ProposalLedger>,
    custodian: Arc<TreasuryCustodian>,
    /// Ledgers the custodian can proxy votes into, by name
    ledgers: HashMap<String, Arc<dyn VotingLedger>>,
}

impl Steward {
    /// Open file-backed state under `config.data_dir` with the wall clock
    pub async fn open(config: StewardConfig) -> StewardResult<Self> {
        let options = StorageOptions {
            sync_write: config.sync_writes,
            ..StorageOptions::default()
        };
        let storage: Arc<dyn Storage> =
            Arc::new(FileStorage::new(&config.data_dir).await?.with_options(options));
        let disburser =
            DirectDisburser::new().with_blocked(config.treasury.blocked_recipients.iter().cloned());

        Self::with_parts(config, storage, Arc::new(SystemClock), Arc::new(disburser)).await
    }

    /// Assemble a context from explicit parts
    pub async fn with_parts(
        config: StewardConfig,
        storage: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
        disburser: Arc<dyn Disburser>,
    ) -> StewardResult<Self> {
        config.validate()?;

        let roles = Arc::new(role_table(&config.roles));
        let log = Arc::new(NotificationLog::open(storage.clone()).await?);

        let registry = Arc::new(
            AccessRegistry::new(roles.clone(), storage.clone(), log.clone(), clock.clone()).await?,
        );

        let policy = GovernancePolicy::new(
            config.governance.quorum,
            config.governance.voting_period_secs,
        );
        let ledger = Arc::new(
            ProposalLedger::new(
                config.governance.ledger_name.clone(),
                policy,
                registry.clone(),
                storage.clone(),
                log.clone(),
                clock.clone(),
            )
            .await?,
        );

        let custodian = Arc::new(
            TreasuryCustodian::new(
                config.treasury.principal.clone(),
                config.treasury.daily_spend_limit,
                roles.clone(),
                disburser,
                storage,
                log.clone(),
                clock.clone(),
            )
            .await?,
        );

        let mut ledgers: HashMap<String, Arc<dyn VotingLedger>> = HashMap::new();
        ledgers.insert(ledger.name().to_string(), ledger.clone());

        info!(
            ledger = ledger.name(),
            treasury = %custodian.principal(),
            "Steward {} ready",
            steward_core::VERSION
        );

        Ok(Self {
            config,
            roles,
            log,
            registry,
            ledger,
            custodian,
            ledgers,
        })
    }

    /// Make another ledger reachable as a vote-proxy target.
    ///
    /// A [`ProposalLedger`] opened on the same storage must use its own name.
    pub fn register_ledger(&mut self, ledger: Arc<dyn VotingLedger>) {
        info!(ledger = ledger.name(), "Registered proxy target");
        self.ledgers.insert(ledger.name().to_string(), ledger);
    }

    /// Look up a proxy target by name
    pub fn voting_ledger(&self, name: &str) -> StewardResult<Arc<dyn VotingLedger>> {
        self.ledgers
            .get(name)
            .cloned()
            .ok_or_else(|| StewardError::UnknownLedger(name.to_string()))
    }

    pub fn config(&self) -> &StewardConfig {
        &self.config
    }

    pub fn roles(&self) -> &RoleTable {
        &self.roles
    }

    pub fn log(&self) -> &Arc<NotificationLog> {
        &self.log
    }

    pub fn registry(&self) -> &Arc<AccessRegistry> {
        &self.registry
    }

    pub fn ledger(&self) -> &Arc<ProposalLedger> {
        &self.ledger
    }

    pub fn custodian(&self) -> &Arc<TreasuryCustodian> {
        &self.custodian
    }
}
