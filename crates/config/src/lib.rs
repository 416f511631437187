use std::env;
use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur in configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidEnvVar(String, String),

    #[error("Failed to read file: {0}")]
    FileReadError(String),

    #[error("Failed to parse YAML: {0}")]
    YamlParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Principals holding each privileged role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolesConfig {
    #[serde(default = "default_admin")]
    pub admin: String,
    #[serde(default = "default_governance")]
    pub governance: String,
    #[serde(default = "default_agent")]
    pub agent: String,
    #[serde(default = "default_emergency_admin")]
    pub emergency_admin: String,
}

fn default_admin() -> String {
    "admin".to_string()
}

fn default_governance() -> String {
    "governance".to_string()
}

fn default_agent() -> String {
    "agent".to_string()
}

fn default_emergency_admin() -> String {
    "emergency-admin".to_string()
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            admin: default_admin(),
            governance: default_governance(),
            agent: default_agent(),
            emergency_admin: default_emergency_admin(),
        }
    }
}

/// Proposal ledger policy, fixed once the ledger is first initialized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Minimum total weighted votes for execution
    #[serde(default = "default_quorum")]
    pub quorum: u64,
    /// Seconds between proposal creation and its voting deadline
    #[serde(default = "default_voting_period")]
    pub voting_period_secs: u64,
    /// Name under which the ledger is reachable as a vote-proxy target
    #[serde(default = "default_ledger_name")]
    pub ledger_name: String,
}

fn default_quorum() -> u64 {
    100
}

fn default_voting_period() -> u64 {
    7 * 24 * 60 * 60
}

fn default_ledger_name() -> String {
    "governance".to_string()
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            quorum: default_quorum(),
            voting_period_secs: default_voting_period(),
            ledger_name: default_ledger_name(),
        }
    }
}

/// Treasury custodian settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryConfig {
    /// Daily spend limit used when the custodian is first initialized
    #[serde(default = "default_daily_spend_limit")]
    pub daily_spend_limit: u64,
    /// Identity the custodian votes under when proxying for the agent
    #[serde(default = "default_treasury_principal")]
    pub principal: String,
    /// Recipients the disbursement sink refuses to pay
    #[serde(default)]
    pub blocked_recipients: Vec<String>,
}

fn default_daily_spend_limit() -> u64 {
    1_000
}

fn default_treasury_principal() -> String {
    "treasury".to_string()
}

impl Default for TreasuryConfig {
    fn default() -> Self {
        Self {
            daily_spend_limit: default_daily_spend_limit(),
            principal: default_treasury_principal(),
            blocked_recipients: Vec::new(),
        }
    }
}

/// Main Steward configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StewardConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// fsync every file written under `data_dir`
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,
    #[serde(default)]
    pub roles: RolesConfig,
    #[serde(default)]
    pub governance: GovernanceConfig,
    #[serde(default)]
    pub treasury: TreasuryConfig,
}

fn default_data_dir() -> String {
    "./steward-data".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sync_writes() -> bool {
    true
}

impl Default for StewardConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            sync_writes: default_sync_writes(),
            roles: RolesConfig::default(),
            governance: GovernanceConfig::default(),
            treasury: TreasuryConfig::default(),
        }
    }
}

impl StewardConfig {
    /// Load configuration from environment variables.
    ///
    /// If `STEWARD_CONFIG_FILE` names an existing file it is loaded first;
    /// individual `STEWARD_*` variables then override single values.
    pub fn from_env() -> Result<Self> {
        let mut config = match env::var("STEWARD_CONFIG_FILE") {
            Ok(path) if Path::new(&path).exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        if let Ok(data_dir) = env::var("STEWARD_DATA_DIR") {
            config.data_dir = data_dir;
        }
        if let Ok(log_level) = env::var("STEWARD_LOG_LEVEL") {
            config.log_level = log_level;
        }
        if let Ok(admin) = env::var("STEWARD_ADMIN") {
            config.roles.admin = admin;
        }
        if let Ok(governance) = env::var("STEWARD_GOVERNANCE") {
            config.roles.governance = governance;
        }
        if let Ok(agent) = env::var("STEWARD_AGENT") {
            config.roles.agent = agent;
        }
        if let Ok(emergency_admin) = env::var("STEWARD_EMERGENCY_ADMIN") {
            config.roles.emergency_admin = emergency_admin;
        }
        if let Some(quorum) = parse_env_u64("STEWARD_QUORUM")? {
            config.governance.quorum = quorum;
        }
        if let Some(period) = parse_env_u64("STEWARD_VOTING_PERIOD_SECS")? {
            config.governance.voting_period_secs = period;
        }
        if let Some(limit) = parse_env_u64("STEWARD_DAILY_SPEND_LIMIT")? {
            config.treasury.daily_spend_limit = limit;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileReadError(format!("Failed to read {}: {}", path.display(), e)))?;

        let config: StewardConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Check values that serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        let roles = [
            ("admin", &self.roles.admin),
            ("governance", &self.roles.governance),
            ("agent", &self.roles.agent),
            ("emergency_admin", &self.roles.emergency_admin),
            ("treasury.principal", &self.treasury.principal),
        ];
        for (name, principal) in roles {
            if principal.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} principal must not be empty", name)));
            }
        }

        if self.governance.voting_period_secs == 0 {
            return Err(ConfigError::Invalid("voting_period_secs must be positive".to_string()));
        }

        if self.governance.ledger_name.trim().is_empty() {
            return Err(ConfigError::Invalid("ledger_name must not be empty".to_string()));
        }

        Ok(())
    }
}

fn parse_env_u64(name: &str) -> Result<Option<u64>> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string())),
        Err(_) => Ok(None),
    }
}
