//! Core Steward module
//!
//! Shared building blocks for the governance and treasury components:
//! principal identifiers, error kinds, the clock, role authority, storage and
//! the notification log.

pub mod authority;
pub mod clock;
pub mod error;
pub mod notification;
pub mod storage;
pub mod types;

// Re-export key components
pub use authority::{Authority, Role, RoleTable};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp, SECONDS_PER_DAY};
pub use error::ErrorKind;
pub use notification::{Notification, NotificationLog, NotificationRecord};
pub use storage::{
    key_segment, parse_key_segment, FileStorage, JsonStorage, MemoryStorage, Storage, StorageError,
    StorageOptions, StorageResult, WriteBatch,
};
pub use types::{Amount, PrincipalId, ProposalId, VoteChoice, Weight};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for Steward.
///
/// `RUST_LOG` takes precedence over `default_level`.
pub fn init_tracing(default_level: &str) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}
