//! Ordered, append-only notification log
//!
//! Every mutating operation commits its state writes together with one
//! [`NotificationRecord`]. Records are numbered without gaps, persisted next
//! to the state they describe, and fanned out to live subscribers.

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

use crate::clock::Timestamp;
use crate::storage::{JsonStorage, Storage, StorageResult, WriteBatch};
use crate::types::{Amount, PrincipalId, ProposalId, VoteChoice, Weight};

const LOG_PATH: &str = "notifications";
const SUBSCRIBER_CAPACITY: usize = 256;

/// What happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    WeightSet {
        principal: PrincipalId,
        weight: Weight,
        previous: Weight,
    },
    ProposalCreated {
        proposal_id: ProposalId,
        proposer: PrincipalId,
        title: String,
        deadline: Timestamp,
    },
    VoteCast {
        proposal_id: ProposalId,
        voter: PrincipalId,
        choice: VoteChoice,
        weight: Weight,
    },
    ProposalExecuted {
        proposal_id: ProposalId,
        executor: PrincipalId,
        votes_for: Weight,
        votes_against: Weight,
        votes_abstain: Weight,
    },
    Deposit {
        from: PrincipalId,
        amount: Amount,
        balance: Amount,
    },
    Transfer {
        to: PrincipalId,
        amount: Amount,
        spent_today: Amount,
        balance: Amount,
    },
    VoteProxied {
        ledger: String,
        proposal_id: ProposalId,
        choice: VoteChoice,
        voter: PrincipalId,
    },
    SpendLimitUpdated {
        previous: Amount,
        limit: Amount,
    },
    Paused {
        by: PrincipalId,
    },
    Unpaused {
        by: PrincipalId,
    },
}

impl Notification {
    /// Short event name, as used in the serialized `type` tag
    pub fn name(&self) -> &'static str {
        match self {
            Notification::WeightSet { .. } => "weight_set",
            Notification::ProposalCreated { .. } => "proposal_created",
            Notification::VoteCast { .. } => "vote_cast",
            Notification::ProposalExecuted { .. } => "proposal_executed",
            Notification::Deposit { .. } => "deposit",
            Notification::Transfer { .. } => "transfer",
            Notification::VoteProxied { .. } => "vote_proxied",
            Notification::SpendLimitUpdated { .. } => "spend_limit_updated",
            Notification::Paused { .. } => "paused",
            Notification::Unpaused { .. } => "unpaused",
        }
    }
}

/// A notification with its position in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Position in the log, starting at 0 with no gaps
    pub sequence: u64,
    /// Clock reading of the operation that produced it
    pub timestamp: Timestamp,
    #[serde(flatten)]
    pub notification: Notification,
}

/// The shared log all components append to
pub struct NotificationLog {
    storage: Arc<dyn Storage>,
    /// Next sequence number; held while committing so records stay ordered
    next_sequence: Mutex<u64>,
    sender: broadcast::Sender<NotificationRecord>,
}

impl NotificationLog {
    /// Open the log stored in `storage`, continuing after the last record
    pub async fn open(storage: Arc<dyn Storage>) -> StorageResult<Self> {
        let keys = storage.list(&format!("{}/", LOG_PATH)).await?;
        let next_sequence = keys
            .iter()
            .filter_map(|key| key.rsplit('/').next()?.parse::<u64>().ok())
            .max()
            .map(|last| last + 1)
            .unwrap_or(0);

        info!("Opened notification log at sequence {}", next_sequence);

        let (sender, _) = broadcast::channel(SUBSCRIBER_CAPACITY);
        Ok(Self {
            storage,
            next_sequence: Mutex::new(next_sequence),
            sender,
        })
    }

    fn key(sequence: u64) -> String {
        format!("{}/{:020}", LOG_PATH, sequence)
    }

    /// Persist `batch` and the notification as one write.
    ///
    /// If the write fails nothing is recorded and the sequence number is not
    /// consumed.
    pub async fn commit(
        &self,
        mut batch: WriteBatch,
        timestamp: Timestamp,
        notification: Notification,
    ) -> StorageResult<NotificationRecord> {
        let mut next = self.next_sequence.lock().await;

        let record = NotificationRecord {
            sequence: *next,
            timestamp,
            notification,
        };
        batch.put_json(Self::key(record.sequence), &record)?;
        self.storage.put_batch(batch).await?;
        *next += 1;
        drop(next);

        debug!(
            sequence = record.sequence,
            event = record.notification.name(),
            "Notification committed"
        );

        // Err only means nobody is subscribed right now
        let _ = self.sender.send(record.clone());
        Ok(record)
    }

    /// Read up to `limit` records starting at `from`
    pub async fn read(&self, from: u64, limit: usize) -> StorageResult<Vec<NotificationRecord>> {
        let end = *self.next_sequence.lock().await;
        let mut records = Vec::new();

        for sequence in from..end {
            if records.len() >= limit {
                break;
            }
            records.push(self.storage.get_json(&Self::key(sequence)).await?);
        }

        Ok(records)
    }

    /// Number of records in the log
    pub async fn len(&self) -> u64 {
        *self.next_sequence.lock().await
    }

    /// Receive records committed from now on
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationRecord> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn paused(by: &str) -> Notification {
        Notification::Paused { by: PrincipalId::new(by) }
    }

    #[tokio::test]
    async fn test_sequence_is_gap_free_and_resumes() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());

        let log = NotificationLog::open(storage.clone()).await.unwrap();
        for i in 0..3 {
            let record = log.commit(WriteBatch::new(), 10 + i, paused("ops")).await.unwrap();
            assert_eq!(record.sequence, i);
        }
        drop(log);

        let log = NotificationLog::open(storage).await.unwrap();
        assert_eq!(log.len().await, 3);
        let record = log.commit(WriteBatch::new(), 20, paused("ops")).await.unwrap();
        assert_eq!(record.sequence, 3);

        let records = log.read(1, 2).await.unwrap();
        assert_eq!(records.iter().map(|r| r.sequence).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_commit_writes_state_and_notifies_subscribers() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let log = NotificationLog::open(storage.clone()).await.unwrap();
        let mut receiver = log.subscribe();

        let mut batch = WriteBatch::new();
        batch.put_json("treasury/state", &7u64).unwrap();
        log.commit(batch, 99, paused("ops")).await.unwrap();

        let state: u64 = storage.get_json("treasury/state").await.unwrap();
        assert_eq!(state, 7);

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.timestamp, 99);
        assert_eq!(received.notification.name(), "paused");
    }

    #[test]
    fn test_record_serialization_is_flat() {
        let record = NotificationRecord {
            sequence: 4,
            timestamp: 1,
            notification: Notification::SpendLimitUpdated { previous: 10, limit: 20 },
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "spend_limit_updated");
        assert_eq!(json["limit"], 20);
        assert_eq!(json["sequence"], 4);
    }
}
