//! Access registry
//!
//! Maps principals to voting weight. Only the admin role may change weights.
//! Changes apply to future votes; tallies already recorded keep the weight
//! that was current when each vote was cast.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use steward_core::{
    key_segment, parse_key_segment, Authority, Clock, JsonStorage, Notification, NotificationLog,
    PrincipalId, Role, Storage, Weight, WriteBatch,
};

use crate::{GovernanceError, GovernanceResult};

const WEIGHTS_PATH: &str = "registry/weights";

pub struct AccessRegistry {
    authority: Arc<dyn Authority>,
    log: Arc<NotificationLog>,
    clock: Arc<dyn Clock>,
    weights: Mutex<HashMap<PrincipalId, Weight>>,
}

impl AccessRegistry {
    /// Create a registry, loading any weights already in storage
    pub async fn new(
        authority: Arc<dyn Authority>,
        storage: Arc<dyn Storage>,
        log: Arc<NotificationLog>,
        clock: Arc<dyn Clock>,
    ) -> GovernanceResult<Self> {
        let weights = Self::load_weights(storage.as_ref()).await?;
        info!("Loaded {} weight entries", weights.len());

        Ok(Self {
            authority,
            log,
            clock,
            weights: Mutex::new(weights),
        })
    }

    async fn load_weights(storage: &dyn Storage) -> GovernanceResult<HashMap<PrincipalId, Weight>> {
        let prefix = format!("{}/", WEIGHTS_PATH);
        let mut weights = HashMap::new();

        for key in storage.list(&prefix).await? {
            if let Some(segment) = key.strip_prefix(&prefix) {
                let weight: Weight = storage.get_json(&key).await?;
                weights.insert(PrincipalId::new(parse_key_segment(segment)), weight);
            }
        }

        Ok(weights)
    }

    fn weight_key(principal: &PrincipalId) -> String {
        format!("{}/{}", WEIGHTS_PATH, key_segment(principal.as_str()))
    }

    /// Overwrite the weight of `principal`. Returns the previous weight.
    pub async fn set_weight(
        &self,
        principal: &PrincipalId,
        weight: Weight,
        caller: &PrincipalId,
    ) -> GovernanceResult<Weight> {
        if !self.authority.holds(caller, Role::Admin) {
            warn!("{} attempted to set weight without the admin role", caller);
            return Err(GovernanceError::PermissionDenied(format!(
                "{} does not hold the {} role",
                caller,
                Role::Admin
            )));
        }

        let mut weights = self.weights.lock().await;
        let now = self.clock.now();
        let previous = weights.get(principal).copied().unwrap_or(0);

        let mut batch = WriteBatch::new();
        batch.put_json(Self::weight_key(principal), &weight)?;
        self.log
            .commit(
                batch,
                now,
                Notification::WeightSet {
                    principal: principal.clone(),
                    weight,
                    previous,
                },
            )
            .await?;

        weights.insert(principal.clone(), weight);
        info!(principal = %principal, weight, previous, "Voting weight set");
        Ok(previous)
    }

    /// Voting weight of `principal`; zero when never set
    pub async fn get_weight(&self, principal: &PrincipalId) -> Weight {
        let weight = self.weights.lock().await.get(principal).copied().unwrap_or(0);
        debug!(principal = %principal, weight, "Weight lookup");
        weight
    }

    /// All recorded weights, ordered by principal
    pub async fn weights(&self) -> Vec<(PrincipalId, Weight)> {
        let weights = self.weights.lock().await;
        let mut entries: Vec<_> = weights.iter().map(|(p, w)| (p.clone(), *w)).collect();
        entries.sort();
        entries
    }
}
