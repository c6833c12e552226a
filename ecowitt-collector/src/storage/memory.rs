use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::storage::{ObservationStorage, StoredObservation};

#[derive(Debug, Error)]
pub enum MemoryStorageError {
    #[error("duplicate observation id {0}")]
    Duplicate(ulid::Ulid),
}

/// In memory storage implementation.
/// Used by the tests and by `backend = { type = "memory" }`; nothing
/// survives a restart.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    observations: Arc<RwLock<Vec<StoredObservation>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything stored so far, oldest first.
    pub async fn all(&self) -> Vec<StoredObservation> {
        self.observations.read().await.clone()
    }
}

#[async_trait]
impl ObservationStorage for MemoryStorage {
    type Error = MemoryStorageError;

    async fn store(&self, entry: StoredObservation) -> Result<(), Self::Error> {
        let mut observations = self.observations.write().await;

        if observations.iter().any(|o| o.id == entry.id) {
            return Err(MemoryStorageError::Duplicate(entry.id.0));
        }

        observations.push(entry);
        Ok(())
    }

    async fn latest(&self) -> Result<Option<StoredObservation>, Self::Error> {
        let observations = self.observations.read().await;
        // max_by_key keeps the last of equal elements, so ties go to the
        // most recently stored entry.
        Ok(observations.iter().max_by_key(|o| o.received_at).cloned())
    }

    async fn count(&self) -> Result<usize, Self::Error> {
        Ok(self.observations.read().await.len())
    }
}
