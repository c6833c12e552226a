pub mod memory;
pub mod models;
pub mod sqlite;

use async_trait::async_trait;

pub use models::{ObservationId, StoredObservation};

/// Sink for normalized observations. One call to [`store`] writes one row.
///
/// [`store`]: ObservationStorage::store
#[async_trait]
pub trait ObservationStorage: Clone + Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn store(&self, entry: StoredObservation) -> Result<(), Self::Error>;

    /// Most recently received observation.
    async fn latest(&self) -> Result<Option<StoredObservation>, Self::Error>;

    async fn count(&self) -> Result<usize, Self::Error>;
}
