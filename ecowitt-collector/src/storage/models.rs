use ecowitt_core::WeatherObservation;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObservationId(pub Ulid);

/// observation with storage metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObservation {
    pub id: ObservationId,
    /// when the collector accepted the report, as opposed to the station clock.
    pub received_at: jiff::Timestamp,
    pub observation: WeatherObservation,
}

impl StoredObservation {
    pub fn new(observation: WeatherObservation) -> Self {
        Self {
            id: ObservationId(Ulid::new()),
            received_at: jiff::Timestamp::now(),
            observation,
        }
    }
}
