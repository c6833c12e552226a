use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ecowitt_core::FormValues;
use tracing::{Instrument, error, info, info_span, warn};

use crate::storage::{ObservationStorage, StoredObservation};

use super::ApiState;

/// Accept one station report.
///
/// POST /data/report/ (path is configurable)
///
/// The form body is read first, then the query string, so a key sent in
/// both places takes its value from the body.
pub async fn ingest_report<S>(
    State(state): State<ApiState<S>>,
    ConnectInfo(client): ConnectInfo<SocketAddr>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response
where
    S: ObservationStorage,
{
    let mut form = FormValues::parse(&body);
    if let Some(query) = query {
        form.extend_from_encoded(query.as_bytes());
    }

    ingest(state, form)
        .instrument(info_span!("report", %client))
        .await
}

async fn ingest<S>(state: ApiState<S>, form: FormValues) -> Response
where
    S: ObservationStorage,
{
    let raw = match state.decoder.decode(&form) {
        Ok(raw) => raw,
        Err(e) => {
            for field_error in e.errors() {
                warn!(field = field_error.key(), error = %field_error, "rejected report field");
            }
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let observation = state.normalizer.normalize(raw);

    // corrected directions are in [0, 360); the compass point is only logged.
    let compass = match observation.compass_point() {
        Ok(point) => point.map(|p| p.abbreviation()),
        Err(e) => {
            error!(error = %e, "wind direction out of range after correction");
            None
        }
    };

    let station_type = observation.station_type.clone();
    let temperature = observation.temperature_outdoor.map(|t| t.0);
    let entry = StoredObservation::new(observation);
    let id = entry.id;

    match tokio::time::timeout(state.write_timeout, state.storage.store(entry)).await {
        Ok(Ok(())) => {
            info!(
                id = %id.0,
                station_type = station_type.as_deref(),
                temperature_outdoor = temperature,
                wind = compass,
                "observation stored"
            );
            (StatusCode::OK, "OK").into_response()
        }
        Ok(Err(e)) => {
            error!(error = ?e, "failed to store observation");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to store observation",
            )
                .into_response()
        }
        Err(_) => {
            error!(timeout = ?state.write_timeout, "timed out storing observation");
            (StatusCode::GATEWAY_TIMEOUT, "Timed out storing observation").into_response()
        }
    }
}
