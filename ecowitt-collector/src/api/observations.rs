use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::storage::ObservationStorage;

use super::ApiState;

/// Get the most recently received observation.
///
/// GET /api/observations/latest
pub async fn latest_observation<S>(State(state): State<ApiState<S>>) -> impl IntoResponse
where
    S: ObservationStorage,
{
    match state.storage.latest().await {
        Ok(Some(entry)) => (StatusCode::OK, Json(entry)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "No observations stored").into_response(),
        Err(e) => {
            tracing::error!(error = ?e, "Failed to fetch latest observation");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch latest observation",
            )
                .into_response()
        }
    }
}
