pub mod observations;
pub mod report;

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};
use ecowitt_core::{PayloadDecoder, UnitNormalizer};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::storage::ObservationStorage;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState<S>
where
    S: ObservationStorage,
{
    pub decoder: PayloadDecoder,
    pub normalizer: UnitNormalizer,
    pub storage: S,
    /// Upper bound on a single storage write.
    pub write_timeout: Duration,
}

/// Create the full router: the station upload path plus the read API.
pub fn api_router<S>(state: ApiState<S>, report_path: &str) -> Router
where
    S: ObservationStorage,
{
    Router::new()
        .route(report_path, post(report::ingest_report::<S>))
        .route(
            "/api/observations/latest",
            get(observations::latest_observation::<S>),
        )
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Serves `router` until `cancel` fires. Handlers see the peer address
/// through `ConnectInfo`.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        cancel.cancelled().await;
    })
    .await
}

async fn health_handler() -> &'static str {
    "OK"
}
