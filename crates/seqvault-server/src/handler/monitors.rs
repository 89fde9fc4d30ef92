//! Liveness handlers.

use aide::axum::ApiRouter;
use aide::axum::routing::get_with;
use aide::transform::TransformOperation;

use crate::extract::Json;
use crate::handler::response::MonitorStatus;
use crate::service::ServiceState;

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "seqvault_server::handler::monitors";

/// Reports that the service is up.
#[tracing::instrument(skip_all)]
async fn health_status() -> Json<MonitorStatus> {
    let response = MonitorStatus::default();

    tracing::debug!(
        target: TRACING_TARGET,
        is_healthy = response.is_healthy,
        "Health status requested"
    );

    Json(response)
}

fn health_status_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get health status")
        .description("Unauthenticated liveness check.")
        .response::<200, Json<MonitorStatus>>()
}

/// Returns a [`Router`] with all health monitoring routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    ApiRouter::new().api_route("/health", get_with(health_status, health_status_docs))
}
