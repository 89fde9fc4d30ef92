//! Request tracing and request IDs.

use axum::Router;
use axum::http::header;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;

/// Header carrying the request identifier.
const REQUEST_ID_HEADER: header::HeaderName = header::HeaderName::from_static("x-request-id");

/// Extension trait for `axum::`[`Router`] to apply observability middleware.
pub trait RouterObservabilityExt<S> {
    /// Layers observability middleware for request tracing and logging.
    ///
    /// Generates an `x-request-id` for every request, opens a tracing span
    /// per request, echoes the id on the response and marks credentials as
    /// sensitive so they are redacted in logs.
    fn with_observability(self) -> Self;
}

impl<S> RouterObservabilityExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_observability(self) -> Self {
        self.layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
            .layer(SetSensitiveRequestHeadersLayer::new([
                header::AUTHORIZATION,
                header::COOKIE,
            ]))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
    }
}

#[cfg(test)]
mod tests {
    use axum::routing::get;
    use axum_test::TestServer;

    use super::*;

    #[tokio::test]
    async fn sets_request_id() -> anyhow::Result<()> {
        let app: Router = Router::new()
            .route("/", get(|| async { "ok" }))
            .with_observability();
        let server = TestServer::new(app)?;

        let response = server.get("/").await;
        response.assert_status_ok();
        assert!(response.maybe_header("x-request-id").is_some());
        Ok(())
    }

    #[tokio::test]
    async fn keeps_incoming_request_id() -> anyhow::Result<()> {
        let app: Router = Router::new()
            .route("/", get(|| async { "ok" }))
            .with_observability();
        let server = TestServer::new(app)?;

        let response = server.get("/").add_header("x-request-id", "req-42").await;
        assert_eq!(response.header("x-request-id"), "req-42");
        Ok(())
    }
}
