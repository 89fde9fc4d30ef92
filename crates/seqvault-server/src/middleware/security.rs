//! CORS, response hardening headers, compression and body limits.

use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::http::header::{self, HeaderName, HeaderValue};
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

/// Listing requests carry two short fields.
const MAX_BODY_SIZE: usize = 64 * 1024;

/// Local front-end dev servers, allowed when no origin is configured.
const LOCAL_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
];

const HARDENING_HEADERS: [(HeaderName, &str); 3] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::REFERRER_POLICY, "strict-origin-when-cross-origin"),
];

/// Browser origins permitted to call the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct CorsConfig {
    /// Comma-separated origins. Local dev servers are allowed when empty.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CORS_ORIGINS", value_delimiter = ',')
    )]
    pub allowed_origins: Vec<String>,

    /// Seconds a browser may cache a preflight answer.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CORS_MAX_AGE", default_value_t = 3600)
    )]
    pub max_age_seconds: u64,

    /// Lets browsers send cookies and auth headers cross-origin.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CORS_ALLOW_CREDENTIALS", default_value_t = true, action = clap::ArgAction::Set)
    )]
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_age_seconds: 3600,
            allow_credentials: true,
        }
    }
}

impl CorsConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_seconds)
    }

    /// Parsed origins. Entries that are not valid header values are dropped.
    pub fn origins(&self) -> Vec<HeaderValue> {
        if self.allowed_origins.is_empty() {
            return LOCAL_ORIGINS.map(HeaderValue::from_static).to_vec();
        }

        self.allowed_origins
            .iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect()
    }

    fn layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(self.origins())
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .allow_credentials(self.allow_credentials)
            .max_age(self.max_age())
    }
}

/// Extension trait for `axum::`[`Router`] to apply security middleware.
pub trait RouterSecurityExt<S> {
    /// Applies CORS, hardening headers, compression and the body limit.
    fn with_security(self, cors: &CorsConfig) -> Self;
}

impl<S> RouterSecurityExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_security(self, cors: &CorsConfig) -> Self {
        let router = self
            .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
            .layer(CompressionLayer::new())
            .layer(cors.layer());

        HARDENING_HEADERS
            .into_iter()
            .fold(router, |router, (name, value)| {
                router.layer(SetResponseHeaderLayer::overriding(
                    name,
                    HeaderValue::from_static(value),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use axum::routing::get;
    use axum_test::TestServer;

    use super::*;

    #[test]
    fn falls_back_to_local_origins() {
        let origins = CorsConfig::default().origins();
        assert_eq!(origins.len(), LOCAL_ORIGINS.len());
        assert_eq!(origins[0], "http://localhost:3000");
    }

    #[test]
    fn drops_invalid_origins() {
        let config = CorsConfig {
            allowed_origins: vec!["https://lab.example.org".to_owned(), "bad\norigin".to_owned()],
            ..CorsConfig::default()
        };
        assert_eq!(config.origins(), ["https://lab.example.org"]);
    }

    #[tokio::test]
    async fn sets_hardening_headers() -> anyhow::Result<()> {
        let app: Router = Router::new()
            .route("/", get(|| async { "ok" }))
            .with_security(&CorsConfig::default());
        let server = TestServer::new(app)?;

        let response = server.get("/").await;
        response.assert_status_ok();
        assert_eq!(response.header(header::X_CONTENT_TYPE_OPTIONS), "nosniff");
        assert_eq!(response.header(header::X_FRAME_OPTIONS), "DENY");
        assert_eq!(
            response.header(header::REFERRER_POLICY),
            "strict-origin-when-cross-origin"
        );
        Ok(())
    }
}
