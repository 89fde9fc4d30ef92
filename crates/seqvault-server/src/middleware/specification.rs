//! OpenAPI document for the listing API, rendered with Scalar.

use aide::axum::ApiRouter;
use aide::openapi::{Info, OpenApi};
use aide::scalar::Scalar;
use axum::routing::{Router, get};
use axum::{Extension, Json};
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Where the generated API description is published.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct OpenApiConfig {
    /// Route of the OpenAPI 3.1 JSON document.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "OPENAPI_JSON_PATH", default_value = "/api/openapi.json")
    )]
    pub open_api_json: String,

    /// Route of the Scalar reference page that renders the document.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "OPENAPI_SCALAR_PATH", default_value = "/api/scalar")
    )]
    pub scalar_ui: String,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            open_api_json: "/api/openapi.json".to_owned(),
            scalar_ui: "/api/scalar".to_owned(),
        }
    }
}

fn api_info() -> Info {
    Info {
        title: "SeqVault API".to_owned(),
        summary: Some("Laboratory object storage listings".to_owned()),
        description: Some(
            "Lists the sequencing files and folders a laboratory keeps in object \
            storage. Every request is authorized against the caller's laboratory \
            capabilities."
                .to_owned(),
        ),
        version: env!("CARGO_PKG_VERSION").to_owned(),
        ..Info::default()
    }
}

async fn openapi_document(Extension(document): Extension<OpenApi>) -> Json<OpenApi> {
    Json(document)
}

/// Extension trait for [`ApiRouter`] to serve its OpenAPI document.
pub trait RouterOpenApiExt<S> {
    /// Finishes the API description and mounts the JSON document and the
    /// Scalar reference page at the configured paths.
    fn with_open_api(self, config: OpenApiConfig) -> Router<S>;
}

impl<S> RouterOpenApiExt<S> for ApiRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_open_api(self, config: OpenApiConfig) -> Router<S> {
        let mut document = OpenApi {
            info: api_info(),
            ..OpenApi::default()
        };

        let scalar = Scalar::new(&config.open_api_json);
        self.route(&config.scalar_ui, scalar.axum_route())
            .route(&config.open_api_json, get(openapi_document))
            .finish_api(&mut document)
            .layer(Extension(document))
    }
}

#[cfg(test)]
mod tests {
    use axum_test::TestServer;

    use super::*;
    use crate::handler::routes;
    use crate::handler::test::create_test_state;

    #[tokio::test]
    async fn serves_openapi_document() -> anyhow::Result<()> {
        let app: Router = routes()
            .with_state(create_test_state())
            .with_open_api(OpenApiConfig::default());
        let server = TestServer::new(app)?;

        let response = server.get("/api/openapi.json").await;
        response.assert_status_ok();

        let document = response.json::<serde_json::Value>();
        assert_eq!(document["info"]["title"], "SeqVault API");
        assert!(document["paths"]["/objects/list"]["post"].is_object());
        assert!(document["paths"]["/health"]["get"].is_object());
        Ok(())
    }

    #[tokio::test]
    async fn serves_scalar_ui() -> anyhow::Result<()> {
        let app: Router = routes()
            .with_state(create_test_state())
            .with_open_api(OpenApiConfig::default());
        let server = TestServer::new(app)?;

        server.get("/api/scalar").await.assert_status_ok();
        Ok(())
    }
}
