//! Reqwest-based listing client.

use std::sync::Arc;

use reqwest::{Client, StatusCode};
use seqvault_core::{AggregatedListing, Error, ErrorKind, ListingRequest, Result};
use serde::Deserialize;
use url::Url;

use super::{HttpListingConfig, ListingClient, ListingService};

/// Tracing target for listing client operations.
const TRACING_TARGET: &str = "seqvault_explorer::client";

/// Path of the listing endpoint, relative to the service URL.
const LIST_OBJECTS_PATH: &str = "objects/list";

/// Error body returned by the listing service.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    name: String,
    message: String,
}

struct HttpListingClientInner {
    http: Client,
    list_url: Url,
    config: HttpListingConfig,
}

/// Posts listing requests to `{endpoint}/objects/list` with a bearer token.
///
/// Transport failures surface as [`ErrorKind::NetworkError`]. Error statuses
/// map to the matching error kind with the service's message attached.
#[derive(Clone)]
pub struct HttpListingClient {
    inner: Arc<HttpListingClientInner>,
}

impl std::fmt::Debug for HttpListingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpListingClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl HttpListingClient {
    /// Creates a client with the given configuration.
    pub fn new(config: HttpListingConfig) -> Result<Self> {
        let timeout = config.effective_timeout();

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| {
                Error::from_source(ErrorKind::Configuration, e)
                    .with_message("failed to create HTTP client")
            })?;

        let list_url = Self::list_url(&config.endpoint)?;

        tracing::debug!(
            target: TRACING_TARGET,
            url = %list_url,
            timeout_ms = timeout.as_millis(),
            "Listing client created"
        );

        let inner = HttpListingClientInner {
            http,
            list_url,
            config,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &HttpListingConfig {
        &self.inner.config
    }

    /// Converts this client into a [`ListingService`].
    pub fn into_service(self) -> ListingService {
        ListingService::new(self)
    }

    fn list_url(endpoint: &Url) -> Result<Url> {
        let mut base = endpoint.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        base.join(LIST_OBJECTS_PATH).map_err(|e| {
            Error::from_source(ErrorKind::Configuration, e)
                .with_message("listing endpoint is not a valid URL")
        })
    }

    fn transport_error(error: reqwest::Error) -> Error {
        let message = if error.is_timeout() {
            "Listing request timed out"
        } else if error.is_connect() {
            "Connection to the listing service failed"
        } else if error.is_decode() {
            return Error::from_source(ErrorKind::Serialization, error)
                .with_message("Listing response is not valid");
        } else {
            "Listing request failed"
        };

        Error::from_source(ErrorKind::NetworkError, error).with_message(message)
    }

    fn status_error(status: StatusCode, body: &str) -> Error {
        let kind = match status {
            StatusCode::BAD_REQUEST => ErrorKind::InvalidInput,
            StatusCode::UNAUTHORIZED => ErrorKind::Authentication,
            StatusCode::FORBIDDEN => ErrorKind::Authorization,
            StatusCode::NOT_FOUND => ErrorKind::NotFound,
            _ => ErrorKind::ExternalError,
        };

        let error = Error::new(kind).with_context(format!("status {}", status.as_u16()));
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(body) => error.with_message(format!("{} ({})", body.message, body.name)),
            Err(_) => error.with_message(format!("Listing service answered {status}")),
        }
    }
}

#[async_trait::async_trait]
impl ListingClient for HttpListingClient {
    async fn list_objects(&self, request: &ListingRequest) -> Result<AggregatedListing> {
        let inner = &self.inner;

        let mut builder = inner.http.post(inner.list_url.clone()).json(request);
        if let Some(token) = inner.config.token.as_deref() {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(Self::transport_error)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = Self::status_error(status, &body);

            tracing::debug!(
                target: TRACING_TARGET,
                status = status.as_u16(),
                laboratory_id = %request.laboratory_id,
                error = %error,
                "Listing request rejected"
            );

            return Err(error);
        }

        let listing: AggregatedListing = response.json().await.map_err(Self::transport_error)?;

        tracing::trace!(
            target: TRACING_TARGET,
            prefix = request.s3_prefix.as_deref().unwrap_or_default(),
            objects = listing.contents.len(),
            prefixes = listing.common_prefixes.len(),
            "Listing received"
        );

        Ok(listing)
    }
}
