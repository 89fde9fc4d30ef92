//! Seam to the object listing service.

mod config;
mod http;

use std::fmt;
use std::sync::Arc;

use seqvault_core::{AggregatedListing, ListingRequest, Result};

pub use self::config::HttpListingConfig;
pub use self::http::HttpListingClient;

/// Fetches one fully aggregated listing.
#[async_trait::async_trait]
pub trait ListingClient: Send + Sync {
    /// Lists every object and common prefix matching the request.
    async fn list_objects(&self, request: &ListingRequest) -> Result<AggregatedListing>;
}

/// Cloneable handle to any [`ListingClient`].
#[derive(Clone)]
pub struct ListingService {
    inner: Arc<dyn ListingClient>,
}

impl ListingService {
    /// Wraps a concrete client.
    pub fn new<C>(client: C) -> Self
    where
        C: ListingClient + 'static,
    {
        Self {
            inner: Arc::new(client),
        }
    }

    /// Lists through the wrapped client.
    pub async fn list_objects(&self, request: &ListingRequest) -> Result<AggregatedListing> {
        self.inner.list_objects(request).await
    }
}

impl fmt::Debug for ListingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListingService").finish_non_exhaustive()
    }
}

impl<C> From<Arc<C>> for ListingService
where
    C: ListingClient + 'static,
{
    fn from(client: Arc<C>) -> Self {
        Self { inner: client }
    }
}
