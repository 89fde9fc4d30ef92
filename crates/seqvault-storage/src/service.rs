use std::fmt;
use std::sync::Arc;

use crate::{ListPage, ListPageRequest, ObjectLister, Result, TRACING_TARGET};

/// Cloneable handle to any [`ObjectLister`].
#[derive(Clone)]
pub struct ObjectStorage {
    inner: Arc<dyn ObjectLister>,
}

impl ObjectStorage {
    /// Wraps a concrete lister.
    pub fn new<L>(lister: L) -> Self
    where
        L: ObjectLister + 'static,
    {
        Self {
            inner: Arc::new(lister),
        }
    }

    /// Lists a single page through the wrapped lister.
    #[tracing::instrument(
        name = "storage.list_page",
        skip_all,
        fields(
            bucket = %request.bucket,
            prefix = %request.prefix,
            continued = request.continuation_token.is_some(),
        )
    )]
    pub async fn list_page(&self, request: &ListPageRequest) -> Result<ListPage> {
        let page = self.inner.list_page(request).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            objects = page.contents.len(),
            prefixes = page.common_prefixes.len(),
            is_truncated = page.is_truncated,
            "Listed page"
        );

        Ok(page)
    }
}

impl fmt::Debug for ObjectStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStorage").finish_non_exhaustive()
    }
}

impl<L> From<Arc<L>> for ObjectStorage
where
    L: ObjectLister + 'static,
{
    fn from(lister: Arc<L>) -> Self {
        Self { inner: lister }
    }
}
