#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod memory;
mod page;
mod service;

#[cfg(feature = "s3")]
#[cfg_attr(docsrs, doc(cfg(feature = "s3")))]
pub mod s3;

pub use memory::MemoryLister;
pub use page::{ListPage, ListPageRequest};
pub use seqvault_core::{Error, ErrorKind, Result};
pub use service::ObjectStorage;

/// Tracing target for object listing operations.
pub const TRACING_TARGET: &str = "seqvault_storage";

/// One delimiter-scoped list call against an object store.
///
/// Implementations must not loop over continuation tokens; the caller owns
/// pagination. Transport and service failures surface as
/// [`ErrorKind::ExternalError`] with the original error as the source.
#[async_trait::async_trait]
pub trait ObjectLister: Send + Sync {
    /// Lists a single page.
    async fn list_page(&self, request: &ListPageRequest) -> Result<ListPage>;
}
