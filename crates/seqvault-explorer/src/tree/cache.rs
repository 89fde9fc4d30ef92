//! Per-tree cache of directory children.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

use super::FileTreeNode;

type CacheKey = (String, String);

/// Children of every directory loaded so far, keyed by `(bucket, prefix)`.
///
/// Entries are never evicted; [`clear`](Self::clear) drops everything and
/// starts a new generation. Clones share the same storage so detached
/// pre-fetch tasks can fill it.
#[derive(Debug, Clone, Default)]
pub struct DirectoryCache {
    entries: Arc<RwLock<HashMap<CacheKey, Vec<FileTreeNode>>>>,
    generation: Arc<AtomicU64>,
}

impl DirectoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current generation, bumped by every [`clear`](Self::clear).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Returns the cached children of `prefix`.
    pub async fn get(&self, bucket: &str, prefix: &str) -> Option<Vec<FileTreeNode>> {
        let entries = self.entries.read().await;
        entries.get(&Self::key(bucket, prefix)).cloned()
    }

    /// Returns `true` if `prefix` has cached children.
    pub async fn contains(&self, bucket: &str, prefix: &str) -> bool {
        let entries = self.entries.read().await;
        entries.contains_key(&Self::key(bucket, prefix))
    }

    /// Stores the children of `prefix`, replacing any previous entry.
    pub async fn insert(&self, bucket: &str, prefix: &str, children: Vec<FileTreeNode>) {
        let mut entries = self.entries.write().await;
        entries.insert(Self::key(bucket, prefix), children);
    }

    /// Stores the children of `prefix` unless the cache was cleared after
    /// `generation` was read. Returns whether the entry was stored.
    pub async fn insert_for(
        &self,
        generation: u64,
        bucket: &str,
        prefix: &str,
        children: Vec<FileTreeNode>,
    ) -> bool {
        let mut entries = self.entries.write().await;
        if self.generation() != generation {
            return false;
        }

        entries.insert(Self::key(bucket, prefix), children);
        true
    }

    /// Drops every entry.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Number of cached directories.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn key(bucket: &str, prefix: &str) -> CacheKey {
        (bucket.to_owned(), prefix.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keyed_by_bucket_and_prefix() {
        let cache = DirectoryCache::new();
        let children = vec![FileTreeNode::directory("run-1", "ORG/LAB/run-1/")];
        cache.insert("genomics", "ORG/LAB/", children).await;

        assert!(cache.contains("genomics", "ORG/LAB/").await);
        assert!(!cache.contains("archive", "ORG/LAB/").await);
        assert_eq!(cache.get("genomics", "ORG/LAB/").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let cache = DirectoryCache::new();
        let clone = cache.clone();
        clone.insert("", "ORG/LAB/", Vec::new()).await;

        assert_eq!(cache.len().await, 1);
        cache.clear().await;
        assert!(clone.is_empty().await);
    }

    #[tokio::test]
    async fn stale_generation_is_not_stored() {
        let cache = DirectoryCache::new();
        let generation = cache.generation();

        cache.clear().await;
        assert!(!cache.insert_for(generation, "", "ORG/OLD/", Vec::new()).await);
        assert!(cache.is_empty().await);

        assert!(cache.insert_for(cache.generation(), "", "ORG/NEW/", Vec::new()).await);
        assert!(cache.contains("", "ORG/NEW/").await);
    }
}
