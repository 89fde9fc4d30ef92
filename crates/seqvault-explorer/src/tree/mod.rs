//! Lazily loaded file tree with one level of pre-fetch.
//!
//! A [`FileTree`] owns the synthetic root node, the navigation trail and a
//! [`DirectoryCache`]. Every directory listed from the service is cached, and
//! the child directories it contains are fetched in the background so the
//! next click is served from memory.
//!
//! Every change to a node's loading state is published on a [`watch`]
//! channel, so a view can render spinners while a listing is in flight.

mod cache;
mod node;

use std::fmt;
use std::sync::Arc;

use seqvault_core::{Error, Laboratory, ListingRequest, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub use self::cache::DirectoryCache;
pub(crate) use self::node::children_from_listing;
pub use self::node::{FileTreeNode, NodeKind, ROOT_NAME};
use crate::client::ListingService;
use crate::notify::{Notification, Notifier};

/// Tracing target for file tree operations.
const TRACING_TARGET: &str = "seqvault_explorer::tree";

/// What a [`FileTree`] lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTreeConfig {
    /// Laboratory whose storage is browsed.
    pub laboratory_id: String,
    /// Bucket override. The laboratory's bucket is used when unset.
    pub bucket: Option<String>,
    /// Prefix shown as the root of the tree.
    pub root_prefix: String,
}

impl FileTreeConfig {
    /// Creates a configuration for `laboratory_id` rooted at `root_prefix`.
    pub fn new(laboratory_id: impl Into<String>, root_prefix: impl Into<String>) -> Self {
        Self {
            laboratory_id: laboratory_id.into(),
            bucket: None,
            root_prefix: root_prefix.into(),
        }
    }

    /// Creates a configuration rooted at the laboratory's default prefix.
    pub fn for_laboratory(laboratory: &Laboratory) -> Self {
        Self {
            laboratory_id: laboratory.laboratory_id.clone(),
            bucket: laboratory.s3_bucket.clone(),
            root_prefix: laboratory.default_prefix(),
        }
    }

    /// Lists from `bucket` instead of the laboratory's bucket.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }
}

/// Fetches and caches directory children. Cloned into pre-fetch tasks.
#[derive(Debug, Clone)]
struct DirectoryLoader {
    client: ListingService,
    cache: DirectoryCache,
    laboratory_id: String,
    bucket: Option<String>,
}

impl DirectoryLoader {
    fn bucket_key(&self) -> &str {
        self.bucket.as_deref().unwrap_or_default()
    }

    fn request(&self, prefix: &str) -> ListingRequest {
        let request = ListingRequest::new(self.laboratory_id.as_str()).with_prefix(prefix);
        match self.bucket.as_deref() {
            Some(bucket) => request.with_bucket(bucket),
            None => request,
        }
    }

    /// Lists `prefix` and stores the children unless the cache was cleared
    /// since `generation`.
    async fn fetch(&self, prefix: &str, generation: u64) -> Result<Vec<FileTreeNode>> {
        let listing = self.client.list_objects(&self.request(prefix)).await?;
        let children = children_from_listing(listing, prefix);

        let stored = self
            .cache
            .insert_for(generation, self.bucket_key(), prefix, children.clone())
            .await;

        tracing::debug!(
            target: TRACING_TARGET,
            prefix = %prefix,
            children = children.len(),
            stored,
            "Directory listed"
        );

        Ok(children)
    }
}

/// Navigable file tree over one laboratory's storage.
///
/// ```rust,ignore
/// let mut tree = FileTree::new(service, TracingNotifier, config);
/// tree.load_root().await;
/// tree.open_directory("ORG/LAB/run-1/").await?;
/// ```
pub struct FileTree {
    loader: DirectoryLoader,
    notifier: Arc<dyn Notifier>,
    root: FileTreeNode,
    trail: Vec<String>,
    snapshots: watch::Sender<FileTreeNode>,
}

impl fmt::Debug for FileTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileTree")
            .field("laboratory_id", &self.loader.laboratory_id)
            .field("bucket", &self.loader.bucket)
            .field("root_prefix", &self.root.path)
            .field("trail", &self.trail)
            .finish_non_exhaustive()
    }
}

impl FileTree {
    /// Creates a tree with an unloaded root. Call [`load_root`](Self::load_root)
    /// before navigating.
    pub fn new<N>(client: ListingService, notifier: N, config: FileTreeConfig) -> Self
    where
        N: Notifier + 'static,
    {
        let FileTreeConfig {
            laboratory_id,
            bucket,
            root_prefix,
        } = config;

        let loader = DirectoryLoader {
            client,
            cache: DirectoryCache::new(),
            laboratory_id,
            bucket,
        };

        let root = FileTreeNode::root(root_prefix);
        let (snapshots, _) = watch::channel(root.clone());

        Self {
            loader,
            notifier: Arc::new(notifier),
            root,
            trail: Vec::new(),
            snapshots,
        }
    }

    /// Creates a tree and loads its root children.
    pub async fn open<N>(client: ListingService, notifier: N, config: FileTreeConfig) -> Self
    where
        N: Notifier + 'static,
    {
        let mut tree = Self::new(client, notifier, config);
        tree.load_root().await;
        tree
    }

    /// Returns the directory cache shared with pre-fetch tasks.
    pub fn cache(&self) -> &DirectoryCache {
        &self.loader.cache
    }

    /// Returns the prefix shown as the root.
    pub fn root_prefix(&self) -> &str {
        &self.root.path
    }

    /// Returns the synthetic root node.
    pub fn root(&self) -> &FileTreeNode {
        &self.root
    }

    /// Returns a copy of the whole tree.
    pub fn snapshot(&self) -> FileTreeNode {
        self.root.clone()
    }

    /// Subscribes to tree snapshots, published whenever a node starts or
    /// finishes loading.
    pub fn subscribe(&self) -> watch::Receiver<FileTreeNode> {
        self.snapshots.subscribe()
    }

    /// Returns the directory at the end of the navigation path.
    pub fn current(&self) -> &FileTreeNode {
        self.path().pop().unwrap_or(&self.root)
    }

    /// Returns the breadcrumbs, root first.
    pub fn path(&self) -> Vec<&FileTreeNode> {
        let mut path = Vec::with_capacity(self.trail.len() + 1);
        let mut node = &self.root;
        path.push(node);

        for dir in &self.trail {
            match node.children().iter().find(|child| &child.path == dir) {
                Some(child) => {
                    node = child;
                    path.push(node);
                }
                None => break,
            }
        }

        path
    }

    /// Number of directories opened below the root.
    pub fn depth(&self) -> usize {
        self.trail.len()
    }

    /// Returns the children of `prefix`, from the cache or the service.
    ///
    /// Newly listed children are cached and their subdirectories pre-fetched.
    pub async fn load_directory_children(&self, prefix: &str) -> Result<Vec<FileTreeNode>> {
        let loader = &self.loader;

        let children = match loader.cache.get(loader.bucket_key(), prefix).await {
            Some(children) => {
                tracing::trace!(target: TRACING_TARGET, prefix = %prefix, "Directory cache hit");
                children
            }
            None => {
                let generation = loader.cache.generation();
                loader.fetch(prefix, generation).await?
            }
        };

        // Detached; completion only shows up in the cache.
        drop(self.prefetch_next_level(&children, prefix));
        Ok(children)
    }

    /// Spawns one background fetch per child directory of `prefix_path` that
    /// is not cached yet. Failures are logged and dropped.
    pub fn prefetch_next_level(
        &self,
        children: &[FileTreeNode],
        prefix_path: &str,
    ) -> Vec<JoinHandle<()>> {
        let generation = self.loader.cache.generation();

        children
            .iter()
            .filter(|child| child.is_directory() && !child.is_loaded())
            .map(|child| {
                let loader = self.loader.clone();
                let prefix = child.path.clone();
                let parent = prefix_path.to_owned();

                tokio::spawn(async move {
                    if loader.cache.contains(loader.bucket_key(), &prefix).await {
                        return;
                    }

                    if let Err(error) = loader.fetch(&prefix, generation).await {
                        tracing::debug!(
                            target: TRACING_TARGET,
                            parent = %parent,
                            prefix = %prefix,
                            error = %error,
                            "Pre-fetch failed"
                        );
                    }
                })
            })
            .collect()
    }

    /// Loads the root children. Failures notify and leave the root empty.
    pub async fn load_root(&mut self) {
        let prefix = self.root.path.clone();
        self.root.is_loading = true;
        self.publish();

        let children = match self.load_directory_children(&prefix).await {
            Ok(children) => children,
            Err(error) => {
                self.notify_failure("Failed to load files", &prefix, &error);
                Vec::new()
            }
        };

        self.root.is_loading = false;
        self.root.children = Some(children);
        self.publish();
    }

    /// Re-roots the tree at `prefix`, dropping every loaded node and cache
    /// entry.
    pub async fn set_root_prefix(&mut self, prefix: impl Into<String>) {
        let prefix = prefix.into();
        tracing::debug!(
            target: TRACING_TARGET,
            from = %self.root.path,
            to = %prefix,
            "Root prefix changed"
        );

        self.trail.clear();
        self.loader.cache.clear().await;
        self.root = FileTreeNode::root(prefix);
        self.load_root().await;
    }

    /// Opens the child directory `path` of the current directory.
    ///
    /// Opening the current directory again does nothing. A failed load
    /// notifies once and opens the directory with no children.
    pub async fn open_directory(&mut self, path: &str) -> Result<()> {
        if self.current().path == path {
            return Ok(());
        }

        let Some(node) = self.current().child_directories().find(|node| node.path == path) else {
            return Err(Error::not_found()
                .with_message(format!("{path} is not a folder of the current directory")));
        };

        if !node.is_loaded() {
            let name = node.name.clone();
            self.set_child(path, |node| node.is_loading = true);
            self.publish();

            let children = match self.load_directory_children(path).await {
                Ok(children) => children,
                Err(error) => {
                    self.notify_failure("Failed to open folder", &name, &error);
                    Vec::new()
                }
            };

            self.set_child(path, |node| {
                node.is_loading = false;
                node.children = Some(children);
            });
            self.publish();
        }

        self.trail.push(path.to_owned());
        Ok(())
    }

    /// Opens each segment of `start_path` from the root and returns the
    /// depth reached. Stops at the first segment that is not a child folder.
    ///
    /// `start_path` is relative to the root prefix; a path that repeats the
    /// root prefix is accepted too.
    pub async fn navigate(&mut self, start_path: &str) -> usize {
        if !self.root.is_loaded() {
            self.load_root().await;
        }

        self.trail.clear();
        let relative = start_path
            .strip_prefix(self.root.path.as_str())
            .unwrap_or(start_path);

        for segment in relative.split('/').filter(|segment| !segment.is_empty()) {
            let next = self
                .current()
                .child_directories()
                .find(|node| node.name == segment)
                .map(|node| node.path.clone());

            let Some(path) = next else {
                tracing::debug!(
                    target: TRACING_TARGET,
                    segment = %segment,
                    depth = self.trail.len(),
                    "Navigation stopped at missing folder"
                );
                break;
            };

            if self.open_directory(&path).await.is_err() {
                break;
            }
        }

        self.trail.len()
    }

    /// Goes up one level. Returns `false` at the root.
    pub fn navigate_up(&mut self) -> bool {
        self.trail.pop().is_some()
    }

    /// Keeps the first `depth` opened directories, as a breadcrumb click does.
    pub fn navigate_to_depth(&mut self, depth: usize) {
        self.trail.truncate(depth);
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.root.clone());
    }

    fn set_child(&mut self, path: &str, update: impl FnOnce(&mut FileTreeNode)) {
        if let Some(node) = Self::find_mut(&mut self.root, &self.trail)
            .and_then(|current| current.children.as_mut())
            .and_then(|children| children.iter_mut().find(|child| child.path == path))
        {
            update(node);
        }
    }

    fn find_mut<'a>(root: &'a mut FileTreeNode, trail: &[String]) -> Option<&'a mut FileTreeNode> {
        let mut node = root;
        for dir in trail {
            node = node
                .children
                .as_mut()?
                .iter_mut()
                .find(|child| &child.path == dir)?;
        }
        Some(node)
    }

    fn notify_failure(&self, title: &str, target: &str, error: &Error) {
        tracing::warn!(
            target: TRACING_TARGET,
            target_path = %target,
            error = %error,
            "{title}"
        );

        self.notifier
            .notify(Notification::error(title, format!("{target}: {error}")));
    }
}
