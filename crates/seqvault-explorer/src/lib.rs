#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod client;
mod notify;
mod tree;

pub use client::{HttpListingClient, HttpListingConfig, ListingClient, ListingService};
pub use notify::{ChannelNotifier, Notification, NotificationLevel, Notifier, TracingNotifier};
pub use seqvault_core::{Error, ErrorKind, Result};
pub use tree::{DirectoryCache, FileTree, FileTreeConfig, FileTreeNode, NodeKind, ROOT_NAME};

/// Tracing target for file tree operations.
pub const TRACING_TARGET: &str = "seqvault_explorer";
