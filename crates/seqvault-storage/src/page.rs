//! Adapter input and output for a single list call.

use seqvault_core::{DEFAULT_DELIMITER, DEFAULT_MAX_KEYS, ObjectEntry, PrefixEntry, ResponseMetadata};

/// Parameters of one list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPageRequest {
    pub bucket: String,
    pub prefix: String,
    pub delimiter: String,
    pub max_keys: u32,
    /// Token returned by the previous page, `None` for the first call.
    pub continuation_token: Option<String>,
}

impl ListPageRequest {
    /// Creates a first-page request with the default delimiter and page size.
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            delimiter: DEFAULT_DELIMITER.to_owned(),
            max_keys: DEFAULT_MAX_KEYS,
            continuation_token: None,
        }
    }

    /// Sets the page size.
    pub fn with_max_keys(mut self, max_keys: u32) -> Self {
        self.max_keys = max_keys;
        self
    }

    /// Sets the delimiter.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Sets (or clears) the continuation token.
    pub fn with_continuation_token(mut self, token: Option<String>) -> Self {
        self.continuation_token = token;
        self
    }
}

/// Result of one list call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListPage {
    pub contents: Vec<ObjectEntry>,
    pub common_prefixes: Vec<PrefixEntry>,
    pub is_truncated: bool,
    pub next_continuation_token: Option<String>,
    pub metadata: ResponseMetadata,
}

impl ListPage {
    /// Number of objects and prefixes on this page.
    pub fn len(&self) -> usize {
        self.contents.len() + self.common_prefixes.len()
    }

    /// Returns `true` if the page holds neither objects nor prefixes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
