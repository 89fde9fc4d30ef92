//! In-process object store with ListObjectsV2 semantics.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use seqvault_core::{ObjectEntry, PrefixEntry, ResponseMetadata};
use tokio::sync::RwLock;

use crate::{Error, ErrorKind, ListPage, ListPageRequest, ObjectLister, Result, TRACING_TARGET};

type Bucket = BTreeMap<String, ObjectEntry>;

/// Object lister backed by ordered in-memory maps, one per bucket.
///
/// Keys are returned in lexicographic order and keys containing the delimiter
/// after the requested prefix roll up into one common prefix each. Objects and
/// prefixes both count toward `max_keys`.
#[derive(Debug, Default)]
pub struct MemoryLister {
    buckets: RwLock<HashMap<String, Bucket>>,
    calls: AtomicU64,
}

enum Item<'a> {
    Object(&'a ObjectEntry),
    Prefix(&'a str),
}

impl Item<'_> {
    fn marker(&self) -> &str {
        match self {
            Self::Object(entry) => &entry.key,
            Self::Prefix(prefix) => prefix,
        }
    }
}

impl MemoryLister {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given objects in one bucket.
    pub fn with_objects(
        bucket: impl Into<String>,
        objects: impl IntoIterator<Item = ObjectEntry>,
    ) -> Self {
        let objects = objects
            .into_iter()
            .map(|entry| (entry.key.clone(), entry))
            .collect();

        let mut buckets = HashMap::new();
        buckets.insert(bucket.into(), objects);

        Self {
            buckets: RwLock::new(buckets),
            calls: AtomicU64::new(0),
        }
    }

    /// Creates an empty bucket if it does not exist yet.
    pub async fn create_bucket(&self, bucket: impl Into<String>) {
        self.buckets.write().await.entry(bucket.into()).or_default();
    }

    /// Stores an object, replacing any object with the same key.
    pub async fn put(&self, bucket: impl Into<String>, entry: ObjectEntry) {
        let mut buckets = self.buckets.write().await;
        let objects = buckets.entry(bucket.into()).or_default();
        objects.insert(entry.key.clone(), entry);
    }

    /// Number of list calls served so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    fn decode_token(token: &str) -> Result<String> {
        let bytes = STANDARD.decode(token).map_err(|err| {
            Error::from_source(ErrorKind::InvalidInput, err)
                .with_message("The continuation token is not valid")
        })?;
        String::from_utf8(bytes).map_err(|err| {
            Error::from_source(ErrorKind::InvalidInput, err)
                .with_message("The continuation token is not valid")
        })
    }

    fn collect_page(
        objects: &Bucket,
        request: &ListPageRequest,
        start_after: Option<&str>,
    ) -> (Vec<ObjectEntry>, Vec<PrefixEntry>, Option<String>) {
        let limit = request.max_keys.max(1) as usize;
        let prefix = request.prefix.as_str();
        let delimiter = request.delimiter.as_str();

        let mut items: Vec<Item<'_>> = Vec::new();
        let mut truncated = false;

        let candidates = objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| start_after.is_none_or(|after| key.as_str() > after));

        for (key, entry) in candidates {
            let rest = &key[prefix.len()..];
            let item = match rest.find(delimiter).filter(|_| !delimiter.is_empty()) {
                Some(position) => {
                    let common = &key[..prefix.len() + position + delimiter.len()];
                    let emitted = items.last().is_some_and(|last| last.marker() == common);
                    let consumed = start_after.is_some_and(|after| common <= after);
                    if emitted || consumed {
                        continue;
                    }
                    Item::Prefix(common)
                }
                None => Item::Object(entry),
            };

            if items.len() == limit {
                truncated = true;
                break;
            }
            items.push(item);
        }

        let next_token = truncated
            .then(|| items.last().map(|item| STANDARD.encode(item.marker())))
            .flatten();

        let mut contents = Vec::new();
        let mut common_prefixes = Vec::new();
        for item in items {
            match item {
                Item::Object(entry) => contents.push(entry.clone()),
                Item::Prefix(prefix) => common_prefixes.push(PrefixEntry::new(prefix)),
            }
        }

        (contents, common_prefixes, next_token)
    }
}

#[async_trait::async_trait]
impl ObjectLister for MemoryLister {
    async fn list_page(&self, request: &ListPageRequest) -> Result<ListPage> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;

        let start_after = request
            .continuation_token
            .as_deref()
            .map(Self::decode_token)
            .transpose()?;

        let buckets = self.buckets.read().await;
        let objects = buckets.get(&request.bucket).ok_or_else(|| {
            Error::external_error()
                .with_message("The specified bucket does not exist")
                .with_context(request.bucket.clone())
        })?;

        let (contents, common_prefixes, next_continuation_token) =
            Self::collect_page(objects, request, start_after.as_deref());

        tracing::trace!(
            target: TRACING_TARGET,
            bucket = %request.bucket,
            prefix = %request.prefix,
            objects = contents.len(),
            prefixes = common_prefixes.len(),
            "Served in-memory page"
        );

        Ok(ListPage {
            contents,
            common_prefixes,
            is_truncated: next_continuation_token.is_some(),
            next_continuation_token,
            metadata: ResponseMetadata::default().with_request_id(format!("memory-{call}")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryLister {
        MemoryLister::with_objects(
            "genomics",
            [
                "ORG/LAB/readme.txt",
                "ORG/LAB/run-1/",
                "ORG/LAB/run-1/a.fastq",
                "ORG/LAB/run-1/b.fastq",
                "ORG/LAB/run-2/c.bam",
                "ORG/LAB/sample.vcf",
                "ORG/OTHER/x.txt",
            ]
            .into_iter()
            .map(ObjectEntry::new),
        )
    }

    fn keys(page: &ListPage) -> Vec<&str> {
        page.contents.iter().map(|entry| entry.key.as_str()).collect()
    }

    fn prefixes(page: &ListPage) -> Vec<&str> {
        page.common_prefixes
            .iter()
            .map(|entry| entry.prefix.as_str())
            .collect()
    }

    #[tokio::test]
    async fn rolls_up_common_prefixes() {
        let lister = store();
        let page = lister
            .list_page(&ListPageRequest::new("genomics", "ORG/LAB/"))
            .await
            .unwrap();

        assert_eq!(keys(&page), ["ORG/LAB/readme.txt", "ORG/LAB/sample.vcf"]);
        assert_eq!(prefixes(&page), ["ORG/LAB/run-1/", "ORG/LAB/run-2/"]);
        assert!(!page.is_truncated);
        assert!(page.next_continuation_token.is_none());
    }

    #[tokio::test]
    async fn lists_placeholder_and_children_inside_prefix() {
        let lister = store();
        let page = lister
            .list_page(&ListPageRequest::new("genomics", "ORG/LAB/run-1/"))
            .await
            .unwrap();

        assert_eq!(
            keys(&page),
            [
                "ORG/LAB/run-1/",
                "ORG/LAB/run-1/a.fastq",
                "ORG/LAB/run-1/b.fastq"
            ]
        );
        assert!(page.common_prefixes.is_empty());
    }

    #[tokio::test]
    async fn paginates_objects_and_prefixes_together() {
        let lister = store();
        let first = lister
            .list_page(&ListPageRequest::new("genomics", "ORG/LAB/").with_max_keys(2))
            .await
            .unwrap();

        assert_eq!(keys(&first), ["ORG/LAB/readme.txt"]);
        assert_eq!(prefixes(&first), ["ORG/LAB/run-1/"]);
        assert!(first.is_truncated);

        let second = lister
            .list_page(
                &ListPageRequest::new("genomics", "ORG/LAB/")
                    .with_max_keys(2)
                    .with_continuation_token(first.next_continuation_token.clone()),
            )
            .await
            .unwrap();

        assert_eq!(keys(&second), ["ORG/LAB/sample.vcf"]);
        assert_eq!(prefixes(&second), ["ORG/LAB/run-2/"]);
        assert!(!second.is_truncated);
        assert_eq!(lister.calls(), 2);
    }

    #[tokio::test]
    async fn token_after_prefix_skips_its_keys() {
        let lister = store();
        let first = lister
            .list_page(&ListPageRequest::new("genomics", "ORG/LAB/").with_max_keys(1))
            .await
            .unwrap();
        let second = lister
            .list_page(
                &ListPageRequest::new("genomics", "ORG/LAB/")
                    .with_max_keys(1)
                    .with_continuation_token(first.next_continuation_token.clone()),
            )
            .await
            .unwrap();
        let third = lister
            .list_page(
                &ListPageRequest::new("genomics", "ORG/LAB/")
                    .with_max_keys(1)
                    .with_continuation_token(second.next_continuation_token.clone()),
            )
            .await
            .unwrap();

        assert_eq!(keys(&first), ["ORG/LAB/readme.txt"]);
        assert_eq!(prefixes(&second), ["ORG/LAB/run-1/"]);
        assert_eq!(prefixes(&third), ["ORG/LAB/run-2/"]);
        assert!(third.is_truncated);
    }

    #[tokio::test]
    async fn exact_fit_is_not_truncated() {
        let lister = store();
        let page = lister
            .list_page(&ListPageRequest::new("genomics", "ORG/LAB/").with_max_keys(4))
            .await
            .unwrap();

        assert_eq!(page.len(), 4);
        assert!(!page.is_truncated);
    }

    #[tokio::test]
    async fn missing_bucket_is_external_error() {
        let lister = store();
        let error = lister
            .list_page(&ListPageRequest::new("missing", ""))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ExternalError);
    }

    #[tokio::test]
    async fn invalid_token_is_rejected() {
        let lister = store();
        let request = ListPageRequest::new("genomics", "ORG/LAB/")
            .with_continuation_token(Some("not base64!".to_owned()));
        let error = lister.list_page(&request).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn put_and_create_bucket() {
        let lister = MemoryLister::new();
        lister.create_bucket("empty").await;
        lister.put("data", ObjectEntry::new("a/b.txt")).await;

        let empty = lister
            .list_page(&ListPageRequest::new("empty", ""))
            .await
            .unwrap();
        assert!(empty.is_empty());

        let data = lister
            .list_page(&ListPageRequest::new("data", ""))
            .await
            .unwrap();
        assert_eq!(prefixes(&data), ["a/"]);
        assert_eq!(data.metadata.request_id.as_deref(), Some("memory-2"));
    }
}
