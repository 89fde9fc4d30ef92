//! Object listing handlers.
//!
//! A listing request names a laboratory. The caller must hold one of the
//! storage capabilities for it; the bucket and prefix default to the
//! laboratory's own. Every page of the delimiter-scoped listing is fetched
//! and returned as one response.

use aide::axum::ApiRouter;
use aide::axum::routing::post_with;
use aide::transform::TransformOperation;
use axum::extract::State;
use seqvault_core::{AggregatedListing, Laboratory, ListingRequest};
use seqvault_storage::{ListPageRequest, ObjectStorage};

use crate::extract::{AccessProvider, AuthState, Json, ValidateJson};
use crate::handler::response::ErrorResponse;
use crate::handler::{ErrorKind, Result};
use crate::service::{Directory, ServiceState};

/// Tracing target for object listing operations.
const TRACING_TARGET: &str = "seqvault_server::handler::objects";

/// Lists every object and common prefix under a laboratory prefix.
#[tracing::instrument(
    skip_all,
    fields(
        subject = %auth_state.subject,
        laboratory_id = %request.laboratory_id,
    )
)]
async fn list_objects(
    State(directory): State<Directory>,
    State(storage): State<ObjectStorage>,
    auth_state: AuthState,
    ValidateJson(request): ValidateJson<ListingRequest>,
) -> Result<Json<AggregatedListing>> {
    tracing::debug!(target: TRACING_TARGET, "Listing objects");

    let laboratory = find_laboratory(&directory, &request.laboratory_id).await?;
    auth_state.authorize_storage_read(&laboratory)?;

    let page_request = resolve_page_request(&request, &laboratory);
    let listing = aggregate_pages(&storage, page_request).await?;

    tracing::info!(
        target: TRACING_TARGET,
        objects = listing.contents.len(),
        prefixes = listing.common_prefixes.len(),
        "Objects listed"
    );

    Ok(Json(listing))
}

fn list_objects_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List objects")
        .description(
            "Lists the files and folders directly under a laboratory prefix. \
            All pages are fetched and concatenated, so `IsTruncated` is always false.",
        )
        .response::<200, Json<AggregatedListing>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<500, Json<ErrorResponse>>()
}

/// Resolves the laboratory; an unknown laboratory is a server-side fault.
async fn find_laboratory(directory: &Directory, laboratory_id: &str) -> Result<Laboratory> {
    let laboratory = directory.find_laboratory(laboratory_id).await?;

    laboratory.ok_or_else(|| {
        tracing::error!(
            target: TRACING_TARGET,
            laboratory_id,
            "Laboratory is not known to the directory"
        );
        ErrorKind::InternalServerError.with_context(format!("laboratory {laboratory_id} not found"))
    })
}

/// Builds the first-page request from the body and the laboratory record.
fn resolve_page_request(request: &ListingRequest, laboratory: &Laboratory) -> ListPageRequest {
    let bucket = request
        .s3_bucket
        .clone()
        .or_else(|| laboratory.s3_bucket.clone())
        .unwrap_or_default();
    let prefix = request
        .s3_prefix
        .clone()
        .unwrap_or_else(|| laboratory.default_prefix());

    ListPageRequest::new(bucket, prefix).with_max_keys(request.page_size())
}

/// Follows continuation tokens until the listing is exhausted.
///
/// `$metadata` comes from the first page. Pages are concatenated in arrival
/// order without sorting or deduplication.
async fn aggregate_pages(
    storage: &ObjectStorage,
    mut page_request: ListPageRequest,
) -> Result<AggregatedListing> {
    let mut listing: Option<AggregatedListing> = None;
    let mut pages = 0_usize;

    loop {
        let page = storage.list_page(&page_request).await.map_err(|error| {
            tracing::error!(
                target: TRACING_TARGET,
                bucket = %page_request.bucket,
                prefix = %page_request.prefix,
                pages,
                error = %error,
                "Object store listing failed"
            );
            ErrorKind::InternalServerError.with_context(error.to_string())
        })?;
        pages += 1;

        let aggregated =
            listing.get_or_insert_with(|| AggregatedListing::new(page.metadata.clone()));
        aggregated.extend_page(page.contents, page.common_prefixes);

        if !page.is_truncated {
            break;
        }

        let Some(token) = page.next_continuation_token else {
            tracing::error!(
                target: TRACING_TARGET,
                bucket = %page_request.bucket,
                prefix = %page_request.prefix,
                pages,
                "Truncated page without a continuation token"
            );
            return Err(ErrorKind::InternalServerError
                .with_context("object store reported a truncated page without a token"));
        };

        page_request = page_request.with_continuation_token(Some(token));
    }

    tracing::debug!(target: TRACING_TARGET, pages, "Pagination exhausted");

    Ok(listing.unwrap_or_default())
}

/// Returns a [`Router`] with all object listing routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    ApiRouter::new().api_route(
        "/objects/list",
        post_with(list_objects, list_objects_docs),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use axum_test::TestServer;
    use jiff::SignedDuration;
    use seqvault_core::{ObjectEntry, PrefixEntry, ResponseMetadata};
    use seqvault_storage::{ListPage, MemoryLister, ObjectLister};
    use serde_json::json;

    use super::*;
    use crate::extract::AuthClaims;
    use crate::handler::test::create_test_server_with_state;
    use crate::service::{AuthKeys, StaticDirectory};

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    /// Serves scripted pages and records every request it receives.
    #[derive(Default)]
    struct RecordingLister {
        pages: Mutex<VecDeque<ListPage>>,
        requests: Mutex<Vec<ListPageRequest>>,
    }

    impl RecordingLister {
        fn new(pages: impl IntoIterator<Item = ListPage>) -> Arc<Self> {
            Arc::new(Self {
                pages: Mutex::new(pages.into_iter().collect()),
                requests: Mutex::default(),
            })
        }

        fn requests(&self) -> Vec<ListPageRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ObjectLister for RecordingLister {
        async fn list_page(&self, request: &ListPageRequest) -> seqvault_storage::Result<ListPage> {
            self.requests.lock().unwrap().push(request.clone());
            let page = self.pages.lock().unwrap().pop_front();
            page.ok_or_else(|| {
                seqvault_storage::Error::external_error().with_message("no scripted page left")
            })
        }
    }

    fn page(keys: impl IntoIterator<Item = String>, token: Option<&str>, request_id: &str) -> ListPage {
        ListPage {
            contents: keys.into_iter().map(ObjectEntry::new).collect(),
            common_prefixes: Vec::new(),
            is_truncated: token.is_some(),
            next_continuation_token: token.map(str::to_owned),
            metadata: ResponseMetadata::default().with_request_id(request_id),
        }
    }

    fn numbered(range: std::ops::Range<usize>) -> impl Iterator<Item = String> {
        range.map(|i| format!("ORG-1/LAB-1/file-{i:05}"))
    }

    fn keys() -> AuthKeys {
        AuthKeys::from_secret(SECRET, "seqvault", "seqvault:server")
    }

    fn state(storage: ObjectStorage) -> ServiceState {
        let directory = Directory::new(StaticDirectory::new([
            Laboratory::new("LAB-1", "ORG-1").with_bucket("genomics"),
            Laboratory::new("LAB-2", "ORG-1"),
        ]));
        ServiceState::new(storage, directory, keys())
    }

    fn token(groups: &[&str]) -> String {
        let keys = keys();
        let claims = groups.iter().fold(
            AuthClaims::new(&keys, "user-1", SignedDuration::from_mins(5)),
            |claims, group| claims.with_group(*group),
        );
        keys.issue_token(&claims).unwrap()
    }

    async fn server(storage: ObjectStorage) -> anyhow::Result<TestServer> {
        create_test_server_with_state(routes(), state(storage)).await
    }

    #[tokio::test]
    async fn aggregates_two_pages() -> anyhow::Result<()> {
        let lister = RecordingLister::new([
            page(numbered(0..1000), Some("token-1"), "req-1"),
            page(numbered(1000..1500), None, "req-2"),
        ]);
        let server = server(ObjectStorage::from(lister.clone())).await?;

        let response = server
            .post("/objects/list")
            .authorization_bearer(token(&["org/ORG-1/lab/LAB-1/technician"]))
            .json(&json!({ "LaboratoryId": "LAB-1" }))
            .await;
        response.assert_status_ok();

        let listing = response.json::<AggregatedListing>();
        assert_eq!(listing.contents.len(), 1500);
        assert_eq!(listing.contents[0].key, "ORG-1/LAB-1/file-00000");
        assert_eq!(listing.contents[1499].key, "ORG-1/LAB-1/file-01499");
        assert!(!listing.is_truncated);
        assert_eq!(listing.metadata.request_id.as_deref(), Some("req-1"));

        let requests = lister.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].bucket, "genomics");
        assert_eq!(requests[0].prefix, "ORG-1/LAB-1/");
        assert_eq!(requests[0].delimiter, "/");
        assert_eq!(requests[0].max_keys, 1000);
        assert_eq!(requests[0].continuation_token, None);
        assert_eq!(requests[1].continuation_token.as_deref(), Some("token-1"));
        Ok(())
    }

    #[tokio::test]
    async fn follows_every_token() -> anyhow::Result<()> {
        let lister = RecordingLister::new([
            page(numbered(0..1000), Some("token-1"), "req-1"),
            page(numbered(1000..2000), Some("token-2"), "req-2"),
            page(numbered(2000..2500), None, "req-3"),
        ]);
        let server = server(ObjectStorage::from(lister.clone())).await?;

        let response = server
            .post("/objects/list")
            .authorization_bearer(token(&["org/ORG-1/admin"]))
            .json(&json!({ "LaboratoryId": "LAB-1" }))
            .await;
        response.assert_status_ok();

        let listing = response.json::<AggregatedListing>();
        assert_eq!(listing.contents.len(), 2500);

        let tokens: Vec<_> = lister
            .requests()
            .into_iter()
            .map(|request| request.continuation_token)
            .collect();
        assert_eq!(
            tokens,
            [None, Some("token-1".to_owned()), Some("token-2".to_owned())]
        );
        Ok(())
    }

    #[tokio::test]
    async fn honors_overrides() -> anyhow::Result<()> {
        let lister = RecordingLister::new([ListPage {
            common_prefixes: vec![PrefixEntry::new("shared/runs/")],
            ..ListPage::default()
        }]);
        let server = server(ObjectStorage::from(lister.clone())).await?;

        let response = server
            .post("/objects/list")
            .authorization_bearer(token(&["org/ORG-1/lab/LAB-1/manager"]))
            .json(&json!({
                "LaboratoryId": "LAB-1",
                "S3Bucket": "archive",
                "S3Prefix": "shared/",
                "MaxKeys": 10,
            }))
            .await;
        response.assert_status_ok();

        let body = response.json::<serde_json::Value>();
        assert_eq!(body["Contents"], json!([]));
        assert_eq!(body["CommonPrefixes"], json!([{ "Prefix": "shared/runs/" }]));
        assert_eq!(body["IsTruncated"], json!(false));

        let requests = lister.requests();
        assert_eq!(requests[0].bucket, "archive");
        assert_eq!(requests[0].prefix, "shared/");
        assert_eq!(requests[0].max_keys, 10);
        Ok(())
    }

    #[tokio::test]
    async fn missing_bucket_defaults_to_empty() -> anyhow::Result<()> {
        let lister = RecordingLister::new([ListPage::default()]);
        let server = server(ObjectStorage::from(lister.clone())).await?;

        let response = server
            .post("/objects/list")
            .authorization_bearer(token(&["org/ORG-1/admin"]))
            .json(&json!({ "LaboratoryId": "LAB-2" }))
            .await;
        response.assert_status_ok();

        assert_eq!(lister.requests()[0].bucket, "");
        assert_eq!(lister.requests()[0].prefix, "ORG-1/LAB-2/");
        Ok(())
    }

    #[tokio::test]
    async fn accepts_base64_body() -> anyhow::Result<()> {
        use base64::Engine;
        use base64::engine::general_purpose::STANDARD;

        let lister = RecordingLister::new([ListPage::default()]);
        let server = server(ObjectStorage::from(lister.clone())).await?;

        let body = STANDARD.encode(r#"{"LaboratoryId":"LAB-1"}"#);
        let response = server
            .post("/objects/list")
            .authorization_bearer(token(&["org/ORG-1/admin"]))
            .text(body)
            .await;
        response.assert_status_ok();
        assert_eq!(lister.requests().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn caller_without_capability_is_forbidden() -> anyhow::Result<()> {
        let lister = RecordingLister::new([]);
        let server = server(ObjectStorage::from(lister.clone())).await?;

        let response = server
            .post("/objects/list")
            .authorization_bearer(token(&["org/ORG-1/lab/LAB-2/technician", "org/ORG-2/admin"]))
            .json(&json!({ "LaboratoryId": "LAB-1" }))
            .await;
        response.assert_status_forbidden();

        assert!(lister.requests().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn missing_laboratory_id_is_bad_request() -> anyhow::Result<()> {
        let lister = RecordingLister::new([]);
        let server = server(ObjectStorage::from(lister.clone())).await?;

        let response = server
            .post("/objects/list")
            .authorization_bearer(token(&["org/ORG-1/admin"]))
            .json(&json!({ "S3Bucket": "genomics" }))
            .await;
        response.assert_status_bad_request();

        let body = response.json::<serde_json::Value>();
        assert_eq!(body["name"], "bad_request");
        assert!(lister.requests().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn unknown_field_is_bad_request() -> anyhow::Result<()> {
        let server = server(ObjectStorage::from(RecordingLister::new([]))).await?;

        let response = server
            .post("/objects/list")
            .authorization_bearer(token(&["org/ORG-1/admin"]))
            .json(&json!({ "LaboratoryId": "LAB-1", "Delimiter": "|" }))
            .await;
        response.assert_status_bad_request();
        Ok(())
    }

    #[tokio::test]
    async fn oversized_page_size_is_clamped() -> anyhow::Result<()> {
        let lister = RecordingLister::new([ListPage::default(), ListPage::default()]);
        let server = server(ObjectStorage::from(lister.clone())).await?;

        for max_keys in [5000, 0] {
            server
                .post("/objects/list")
                .authorization_bearer(token(&["org/ORG-1/admin"]))
                .json(&json!({ "LaboratoryId": "LAB-1", "MaxKeys": max_keys }))
                .await
                .assert_status_ok();
        }

        let requests = lister.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].max_keys, 1000);
        assert_eq!(requests[1].max_keys, 1);
        Ok(())
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() -> anyhow::Result<()> {
        let server = server(ObjectStorage::from(RecordingLister::new([]))).await?;

        let response = server
            .post("/objects/list")
            .json(&json!({ "LaboratoryId": "LAB-1" }))
            .await;
        response.assert_status_unauthorized();

        let body = response.json::<serde_json::Value>();
        assert_eq!(body["name"], "missing_auth_token");
        Ok(())
    }

    #[tokio::test]
    async fn unknown_laboratory_is_internal_error() -> anyhow::Result<()> {
        let lister = RecordingLister::new([]);
        let server = server(ObjectStorage::from(lister.clone())).await?;

        let response = server
            .post("/objects/list")
            .authorization_bearer(token(&["org/ORG-1/admin"]))
            .json(&json!({ "LaboratoryId": "LAB-9" }))
            .await;
        response.assert_status_internal_server_error();

        let body = response.json::<serde_json::Value>();
        assert_eq!(
            body,
            json!({ "name": "internal_server_error", "message": "Internal server error." })
        );
        assert!(lister.requests().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn storage_failure_is_internal_error() -> anyhow::Result<()> {
        let lister = RecordingLister::new([page(numbered(0..10), Some("token-1"), "req-1")]);
        let server = server(ObjectStorage::from(lister.clone())).await?;

        let response = server
            .post("/objects/list")
            .authorization_bearer(token(&["org/ORG-1/admin"]))
            .json(&json!({ "LaboratoryId": "LAB-1" }))
            .await;
        response.assert_status_internal_server_error();

        let body = response.json::<serde_json::Value>();
        assert!(!body.to_string().contains("scripted"));
        assert_eq!(lister.requests().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_continuation_token_is_internal_error() -> anyhow::Result<()> {
        struct RejectingLister;

        #[async_trait::async_trait]
        impl ObjectLister for RejectingLister {
            async fn list_page(&self, _: &ListPageRequest) -> seqvault_storage::Result<ListPage> {
                Err(seqvault_storage::Error::invalid_input()
                    .with_message("The continuation token is not valid"))
            }
        }

        let server = server(ObjectStorage::from(Arc::new(RejectingLister))).await?;

        let response = server
            .post("/objects/list")
            .authorization_bearer(token(&["org/ORG-1/admin"]))
            .json(&json!({ "LaboratoryId": "LAB-1" }))
            .await;
        response.assert_status_internal_server_error();
        assert_eq!(
            response.json::<serde_json::Value>(),
            json!({ "name": "internal_server_error", "message": "Internal server error." })
        );
        Ok(())
    }

    #[tokio::test]
    async fn truncated_page_without_token_is_internal_error() -> anyhow::Result<()> {
        let truncated = ListPage {
            is_truncated: true,
            ..page(numbered(0..10), None, "req-1")
        };
        let lister = RecordingLister::new([truncated]);
        let server = server(ObjectStorage::from(lister.clone())).await?;

        let response = server
            .post("/objects/list")
            .authorization_bearer(token(&["org/ORG-1/admin"]))
            .json(&json!({ "LaboratoryId": "LAB-1" }))
            .await;
        response.assert_status_internal_server_error();
        assert_eq!(lister.requests().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn lists_memory_store_end_to_end() -> anyhow::Result<()> {
        let lister = MemoryLister::with_objects(
            "genomics",
            [
                "ORG-1/LAB-1/",
                "ORG-1/LAB-1/readme.txt",
                "ORG-1/LAB-1/run-1/a.fastq",
                "ORG-1/LAB-1/run-2/b.fastq",
                "ORG-1/LAB-1/sample.vcf",
            ]
            .into_iter()
            .map(ObjectEntry::new),
        );
        let lister = Arc::new(lister);
        let server = server(ObjectStorage::from(lister.clone())).await?;

        let response = server
            .post("/objects/list")
            .authorization_bearer(token(&["org/ORG-1/lab/LAB-1/technician"]))
            .json(&json!({ "LaboratoryId": "LAB-1", "MaxKeys": 2 }))
            .await;
        response.assert_status_ok();

        let listing = response.json::<AggregatedListing>();
        let keys: Vec<_> = listing.contents.iter().map(|e| e.key.as_str()).collect();
        let prefixes: Vec<_> = listing
            .common_prefixes
            .iter()
            .map(|p| p.prefix.as_str())
            .collect();

        assert_eq!(
            keys,
            ["ORG-1/LAB-1/", "ORG-1/LAB-1/readme.txt", "ORG-1/LAB-1/sample.vcf"]
        );
        assert_eq!(prefixes, ["ORG-1/LAB-1/run-1/", "ORG-1/LAB-1/run-2/"]);
        assert_eq!(lister.calls(), 3);
        Ok(())
    }
}
