//! Object listing wire types.
//!
//! Field names follow the object store's own response shape so clients can
//! consume aggregated listings the same way they would consume a single page.

use jiff::Timestamp;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Delimiter used to roll keys up into "folders".
pub const DEFAULT_DELIMITER: &str = "/";

/// Page size used when the request does not specify one.
pub const DEFAULT_MAX_KEYS: u32 = 1000;

/// Largest page an S3 `ListObjectsV2` call returns.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Request body accepted by the listing endpoint.
///
/// Unknown fields are rejected. Everything except the laboratory identifier
/// falls back to a value derived from the laboratory record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ListingRequest {
    /// Laboratory whose storage is listed.
    #[validate(length(min = 1))]
    pub laboratory_id: String,
    /// Bucket override; defaults to the laboratory's bucket.
    #[serde(default, rename = "S3Bucket", skip_serializing_if = "Option::is_none")]
    pub s3_bucket: Option<String>,
    /// Prefix override; defaults to `{organizationId}/{laboratoryId}/`.
    #[serde(default, rename = "S3Prefix", skip_serializing_if = "Option::is_none")]
    pub s3_prefix: Option<String>,
    /// Page size for each underlying list call, see [`page_size`](Self::page_size).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_keys: Option<u32>,
}

impl ListingRequest {
    /// Creates a request for the given laboratory with every other field defaulted.
    pub fn new(laboratory_id: impl Into<String>) -> Self {
        Self {
            laboratory_id: laboratory_id.into(),
            ..Self::default()
        }
    }

    /// Sets the bucket override.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.s3_bucket = Some(bucket.into());
        self
    }

    /// Sets the prefix override.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.s3_prefix = Some(prefix.into());
        self
    }

    /// Sets the page size.
    pub fn with_max_keys(mut self, max_keys: u32) -> Self {
        self.max_keys = Some(max_keys);
        self
    }

    /// Returns the page size: `MaxKeys` clamped into `1..=MAX_PAGE_SIZE`, or
    /// [`DEFAULT_MAX_KEYS`] when absent.
    pub fn page_size(&self) -> u32 {
        self.max_keys
            .map_or(DEFAULT_MAX_KEYS, |max_keys| max_keys.clamp(1, MAX_PAGE_SIZE))
    }
}

/// One stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "PascalCase")]
pub struct ObjectEntry {
    /// Full object key.
    pub key: String,
    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,
    /// Entity tag as reported by the store (usually quoted).
    #[serde(default, rename = "ETag", skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,
    /// Object size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    /// Storage class name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
}

impl ObjectEntry {
    /// Creates an entry that only carries a key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            last_modified: None,
            e_tag: None,
            size: None,
            storage_class: None,
        }
    }

    /// Sets the object size.
    pub fn with_size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the last modification time.
    pub fn with_last_modified(mut self, last_modified: Timestamp) -> Self {
        self.last_modified = Some(last_modified);
        self
    }
}

/// A "folder" marker at the requested level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "PascalCase")]
pub struct PrefixEntry {
    /// Full prefix, including the trailing delimiter.
    pub prefix: String,
}

impl PrefixEntry {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

/// Per-call metadata reported by the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub http_status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    /// Total retry delay in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_retry_delay: Option<u64>,
}

impl Default for ResponseMetadata {
    fn default() -> Self {
        Self {
            http_status_code: 200,
            request_id: None,
            extended_request_id: None,
            attempts: None,
            total_retry_delay: None,
        }
    }
}

impl ResponseMetadata {
    /// Sets the request id.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Every page of a listing concatenated into one response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "PascalCase")]
pub struct AggregatedListing {
    /// Metadata of the first underlying call.
    #[serde(rename = "$metadata")]
    pub metadata: ResponseMetadata,
    #[serde(default)]
    pub contents: Vec<ObjectEntry>,
    #[serde(default)]
    pub common_prefixes: Vec<PrefixEntry>,
    /// Always `false` once aggregation completes.
    #[serde(default)]
    pub is_truncated: bool,
}

impl AggregatedListing {
    /// Creates an empty listing carrying the given metadata.
    pub fn new(metadata: ResponseMetadata) -> Self {
        Self {
            metadata,
            contents: Vec::new(),
            common_prefixes: Vec::new(),
            is_truncated: false,
        }
    }

    /// Appends one page in arrival order.
    pub fn extend_page(
        &mut self,
        contents: impl IntoIterator<Item = ObjectEntry>,
        common_prefixes: impl IntoIterator<Item = PrefixEntry>,
    ) {
        self.contents.extend(contents);
        self.common_prefixes.extend(common_prefixes);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_uses_pascal_case() {
        let request: ListingRequest = serde_json::from_value(json!({
            "LaboratoryId": "LAB-1",
            "S3Bucket": "bucket",
            "S3Prefix": "ORG/LAB-1/runs/",
            "MaxKeys": 250,
        }))
        .unwrap();

        assert_eq!(request.laboratory_id, "LAB-1");
        assert_eq!(request.s3_bucket.as_deref(), Some("bucket"));
        assert_eq!(request.s3_prefix.as_deref(), Some("ORG/LAB-1/runs/"));
        assert_eq!(request.page_size(), 250);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn request_rejects_unknown_fields() {
        let result = serde_json::from_value::<ListingRequest>(json!({
            "LaboratoryId": "LAB-1",
            "Delimiter": "|",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn request_requires_laboratory() {
        let result = serde_json::from_value::<ListingRequest>(json!({ "S3Bucket": "bucket" }));
        assert!(result.is_err());

        let request = ListingRequest::new("");
        assert!(request.validate().is_err());
    }

    #[test]
    fn page_size_is_clamped_not_rejected() {
        for (max_keys, page_size) in [(0, 1), (1, 1), (250, 250), (1000, 1000), (5000, 1000)] {
            let request = ListingRequest::new("LAB-1").with_max_keys(max_keys);
            assert!(request.validate().is_ok(), "MaxKeys {max_keys}");
            assert_eq!(request.page_size(), page_size, "MaxKeys {max_keys}");
        }
        assert_eq!(ListingRequest::new("LAB-1").page_size(), DEFAULT_MAX_KEYS);
    }

    #[test]
    fn object_entry_omits_unknown_fields() {
        let value = serde_json::to_value(ObjectEntry::new("a/b.fastq").with_size(42)).unwrap();
        assert_eq!(value, json!({ "Key": "a/b.fastq", "Size": 42 }));
    }

    #[test]
    fn object_entry_etag_name() {
        let entry: ObjectEntry = serde_json::from_value(json!({
            "Key": "a",
            "ETag": "\"abc\"",
            "LastModified": "2024-03-01T12:00:00Z",
        }))
        .unwrap();
        assert_eq!(entry.e_tag.as_deref(), Some("\"abc\""));
        assert!(entry.last_modified.is_some());
    }

    #[test]
    fn aggregated_listing_shape() {
        let mut listing =
            AggregatedListing::new(ResponseMetadata::default().with_request_id("req-1"));
        listing.extend_page(vec![ObjectEntry::new("a")], vec![PrefixEntry::new("p/")]);
        listing.extend_page(vec![ObjectEntry::new("b")], Vec::new());

        let value = serde_json::to_value(&listing).unwrap();
        assert_eq!(value["$metadata"]["httpStatusCode"], 200);
        assert_eq!(value["$metadata"]["requestId"], "req-1");
        assert_eq!(value["Contents"][0]["Key"], "a");
        assert_eq!(value["Contents"][1]["Key"], "b");
        assert_eq!(value["CommonPrefixes"][0]["Prefix"], "p/");
        assert_eq!(value["IsTruncated"], false);
    }

    #[test]
    fn empty_listing_keeps_arrays() {
        let value = serde_json::to_value(AggregatedListing::default()).unwrap();
        assert_eq!(value["Contents"], json!([]));
        assert_eq!(value["CommonPrefixes"], json!([]));
    }
}
