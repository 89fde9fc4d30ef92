//! S3-compatible lister backed by the AWS SDK.
//!
//! Works with AWS S3, MinIO, and any S3-compatible service.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use aws_sdk_s3::Client;
use aws_sdk_s3::config::interceptors::{
    BeforeTransmitInterceptorContextRef, FinalizerInterceptorContextRef,
};
use aws_sdk_s3::config::{
    Builder, ConfigBag, Credentials, Intercept, Region, RuntimeComponents,
};
use aws_sdk_s3::error::BoxError;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
use aws_sdk_s3::operation::{RequestId, RequestIdExt};
use aws_sdk_s3::types::{CommonPrefix, Object};
#[cfg(feature = "config")]
use clap::Args;
use jiff::Timestamp;
use seqvault_core::{ObjectEntry, PrefixEntry, ResponseMetadata};
use serde::{Deserialize, Serialize};

use crate::{Error, ErrorKind, ListPage, ListPageRequest, ObjectLister, ObjectStorage, Result};

/// Tracing target for S3 operations.
const TRACING_TARGET: &str = "seqvault_storage::s3";

/// Default region used when none is configured or discovered.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for the S3 lister.
///
/// Credentials fall back to the default AWS provider chain (environment,
/// profile, instance metadata) when no static keys are configured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[serde(rename_all = "camelCase")]
pub struct S3Config {
    /// AWS region of the bucket
    #[cfg_attr(feature = "config", arg(long = "s3-region", env = "S3_REGION"))]
    #[serde(default)]
    pub region: Option<String>,

    /// Endpoint URL for S3-compatible services (e.g. `http://localhost:9000`)
    #[cfg_attr(feature = "config", arg(long = "s3-endpoint", env = "S3_ENDPOINT"))]
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Use path-style addressing (required by most self-hosted services)
    #[cfg_attr(
        feature = "config",
        arg(long = "s3-force-path-style", env = "S3_FORCE_PATH_STYLE", default_value = "false")
    )]
    #[serde(default)]
    pub force_path_style: bool,

    /// Static access key ID
    #[cfg_attr(feature = "config", arg(long = "s3-access-key-id", env = "S3_ACCESS_KEY_ID"))]
    #[serde(default)]
    pub access_key_id: Option<String>,

    /// Static secret access key
    #[cfg_attr(
        feature = "config",
        arg(long = "s3-secret-access-key", env = "S3_SECRET_ACCESS_KEY", hide_env_values = true)
    )]
    #[serde(default, skip_serializing)]
    pub secret_access_key: Option<String>,
}

impl S3Config {
    /// Sets the region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Sets a custom endpoint and switches to path-style addressing.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self.force_path_style = true;
        self
    }

    /// Sets static credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Returns the static credentials, if both halves are configured.
    fn static_credentials(&self) -> Result<Option<Credentials>> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(key), Some(secret)) => Ok(Some(Credentials::new(
                key, secret, None, None, "seqvault",
            ))),
            (None, None) => Ok(None),
            _ => Err(Error::configuration()
                .with_message("S3 access key ID and secret access key must be set together")),
        }
    }
}

/// Attempts, final HTTP status and backoff of one SDK call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CallStats {
    attempts: u32,
    status: Option<u16>,
    retry_delay: Duration,
    last_attempt_end: Option<Instant>,
}

impl CallStats {
    fn begin_attempt(&mut self, now: Instant) {
        self.attempts += 1;
        if let Some(end) = self.last_attempt_end.take() {
            self.retry_delay += now.saturating_duration_since(end);
        }
    }

    fn end_attempt(&mut self, status: Option<u16>, now: Instant) {
        if status.is_some() {
            self.status = status;
        }
        self.last_attempt_end = Some(now);
    }

    fn metadata(&self, request_id: Option<&str>, extended_request_id: Option<&str>) -> ResponseMetadata {
        ResponseMetadata {
            http_status_code: self.status.unwrap_or(200),
            request_id: request_id.map(str::to_owned),
            extended_request_id: extended_request_id.map(str::to_owned),
            attempts: (self.attempts > 0).then_some(self.attempts),
            total_retry_delay: (self.attempts > 0)
                .then(|| u64::try_from(self.retry_delay.as_millis()).unwrap_or(u64::MAX)),
        }
    }
}

/// Interceptor filling [`CallStats`] for the call it is attached to.
#[derive(Debug, Clone, Default)]
struct CallRecorder {
    stats: Arc<Mutex<CallStats>>,
}

impl CallRecorder {
    fn update(&self, update: impl FnOnce(&mut CallStats)) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        update(&mut *stats);
    }

    fn stats(&self) -> CallStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Intercept for CallRecorder {
    fn name(&self) -> &'static str {
        "SeqvaultCallRecorder"
    }

    fn read_before_attempt(
        &self,
        _context: &BeforeTransmitInterceptorContextRef<'_>,
        _runtime_components: &RuntimeComponents,
        _cfg: &mut ConfigBag,
    ) -> Result<(), BoxError> {
        self.update(|stats| stats.begin_attempt(Instant::now()));
        Ok(())
    }

    fn read_after_attempt(
        &self,
        context: &FinalizerInterceptorContextRef<'_>,
        _runtime_components: &RuntimeComponents,
        _cfg: &mut ConfigBag,
    ) -> Result<(), BoxError> {
        let status = context.response().map(|response| response.status().as_u16());
        self.update(|stats| stats.end_attempt(status, Instant::now()));
        Ok(())
    }
}

/// Object lister talking to an S3-compatible endpoint.
#[derive(Debug, Clone)]
pub struct S3Lister {
    client: Client,
}

impl S3Lister {
    /// Wraps an already configured SDK client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Loads the shared AWS configuration and applies the overrides in `config`.
    pub async fn connect(config: &S3Config) -> Result<Self> {
        let credentials = config.static_credentials()?;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(credentials) = credentials {
            loader = loader.credentials_provider(credentials);
        }
        let shared = loader.load().await;

        let mut builder = Builder::from(&shared).force_path_style(config.force_path_style);
        if shared.region().is_none() {
            builder = builder.region(Region::new(DEFAULT_REGION));
        }
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        tracing::info!(
            target: TRACING_TARGET,
            region = ?config.region,
            endpoint = ?config.endpoint,
            force_path_style = config.force_path_style,
            "S3 client configured"
        );

        Ok(Self::new(Client::from_conf(builder.build())))
    }

    /// Converts this lister into an [`ObjectStorage`] handle.
    pub fn into_storage(self) -> ObjectStorage {
        ObjectStorage::new(self)
    }

    fn convert_object(object: &Object) -> Option<ObjectEntry> {
        let Some(key) = object.key() else {
            tracing::debug!(target: TRACING_TARGET, "Skipping object without a key");
            return None;
        };

        let last_modified = object
            .last_modified()
            .and_then(|time| Timestamp::new(time.secs(), time.subsec_nanos() as i32).ok());

        Some(ObjectEntry {
            key: key.to_owned(),
            last_modified,
            e_tag: object.e_tag().map(str::to_owned),
            size: object.size(),
            storage_class: object.storage_class().map(|class| class.as_str().to_owned()),
        })
    }

    fn convert_prefix(prefix: &CommonPrefix) -> Option<PrefixEntry> {
        prefix.prefix().map(PrefixEntry::new)
    }

    fn convert_output(output: &ListObjectsV2Output, stats: &CallStats) -> ListPage {
        let metadata = stats.metadata(output.request_id(), output.extended_request_id());

        ListPage {
            contents: output
                .contents()
                .iter()
                .filter_map(Self::convert_object)
                .collect(),
            common_prefixes: output
                .common_prefixes()
                .iter()
                .filter_map(Self::convert_prefix)
                .collect(),
            is_truncated: output.is_truncated().unwrap_or(false),
            next_continuation_token: output.next_continuation_token().map(str::to_owned),
            metadata,
        }
    }
}

#[async_trait::async_trait]
impl ObjectLister for S3Lister {
    #[tracing::instrument(
        name = "s3.list_objects_v2",
        skip_all,
        fields(bucket = %request.bucket, prefix = %request.prefix, max_keys = request.max_keys)
    )]
    async fn list_page(&self, request: &ListPageRequest) -> Result<ListPage> {
        let max_keys = i32::try_from(request.max_keys).unwrap_or(i32::MAX);
        let recorder = CallRecorder::default();

        let output = self
            .client
            .list_objects_v2()
            .bucket(&request.bucket)
            .prefix(&request.prefix)
            .delimiter(&request.delimiter)
            .max_keys(max_keys)
            .set_continuation_token(request.continuation_token.clone())
            .customize()
            .interceptor(recorder.clone())
            .send()
            .await
            .map_err(|err| {
                let stats = recorder.stats();
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %err,
                    bucket = %request.bucket,
                    attempts = stats.attempts,
                    status = ?stats.status,
                    "List objects call failed"
                );
                Error::from_source(ErrorKind::ExternalError, err)
                    .with_message("Object store list call failed")
                    .with_context(request.bucket.clone())
            })?;

        let page = Self::convert_output(&output, &recorder.stats());

        tracing::debug!(
            target: TRACING_TARGET,
            objects = page.contents.len(),
            prefixes = page.common_prefixes.len(),
            is_truncated = page.is_truncated,
            request_id = ?page.metadata.request_id,
            attempts = ?page.metadata.attempts,
            "List objects call completed"
        );

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_s3::primitives::DateTime;
    use aws_sdk_s3::types::ObjectStorageClass;

    use super::*;

    #[test]
    fn converts_object_fields() {
        let object = Object::builder()
            .key("ORG/LAB/a.fastq")
            .size(1024)
            .e_tag("\"abc\"")
            .storage_class(ObjectStorageClass::Standard)
            .last_modified(DateTime::from_secs(1_700_000_000))
            .build();

        let entry = S3Lister::convert_object(&object).unwrap();
        assert_eq!(entry.key, "ORG/LAB/a.fastq");
        assert_eq!(entry.size, Some(1024));
        assert_eq!(entry.e_tag.as_deref(), Some("\"abc\""));
        assert_eq!(entry.storage_class.as_deref(), Some("STANDARD"));
        assert_eq!(
            entry.last_modified.map(|time| time.as_second()),
            Some(1_700_000_000)
        );
    }

    #[test]
    fn skips_object_without_key() {
        let object = Object::builder().size(1).build();
        assert!(S3Lister::convert_object(&object).is_none());
    }

    #[test]
    fn converts_output_with_absent_lists() {
        let output = ListObjectsV2Output::builder()
            .is_truncated(true)
            .next_continuation_token("token-2")
            .build();

        let page = S3Lister::convert_output(&output, &CallStats::default());
        assert!(page.contents.is_empty());
        assert!(page.common_prefixes.is_empty());
        assert!(page.is_truncated);
        assert_eq!(page.next_continuation_token.as_deref(), Some("token-2"));
        assert_eq!(page.metadata.http_status_code, 200);
        assert_eq!(page.metadata.attempts, None);
    }

    #[test]
    fn metadata_reports_retries() {
        let start = Instant::now();
        let mut stats = CallStats::default();

        stats.begin_attempt(start);
        stats.end_attempt(Some(503), start + Duration::from_millis(20));
        stats.begin_attempt(start + Duration::from_millis(120));
        stats.end_attempt(Some(200), start + Duration::from_millis(140));

        let output = ListObjectsV2Output::builder().build();
        let metadata = S3Lister::convert_output(&output, &stats).metadata;
        assert_eq!(metadata.http_status_code, 200);
        assert_eq!(metadata.attempts, Some(2));
        assert_eq!(metadata.total_retry_delay, Some(100));
    }

    #[test]
    fn attempt_without_response_keeps_last_status() {
        let start = Instant::now();
        let mut stats = CallStats::default();

        stats.begin_attempt(start);
        stats.end_attempt(Some(500), start);
        stats.begin_attempt(start);
        stats.end_attempt(None, start);

        let metadata = stats.metadata(Some("req-1"), None);
        assert_eq!(metadata.http_status_code, 500);
        assert_eq!(metadata.attempts, Some(2));
        assert_eq!(metadata.request_id.as_deref(), Some("req-1"));
    }

    #[test]
    fn converts_common_prefixes() {
        let output = ListObjectsV2Output::builder()
            .common_prefixes(CommonPrefix::builder().prefix("ORG/LAB/run-1/").build())
            .build();

        let page = S3Lister::convert_output(&output, &CallStats::default());
        assert_eq!(page.common_prefixes, [PrefixEntry::new("ORG/LAB/run-1/")]);
        assert!(!page.is_truncated);
    }

    #[test]
    fn partial_credentials_are_rejected() {
        let config = S3Config {
            access_key_id: Some("key".to_owned()),
            ..S3Config::default()
        };
        let error = config.static_credentials().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);

        let config = S3Config::default().with_credentials("key", "secret");
        assert!(config.static_credentials().unwrap().is_some());
    }

    #[test]
    fn endpoint_enables_path_style() {
        let config = S3Config::default()
            .with_region("eu-west-1")
            .with_endpoint("http://localhost:9000");
        assert!(config.force_path_style);
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
    }
}
