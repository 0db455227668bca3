//! Per-case fixtures.
//!
//! The driver calls [`FixtureProvider::setup`] before a case body and
//! [`FixtureProvider::teardown`] after it, whatever the body did.
//! [`S3Provider`] is the production provider: it builds an S3 client bound to
//! the target and, when the target owns the bucket lifecycle, creates and
//! deletes the bucket around every case.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::{Region, RequestChecksumCalculation, ResponseChecksumValidation};
use aws_sdk_s3::operation::get_object::GetObjectOutput;
use aws_sdk_s3::operation::head_object::{HeadObjectError, HeadObjectOutput};
use aws_sdk_s3::operation::list_multipart_uploads::ListMultipartUploadsOutput;
use aws_sdk_s3::operation::put_object::PutObjectOutput;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use rand::Rng;
use s3test_core::Target;
use tracing::{debug, warn};

use crate::error::FixtureError;
use crate::wire::WireLogger;

/// DeleteObjects accepts at most this many keys per request.
const MAX_DELETE_BATCH: usize = 1000;

/// Lifecycle hooks around a case body.
#[async_trait]
pub trait FixtureProvider: Send + Sync {
    /// State handed to the case body.
    type Fixture: Send + Sync;

    /// Prepares a fixture for one case. On error the provider has already
    /// released whatever it acquired.
    async fn setup(&self, target: &Target) -> Result<Self::Fixture, FixtureError>;

    /// Cleans up after a case. Called exactly once per successful setup.
    async fn teardown(&self, fixture: Self::Fixture) -> Result<(), FixtureError>;
}

/// Fixture handed to catalog cases: a client bound to the target and its bucket.
#[derive(Debug, Clone)]
pub struct S3Fixture {
    /// The S3 client for making requests.
    pub client: Client,
    /// The bucket cases operate on.
    pub bucket: String,
    owns_bucket: bool,
}

impl S3Fixture {
    /// Put an object with the given key and data.
    pub async fn put(&self, key: &str, data: &[u8]) -> anyhow::Result<PutObjectOutput> {
        let output = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await?;
        Ok(output)
    }

    /// Get an object's content.
    pub async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        let response = self.get_object(key).await?;
        Ok(response.body.collect().await?.into_bytes().to_vec())
    }

    /// Get an object (full response).
    pub async fn get_object(&self, key: &str) -> anyhow::Result<GetObjectOutput> {
        Ok(self.client.get_object().bucket(&self.bucket).key(key).send().await?)
    }

    /// Head an object.
    pub async fn head(&self, key: &str) -> anyhow::Result<HeadObjectOutput> {
        Ok(self.client.head_object().bucket(&self.bucket).key(key).send().await?)
    }

    /// Check if an object exists. Only a 404 counts as absent; any other failure is an error.
    pub async fn exists(&self, key: &str) -> anyhow::Result<bool> {
        match self.client.head_object().bucket(&self.bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// List every key in the bucket (V2, following continuation tokens).
    pub async fn list_keys(&self) -> anyhow::Result<Vec<String>> {
        self.list_keys_with_prefix(None).await
    }

    /// List every key under `prefix`.
    pub async fn list_keys_with_prefix(&self, prefix: Option<&str>) -> anyhow::Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_prefix(prefix.map(str::to_string))
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            keys.extend(page?.contents().iter().filter_map(|o| o.key().map(str::to_string)));
        }
        Ok(keys)
    }
}

/// Builds S3 clients for the target and manages its bucket.
#[derive(Debug, Default, Clone, Copy)]
pub struct S3Provider;

impl S3Provider {
    /// Create an S3 client for the target.
    pub fn create_client(target: &Target) -> Client {
        let creds = target.credentials();
        let credentials = Credentials::new(
            &creds.access_key,
            &creds.secret_key,
            creds.session_token.clone(),
            None,
            "s3test",
        );

        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(target.region().to_string()))
            .endpoint_url(target.endpoint())
            .credentials_provider(credentials)
            .force_path_style(target.path_style())
            // Cases ask for checksums explicitly
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .interceptor(WireLogger)
            .build();

        Client::from_conf(config)
    }

    async fn clear_bucket(client: &Client, bucket: &str) -> Result<(), FixtureError> {
        let mut markers: (Option<String>, Option<String>) = (None, None);
        loop {
            let page = client
                .list_multipart_uploads()
                .bucket(bucket)
                .set_key_marker(markers.0.take())
                .set_upload_id_marker(markers.1.take())
                .send()
                .await
                .map_err(|e| FixtureError::clear_bucket(bucket, e))?;
            for upload in page.uploads() {
                let (Some(key), Some(upload_id)) = (upload.key(), upload.upload_id()) else {
                    continue;
                };
                debug!(bucket, key, upload_id, "Aborting multipart upload");
                client
                    .abort_multipart_upload()
                    .bucket(bucket)
                    .key(key)
                    .upload_id(upload_id)
                    .send()
                    .await
                    .map_err(|e| FixtureError::clear_bucket(bucket, e))?;
            }
            match next_upload_markers(&page) {
                Some(next) => markers = next,
                None => break,
            }
        }

        let mut keys = Vec::new();
        let mut pages = client.list_objects_v2().bucket(bucket).into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| FixtureError::clear_bucket(bucket, e))?;
            keys.extend(page.contents().iter().filter_map(|o| o.key().map(str::to_string)));
        }

        for chunk in keys.chunks(MAX_DELETE_BATCH) {
            let objects = chunk
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<Result<Vec<_>, _>>()?;

            debug!(bucket, count = objects.len(), "Deleting objects");
            let delete = Delete::builder().set_objects(Some(objects)).quiet(true).build()?;
            let output = client
                .delete_objects()
                .bucket(bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| FixtureError::clear_bucket(bucket, e))?;
            for error in output.errors() {
                warn!(
                    bucket,
                    key = error.key().unwrap_or_default(),
                    code = error.code().unwrap_or_default(),
                    "Object could not be deleted during teardown"
                );
            }
        }
        Ok(())
    }
}

/// Markers for the next ListMultipartUploads page, or `None` after the last one.
///
/// A truncated page without a key marker ends the listing rather than restarting it.
fn next_upload_markers(
    page: &ListMultipartUploadsOutput,
) -> Option<(Option<String>, Option<String>)> {
    if page.is_truncated() != Some(true) {
        return None;
    }
    let key_marker = page.next_key_marker()?;
    Some((Some(key_marker.to_string()), page.next_upload_id_marker().map(str::to_string)))
}

#[async_trait]
impl FixtureProvider for S3Provider {
    type Fixture = S3Fixture;

    async fn setup(&self, target: &Target) -> Result<S3Fixture, FixtureError> {
        let client = Self::create_client(target);
        let bucket = target.bucket().to_string();

        if target.create_bucket() {
            debug!(bucket = %bucket, "Creating bucket");
            client
                .create_bucket()
                .bucket(&bucket)
                .send()
                .await
                .map_err(|e| FixtureError::create_bucket(&bucket, e))?;
        }

        Ok(S3Fixture { client, bucket, owns_bucket: target.create_bucket() })
    }

    async fn teardown(&self, fixture: S3Fixture) -> Result<(), FixtureError> {
        let S3Fixture { client, bucket, owns_bucket } = fixture;
        let cleared = Self::clear_bucket(&client, &bucket).await;

        // Delete the bucket even when clearing failed.
        let deleted = if owns_bucket {
            debug!(bucket = %bucket, "Deleting bucket");
            client
                .delete_bucket()
                .bucket(&bucket)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| FixtureError::delete_bucket(&bucket, e))
        } else {
            Ok(())
        };

        drop(client);
        cleared.and(deleted)
    }
}

fn is_not_found(err: &SdkError<HeadObjectError, HttpResponse>) -> bool {
    err.as_service_error().is_some_and(HeadObjectError::is_not_found)
        || err.raw_response().is_some_and(|r| r.status().as_u16() == 404)
}

// =============================================================================
// Test Data Helpers
// =============================================================================

/// Generate random bytes of the given size.
pub fn random_bytes(size: usize) -> Vec<u8> {
    let mut data = vec![0u8; size];
    rand::thread_rng().fill(&mut data[..]);
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_upload_page_stops() {
        let page = ListMultipartUploadsOutput::builder().is_truncated(false).build();
        assert_eq!(next_upload_markers(&page), None);

        let page = ListMultipartUploadsOutput::builder().next_key_marker("a").build();
        assert_eq!(next_upload_markers(&page), None);
    }

    #[test]
    fn test_truncated_upload_page_continues() {
        let page = ListMultipartUploadsOutput::builder()
            .is_truncated(true)
            .next_key_marker("dir/key")
            .next_upload_id_marker("upload-2")
            .build();
        assert_eq!(
            next_upload_markers(&page),
            Some((Some("dir/key".to_string()), Some("upload-2".to_string())))
        );

        let page =
            ListMultipartUploadsOutput::builder().is_truncated(true).next_key_marker("k").build();
        assert_eq!(next_upload_markers(&page), Some((Some("k".to_string()), None)));
    }

    #[test]
    fn test_truncated_page_without_marker_stops() {
        let page = ListMultipartUploadsOutput::builder().is_truncated(true).build();
        assert_eq!(next_upload_markers(&page), None);
    }

    #[test]
    fn test_only_not_found_means_absent() {
        let err: SdkError<HeadObjectError, HttpResponse> = SdkError::construction_failure("boom");
        assert!(!is_not_found(&err));

        let err: SdkError<HeadObjectError, HttpResponse> = SdkError::timeout_error("slow");
        assert!(!is_not_found(&err));
    }

    #[test]
    fn test_random_bytes() {
        let data = random_bytes(64);
        assert_eq!(data.len(), 64);
        assert!(random_bytes(0).is_empty());
    }
}
