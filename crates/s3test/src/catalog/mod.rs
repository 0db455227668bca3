// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! The built-in case catalog.
//!
//! Each submodule is one group. Groups run in the order [`groups`] returns
//! them; the group and case names become diagnostics directory names.

use anyhow::{bail, ensure};
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::complete_multipart_upload::CompleteMultipartUploadOutput;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::case::TestGroup;
use crate::fixture::S3Fixture;

pub mod checksum;
pub mod conditional_request;
pub mod delete_object;
pub mod delete_objects;
pub mod get_object;
pub mod list_buckets;
pub mod list_objects;
pub mod multipart_upload;
pub mod object_key;
pub mod prefix_delimiter;
pub mod put_object;

/// Smallest size S3 accepts for a part other than the last.
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

/// Every group, in run order.
pub fn groups() -> Vec<TestGroup<S3Fixture>> {
    vec![
        checksum::group(),
        conditional_request::group(),
        delete_objects::group(),
        delete_object::group(),
        get_object::group(),
        list_buckets::group(),
        list_objects::group(),
        multipart_upload::group(),
        object_key::group(),
        prefix_delimiter::group(),
        put_object::group(),
    ]
}

/// Quoted hex MD5, the ETag of a single-part object.
pub(crate) fn etag_of(data: &[u8]) -> String {
    format!("\"{:x}\"", md5::compute(data))
}

/// ETag of a completed multipart upload: the MD5 of the part digests, suffixed with the part count.
pub(crate) fn multipart_etag_of(parts: &[Vec<u8>]) -> String {
    let mut context = md5::Context::new();
    for part in parts {
        context.consume(md5::compute(part).0);
    }
    format!("\"{:x}-{}\"", context.compute(), parts.len())
}

/// Base64 SHA-256, as carried in `x-amz-checksum-sha256`.
pub(crate) fn sha256_base64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(Sha256::digest(data))
}

/// HTTP status of a failed request, if a response was received.
pub(crate) fn status_of<E>(err: &SdkError<E, HttpResponse>) -> Option<u16> {
    err.raw_response().map(|r| r.status().as_u16())
}

/// Succeeds only if the request failed with `expected`.
pub(crate) fn expect_status<T, E>(
    result: Result<T, SdkError<E, HttpResponse>>,
    expected: u16,
) -> anyhow::Result<()>
where
    E: std::error::Error + Send + Sync + 'static,
{
    match result {
        Ok(_) => bail!("expected HTTP {expected}, but the request succeeded"),
        Err(err) => {
            let status = status_of(&err);
            ensure!(
                status == Some(expected),
                "expected HTTP {expected}, got {status:?}: {}",
                DisplayErrorContext(&err)
            );
            Ok(())
        }
    }
}

/// Succeeds only if the request failed with a 4xx status.
pub(crate) fn expect_client_error<T, E>(
    result: Result<T, SdkError<E, HttpResponse>>,
) -> anyhow::Result<u16>
where
    E: std::error::Error + Send + Sync + 'static,
{
    match result {
        Ok(_) => bail!("expected a client error, but the request succeeded"),
        Err(err) => match status_of(&err) {
            Some(status @ 400..=499) => Ok(status),
            status => {
                bail!("expected a client error, got {status:?}: {}", DisplayErrorContext(&err))
            }
        },
    }
}

/// Uploads `parts` as one multipart object and completes it.
pub(crate) async fn upload_multipart(
    fixture: &S3Fixture,
    key: &str,
    parts: &[Vec<u8>],
) -> anyhow::Result<CompleteMultipartUploadOutput> {
    let client = &fixture.client;
    let created =
        client.create_multipart_upload().bucket(&fixture.bucket).key(key).send().await?;
    let Some(upload_id) = created.upload_id() else {
        bail!("CreateMultipartUpload returned no upload id");
    };

    let mut completed = Vec::with_capacity(parts.len());
    for (number, data) in (1..).zip(parts) {
        let part = client
            .upload_part()
            .bucket(&fixture.bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(number)
            .body(ByteStream::from(data.clone()))
            .send()
            .await?;
        completed.push(
            CompletedPart::builder()
                .part_number(number)
                .set_e_tag(part.e_tag().map(str::to_string))
                .build(),
        );
    }

    let output = client
        .complete_multipart_upload()
        .bucket(&fixture.bucket)
        .key(key)
        .upload_id(upload_id)
        .multipart_upload(CompletedMultipartUpload::builder().set_parts(Some(completed)).build())
        .send()
        .await?;
    Ok(output)
}
