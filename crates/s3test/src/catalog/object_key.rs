// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Object key encoding: unicode, control characters and invalid UTF-8.

use anyhow::ensure;
use aws_sdk_s3::primitives::ByteStream;

use super::{expect_client_error, status_of};
use crate::case::{CaseResult, TestGroup};
use crate::fixture::S3Fixture;
use crate::test_case;

/// Stand-in replaced on the wire by an invalid UTF-8 sequence.
const INVALID_UTF8_PLACEHOLDER: &str = "INVALIDUTF8";

pub(crate) fn group() -> TestGroup<S3Fixture> {
    TestGroup::new(
        "object_key",
        vec![
            test_case!(object_key_unicode),
            test_case!(object_key_codepoint_min, skip_for = [KeysWithCodepointMinRejected]),
            test_case!(object_key_outside_bmp, skip_for = [KeysWithCodepointsOutsideBmpRejected]),
            test_case!(object_key_with_null_rejected, skip_for = [KeysWithNullNotRejected]),
            test_case!(object_key_with_null_not_truncated, skip_for = [KeysWithNullAreTruncated]),
            test_case!(
                object_key_invalid_utf8_rejected,
                skip_for = [KeysWithInvalidUtf8NotRejected]
            ),
        ],
    )
}

async fn round_trip(fixture: &S3Fixture, key: &str) -> CaseResult {
    fixture.put(key, key.as_bytes()).await?;
    ensure!(fixture.get(key).await? == key.as_bytes(), "content of {key:?} differs");

    let keys = fixture.list_keys().await?;
    ensure!(keys == [key], "expected only {key:?} in listing, got {keys:?}");
    Ok(())
}

async fn object_key_unicode(fixture: &S3Fixture) -> CaseResult {
    round_trip(fixture, "ünïcödé/ключ/键").await
}

async fn object_key_codepoint_min(fixture: &S3Fixture) -> CaseResult {
    round_trip(fixture, "min\u{1}key").await
}

async fn object_key_outside_bmp(fixture: &S3Fixture) -> CaseResult {
    round_trip(fixture, "emoji-\u{1f600}-\u{10ffff}").await
}

async fn object_key_with_null_rejected(fixture: &S3Fixture) -> CaseResult {
    let result = fixture
        .client
        .put_object()
        .bucket(&fixture.bucket)
        .key("null\0key")
        .body(ByteStream::from_static(b"x"))
        .send()
        .await;
    expect_client_error(result)?;
    Ok(())
}

async fn object_key_with_null_not_truncated(fixture: &S3Fixture) -> CaseResult {
    let result = fixture
        .client
        .put_object()
        .bucket(&fixture.bucket)
        .key("null\0key")
        .body(ByteStream::from_static(b"x"))
        .send()
        .await;

    // Rejecting the key is fine; storing it under a shorter name is not.
    if let Err(err) = &result {
        if status_of(err).is_some_and(|s| (400..500).contains(&s)) {
            return Ok(());
        }
    }
    result?;

    let keys = fixture.list_keys().await?;
    ensure!(keys == ["null\0key"], "key with NUL stored as {keys:?}");
    Ok(())
}

async fn object_key_invalid_utf8_rejected(fixture: &S3Fixture) -> CaseResult {
    let result = fixture
        .client
        .put_object()
        .bucket(&fixture.bucket)
        .key(format!("bad-{INVALID_UTF8_PLACEHOLDER}"))
        .body(ByteStream::from_static(b"x"))
        .customize()
        .mutate_request(|request| {
            let uri = request.uri().replace(INVALID_UTF8_PLACEHOLDER, "%C3%28");
            if let Err(e) = request.set_uri(uri) {
                tracing::warn!(error = %e, "Failed to rewrite request URI");
            }
        })
        .send()
        .await;
    expect_client_error(result)?;
    Ok(())
}
