// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Conditional reads and writes (`If-Match`, `If-None-Match`).

use anyhow::{ensure, Context};
use aws_sdk_s3::primitives::ByteStream;

use super::expect_status;
use crate::case::{CaseResult, TestGroup};
use crate::fixture::S3Fixture;
use crate::test_case;

const KEY: &str = "conditional";

pub(crate) fn group() -> TestGroup<S3Fixture> {
    TestGroup::new(
        "conditional_request",
        vec![
            test_case!(
                put_object_if_none_match_star,
                skip_for = [PutObjectIfNoneMatchStarNotSupported]
            ),
            test_case!(
                put_object_if_none_match_etag,
                skip_for = [PutObjectIfNoneMatchEtagNotSupported]
            ),
            test_case!(put_object_if_match_etag, skip_for = [PutObjectIfMatchEtagNotSupported]),
            test_case!(get_object_if_match),
            test_case!(get_object_if_none_match),
        ],
    )
}

async fn current_etag(fixture: &S3Fixture) -> anyhow::Result<String> {
    let output = fixture.put(KEY, b"original").await?;
    output.e_tag().map(str::to_string).context("PutObject returned no ETag")
}

async fn put_object_if_none_match_star(fixture: &S3Fixture) -> CaseResult {
    let put = |body: &'static [u8]| {
        fixture
            .client
            .put_object()
            .bucket(&fixture.bucket)
            .key(KEY)
            .body(ByteStream::from_static(body))
            .if_none_match("*")
            .send()
    };

    put(b"first").await.context("first conditional create")?;
    expect_status(put(b"second").await, 412)?;
    ensure!(fixture.get(KEY).await? == b"first", "conditional create overwrote the object");
    Ok(())
}

async fn put_object_if_none_match_etag(fixture: &S3Fixture) -> CaseResult {
    let etag = current_etag(fixture).await?;

    let result = fixture
        .client
        .put_object()
        .bucket(&fixture.bucket)
        .key(KEY)
        .body(ByteStream::from_static(b"replacement"))
        .if_none_match(&etag)
        .send()
        .await;

    expect_status(result, 412)?;
    ensure!(fixture.get(KEY).await? == b"original", "object replaced despite matching ETag");
    Ok(())
}

async fn put_object_if_match_etag(fixture: &S3Fixture) -> CaseResult {
    let etag = current_etag(fixture).await?;

    let result = fixture
        .client
        .put_object()
        .bucket(&fixture.bucket)
        .key(KEY)
        .body(ByteStream::from_static(b"stale"))
        .if_match("\"00000000000000000000000000000000\"")
        .send()
        .await;
    expect_status(result, 412)?;

    fixture
        .client
        .put_object()
        .bucket(&fixture.bucket)
        .key(KEY)
        .body(ByteStream::from_static(b"replacement"))
        .if_match(&etag)
        .send()
        .await
        .context("PutObject with the current ETag")?;
    ensure!(fixture.get(KEY).await? == b"replacement", "If-Match write was not applied");
    Ok(())
}

async fn get_object_if_match(fixture: &S3Fixture) -> CaseResult {
    let etag = current_etag(fixture).await?;

    fixture
        .client
        .get_object()
        .bucket(&fixture.bucket)
        .key(KEY)
        .if_match(&etag)
        .send()
        .await
        .context("GetObject with the current ETag")?;

    let result = fixture
        .client
        .get_object()
        .bucket(&fixture.bucket)
        .key(KEY)
        .if_match("\"00000000000000000000000000000000\"")
        .send()
        .await;
    expect_status(result, 412)
}

async fn get_object_if_none_match(fixture: &S3Fixture) -> CaseResult {
    let etag = current_etag(fixture).await?;

    let result = fixture
        .client
        .get_object()
        .bucket(&fixture.bucket)
        .key(KEY)
        .if_none_match(&etag)
        .send()
        .await;
    expect_status(result, 304)
}
