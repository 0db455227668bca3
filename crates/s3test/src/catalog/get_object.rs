// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Object download: whole objects, byte ranges and multipart parts.

use anyhow::ensure;

use super::{etag_of, expect_status, upload_multipart, MIN_PART_SIZE};
use crate::case::{CaseResult, TestGroup};
use crate::fixture::{random_bytes, S3Fixture};
use crate::test_case;

pub(crate) fn group() -> TestGroup<S3Fixture> {
    TestGroup::new(
        "get_object",
        vec![
            test_case!(get_object_basic),
            test_case!(get_object_missing_key),
            test_case!(get_object_range),
            test_case!(
                get_object_part_number,
                skip_for = [GetObjectPartNotSupported, MultipartSizesNotKept]
            ),
            test_case!(
                head_object_parts_count,
                skip_for = [GetObjectPartcountNotSupported, MultipartSizesNotKept]
            ),
        ],
    )
}

async fn get_object_basic(fixture: &S3Fixture) -> CaseResult {
    let data = random_bytes(64 * 1024);
    fixture.put("basic", &data).await?;

    let output = fixture.get_object("basic").await?;
    let etag = output.e_tag().map(str::to_string);
    let length = output.content_length();
    let body = output.body.collect().await?.into_bytes();

    ensure!(&body[..] == data.as_slice(), "downloaded content differs from upload");
    ensure!(length == Some(data.len() as i64), "unexpected Content-Length {length:?}");
    ensure!(etag.as_deref() == Some(etag_of(&data).as_str()), "unexpected ETag {etag:?}");
    Ok(())
}

async fn get_object_missing_key(fixture: &S3Fixture) -> CaseResult {
    let result =
        fixture.client.get_object().bucket(&fixture.bucket).key("never-written").send().await;
    expect_status(result, 404)
}

async fn get_object_range(fixture: &S3Fixture) -> CaseResult {
    let data: Vec<u8> = (0..100).collect();
    fixture.put("range", &data).await?;

    let output = fixture
        .client
        .get_object()
        .bucket(&fixture.bucket)
        .key("range")
        .range("bytes=10-19")
        .send()
        .await?;
    let content_range = output.content_range().map(str::to_string);
    let body = output.body.collect().await?.into_bytes();

    ensure!(&body[..] == &data[10..20], "range body mismatch: {body:?}");
    ensure!(
        content_range.as_deref() == Some("bytes 10-19/100"),
        "unexpected Content-Range {content_range:?}"
    );
    Ok(())
}

async fn get_object_part_number(fixture: &S3Fixture) -> CaseResult {
    let parts = vec![random_bytes(MIN_PART_SIZE), random_bytes(1024)];
    upload_multipart(fixture, "parts", &parts).await?;

    for (number, part) in (1..).zip(&parts) {
        let output = fixture
            .client
            .get_object()
            .bucket(&fixture.bucket)
            .key("parts")
            .part_number(number)
            .send()
            .await?;
        let body = output.body.collect().await?.into_bytes();
        ensure!(
            &body[..] == part.as_slice(),
            "part {number}: got {} bytes, expected {}",
            body.len(),
            part.len()
        );
    }
    Ok(())
}

async fn head_object_parts_count(fixture: &S3Fixture) -> CaseResult {
    let parts = vec![random_bytes(MIN_PART_SIZE), random_bytes(MIN_PART_SIZE), random_bytes(16)];
    upload_multipart(fixture, "parts-count", &parts).await?;

    let output = fixture
        .client
        .head_object()
        .bucket(&fixture.bucket)
        .key("parts-count")
        .part_number(1)
        .send()
        .await?;

    ensure!(output.parts_count() == Some(3), "expected 3 parts, got {:?}", output.parts_count());
    Ok(())
}
