// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Object upload and copy.

use anyhow::{ensure, Context};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::StorageClass;

use super::etag_of;
use crate::case::{CaseResult, TestGroup};
use crate::fixture::{random_bytes, S3Fixture};
use crate::test_case;

pub(crate) fn group() -> TestGroup<S3Fixture> {
    TestGroup::new(
        "put_object",
        vec![
            test_case!(put_object_basic),
            test_case!(put_object_empty),
            test_case!(put_object_overwrite),
            test_case!(put_object_metadata),
            test_case!(put_object_storage_class, skip_for = [StorageClassNotKept]),
            test_case!(
                put_object_trailing_slash_content_type,
                skip_for = [ContentTypeNotSetForKeysWithTrailingSlash]
            ),
            test_case!(copy_object_etag, skip_for = [EtagEmptyAfterCopyObject]),
        ],
    )
}

async fn put_object_basic(fixture: &S3Fixture) -> CaseResult {
    let data = random_bytes(8192);
    let output = fixture.put("basic", &data).await?;

    let expected = etag_of(&data);
    ensure!(output.e_tag() == Some(expected.as_str()), "PutObject ETag {:?}", output.e_tag());
    ensure!(fixture.get("basic").await? == data, "downloaded content differs from upload");
    Ok(())
}

async fn put_object_empty(fixture: &S3Fixture) -> CaseResult {
    fixture.put("empty", b"").await?;
    let head = fixture.head("empty").await?;
    ensure!(head.content_length() == Some(0), "Content-Length {:?}", head.content_length());
    ensure!(head.e_tag() == Some(etag_of(b"").as_str()), "empty object ETag {:?}", head.e_tag());
    Ok(())
}

async fn put_object_overwrite(fixture: &S3Fixture) -> CaseResult {
    fixture.put("overwrite", b"first").await?;
    fixture.put("overwrite", b"second").await?;
    ensure!(fixture.get("overwrite").await? == b"second", "overwrite was not applied");
    Ok(())
}

async fn put_object_metadata(fixture: &S3Fixture) -> CaseResult {
    fixture
        .client
        .put_object()
        .bucket(&fixture.bucket)
        .key("metadata")
        .body(ByteStream::from_static(b"x"))
        .content_type("text/plain")
        .metadata("color", "blue")
        .send()
        .await?;

    let head = fixture.head("metadata").await?;
    let color = head.metadata().and_then(|m| m.get("color")).map(String::as_str);
    ensure!(color == Some("blue"), "user metadata color = {color:?}");
    ensure!(head.content_type() == Some("text/plain"), "Content-Type {:?}", head.content_type());
    Ok(())
}

async fn put_object_storage_class(fixture: &S3Fixture) -> CaseResult {
    fixture
        .client
        .put_object()
        .bucket(&fixture.bucket)
        .key("infrequent")
        .body(ByteStream::from_static(b"x"))
        .storage_class(StorageClass::StandardIa)
        .send()
        .await?;

    let head = fixture.head("infrequent").await?;
    ensure!(
        head.storage_class() == Some(&StorageClass::StandardIa),
        "expected STANDARD_IA, got {:?}",
        head.storage_class()
    );
    Ok(())
}

async fn put_object_trailing_slash_content_type(fixture: &S3Fixture) -> CaseResult {
    fixture
        .client
        .put_object()
        .bucket(&fixture.bucket)
        .key("folder/")
        .body(ByteStream::from_static(b""))
        .content_type("application/x-directory")
        .send()
        .await?;

    let head = fixture.head("folder/").await?;
    ensure!(
        head.content_type() == Some("application/x-directory"),
        "Content-Type {:?}",
        head.content_type()
    );
    Ok(())
}

async fn copy_object_etag(fixture: &S3Fixture) -> CaseResult {
    let data = random_bytes(1024);
    fixture.put("source", &data).await?;

    let output = fixture
        .client
        .copy_object()
        .bucket(&fixture.bucket)
        .key("copy")
        .copy_source(format!("{}/source", fixture.bucket))
        .send()
        .await?;

    let etag = output
        .copy_object_result()
        .and_then(|r| r.e_tag())
        .context("CopyObject returned no ETag")?;
    ensure!(etag == etag_of(&data), "CopyObject ETag {etag:?}");
    ensure!(fixture.get("copy").await? == data, "copied content differs");
    Ok(())
}
