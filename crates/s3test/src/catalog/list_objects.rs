// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Object listing (V1 and V2).

use anyhow::ensure;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{ObjectStorageClass, StorageClass};

use crate::case::{CaseResult, TestGroup};
use crate::fixture::S3Fixture;
use crate::test_case;

pub(crate) fn group() -> TestGroup<S3Fixture> {
    TestGroup::new(
        "list_objects",
        vec![
            test_case!(list_objects_v2_sorted),
            test_case!(list_objects_v2_pagination),
            test_case!(list_objects_v1_marker),
            test_case!(
                list_objects_utf8_order,
                skip_for = [KeysAreSortedInUtf16BinaryOrder, KeysWithCodepointsOutsideBmpRejected]
            ),
            test_case!(list_objects_storage_class, skip_for = [StorageClassNotKept]),
        ],
    )
}

async fn list_objects_v2_sorted(fixture: &S3Fixture) -> CaseResult {
    for key in ["charlie", "alpha", "bravo"] {
        fixture.put(key, b"x").await?;
    }

    let keys = fixture.list_keys().await?;
    ensure!(keys == ["alpha", "bravo", "charlie"], "unexpected listing {keys:?}");
    Ok(())
}

async fn list_objects_v2_pagination(fixture: &S3Fixture) -> CaseResult {
    let expected: Vec<String> = (0..5).map(|i| format!("page-{i}")).collect();
    for key in &expected {
        fixture.put(key, b"x").await?;
    }

    let first = fixture
        .client
        .list_objects_v2()
        .bucket(&fixture.bucket)
        .max_keys(2)
        .send()
        .await?;
    ensure!(first.contents().len() == 2, "first page has {} keys", first.contents().len());
    ensure!(first.is_truncated() == Some(true), "first page is not truncated");
    ensure!(first.next_continuation_token().is_some(), "first page has no continuation token");

    let mut keys = Vec::new();
    let mut pages = fixture
        .client
        .list_objects_v2()
        .bucket(&fixture.bucket)
        .max_keys(2)
        .into_paginator()
        .send();
    while let Some(page) = pages.next().await {
        keys.extend(page?.contents().iter().filter_map(|o| o.key().map(str::to_string)));
    }
    ensure!(keys == expected, "paginated listing {keys:?}");
    Ok(())
}

async fn list_objects_v1_marker(fixture: &S3Fixture) -> CaseResult {
    for key in ["a", "b", "c", "d"] {
        fixture.put(key, b"x").await?;
    }

    let output =
        fixture.client.list_objects().bucket(&fixture.bucket).marker("b").send().await?;
    let keys: Vec<_> = output.contents().iter().filter_map(|o| o.key()).collect();
    ensure!(keys == ["c", "d"], "listing after marker b returned {keys:?}");
    Ok(())
}

async fn list_objects_utf8_order(fixture: &S3Fixture) -> CaseResult {
    // U+FF61 sorts before U+1F600 in UTF-8 and after it in UTF-16.
    let bmp = "sort-\u{ff61}";
    let astral = "sort-\u{1f600}";
    fixture.put(astral, b"x").await?;
    fixture.put(bmp, b"x").await?;

    let keys = fixture.list_keys().await?;
    ensure!(keys == [bmp, astral], "keys are not in UTF-8 binary order: {keys:?}");
    Ok(())
}

async fn list_objects_storage_class(fixture: &S3Fixture) -> CaseResult {
    fixture
        .client
        .put_object()
        .bucket(&fixture.bucket)
        .key("infrequent")
        .body(ByteStream::from_static(b"x"))
        .storage_class(StorageClass::StandardIa)
        .send()
        .await?;

    let output = fixture.client.list_objects_v2().bucket(&fixture.bucket).send().await?;
    let class = output.contents().first().and_then(|o| o.storage_class());
    ensure!(
        class == Some(&ObjectStorageClass::StandardIa),
        "expected STANDARD_IA in listing, got {class:?}"
    );
    Ok(())
}
