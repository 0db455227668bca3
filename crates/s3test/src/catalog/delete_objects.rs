// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Multi-object delete.

use anyhow::ensure;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};

use crate::case::{CaseResult, TestGroup};
use crate::fixture::S3Fixture;
use crate::test_case;

pub(crate) fn group() -> TestGroup<S3Fixture> {
    TestGroup::new(
        "delete_objects",
        vec![
            test_case!(delete_objects_multiple),
            test_case!(delete_objects_missing_keys),
            test_case!(delete_objects_quiet),
        ],
    )
}

fn delete_request(keys: &[&str], quiet: bool) -> anyhow::Result<Delete> {
    let objects = keys
        .iter()
        .map(|key| ObjectIdentifier::builder().key(*key).build())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Delete::builder().set_objects(Some(objects)).quiet(quiet).build()?)
}

async fn delete_objects_multiple(fixture: &S3Fixture) -> CaseResult {
    let keys = ["multi-1", "multi-2", "multi-3"];
    for key in keys {
        fixture.put(key, key.as_bytes()).await?;
    }

    let output = fixture
        .client
        .delete_objects()
        .bucket(&fixture.bucket)
        .delete(delete_request(&keys, false)?)
        .send()
        .await?;

    let mut deleted: Vec<_> = output.deleted().iter().filter_map(|d| d.key()).collect();
    deleted.sort_unstable();
    ensure!(deleted == keys, "expected {keys:?} deleted, got {deleted:?}");
    ensure!(output.errors().is_empty(), "unexpected errors: {:?}", output.errors());
    ensure!(fixture.list_keys().await?.is_empty(), "bucket is not empty after delete");
    Ok(())
}

async fn delete_objects_missing_keys(fixture: &S3Fixture) -> CaseResult {
    fixture.put("present", b"data").await?;

    let output = fixture
        .client
        .delete_objects()
        .bucket(&fixture.bucket)
        .delete(delete_request(&["present", "absent"], false)?)
        .send()
        .await?;

    ensure!(
        output.errors().is_empty(),
        "deleting a missing key must succeed, got {:?}",
        output.errors()
    );
    let deleted = output.deleted().len();
    ensure!(deleted == 2, "expected 2 deleted entries, got {deleted}");
    Ok(())
}

async fn delete_objects_quiet(fixture: &S3Fixture) -> CaseResult {
    fixture.put("quiet-1", b"1").await?;
    fixture.put("quiet-2", b"2").await?;

    let output = fixture
        .client
        .delete_objects()
        .bucket(&fixture.bucket)
        .delete(delete_request(&["quiet-1", "quiet-2"], true)?)
        .send()
        .await?;

    ensure!(output.deleted().is_empty(), "quiet mode reported {:?}", output.deleted());
    ensure!(fixture.list_keys().await?.is_empty(), "bucket is not empty after quiet delete");
    Ok(())
}
