// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Bucket listing.

use anyhow::{ensure, Context};

use crate::case::{CaseResult, TestGroup};
use crate::fixture::S3Fixture;
use crate::test_case;

pub(crate) fn group() -> TestGroup<S3Fixture> {
    TestGroup::new(
        "list_buckets",
        vec![test_case!(list_buckets_contains_bucket), test_case!(list_buckets_creation_date)],
    )
}

async fn list_buckets_contains_bucket(fixture: &S3Fixture) -> CaseResult {
    let output = fixture.client.list_buckets().send().await?;
    let names: Vec<_> = output.buckets().iter().filter_map(|b| b.name()).collect();
    ensure!(
        names.contains(&fixture.bucket.as_str()),
        "{} missing from ListBuckets: {names:?}",
        fixture.bucket
    );
    Ok(())
}

async fn list_buckets_creation_date(fixture: &S3Fixture) -> CaseResult {
    let output = fixture.client.list_buckets().send().await?;
    let bucket = output
        .buckets()
        .iter()
        .find(|b| b.name() == Some(fixture.bucket.as_str()))
        .with_context(|| format!("{} missing from ListBuckets", fixture.bucket))?;
    ensure!(bucket.creation_date().is_some(), "bucket has no CreationDate");
    Ok(())
}
