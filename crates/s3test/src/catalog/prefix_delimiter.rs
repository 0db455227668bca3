// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Hierarchical listing with prefixes and delimiters.

use anyhow::ensure;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;

use crate::case::{CaseResult, TestGroup};
use crate::fixture::S3Fixture;
use crate::test_case;

const KEYS: [&str; 5] = ["a/1", "a/2", "a/b/3", "b/1", "c"];

pub(crate) fn group() -> TestGroup<S3Fixture> {
    TestGroup::new(
        "prefix_delimiter",
        vec![
            test_case!(list_with_delimiter),
            test_case!(list_with_prefix),
            test_case!(
                list_with_prefix_and_delimiter,
                skip_for = [KeysWithSlashesCreateImplicitObjects]
            ),
            test_case!(
                list_has_no_implicit_directories,
                skip_for = [KeysWithSlashesCreateImplicitObjects]
            ),
        ],
    )
}

async fn populate(fixture: &S3Fixture) -> anyhow::Result<()> {
    for key in KEYS {
        fixture.put(key, key.as_bytes()).await?;
    }
    Ok(())
}

async fn list(
    fixture: &S3Fixture,
    prefix: Option<&str>,
    delimiter: Option<&str>,
) -> anyhow::Result<ListObjectsV2Output> {
    Ok(fixture
        .client
        .list_objects_v2()
        .bucket(&fixture.bucket)
        .set_prefix(prefix.map(str::to_string))
        .set_delimiter(delimiter.map(str::to_string))
        .send()
        .await?)
}

fn keys_of(output: &ListObjectsV2Output) -> Vec<&str> {
    output.contents().iter().filter_map(|o| o.key()).collect()
}

fn prefixes_of(output: &ListObjectsV2Output) -> Vec<&str> {
    output.common_prefixes().iter().filter_map(|p| p.prefix()).collect()
}

async fn list_with_delimiter(fixture: &S3Fixture) -> CaseResult {
    populate(fixture).await?;
    let output = list(fixture, None, Some("/")).await?;

    ensure!(keys_of(&output) == ["c"], "contents {:?}", keys_of(&output));
    ensure!(prefixes_of(&output) == ["a/", "b/"], "common prefixes {:?}", prefixes_of(&output));
    Ok(())
}

async fn list_with_prefix(fixture: &S3Fixture) -> CaseResult {
    populate(fixture).await?;
    let keys = fixture.list_keys_with_prefix(Some("a/")).await?;
    ensure!(keys == ["a/1", "a/2", "a/b/3"], "keys under a/: {keys:?}");
    Ok(())
}

async fn list_with_prefix_and_delimiter(fixture: &S3Fixture) -> CaseResult {
    populate(fixture).await?;
    let output = list(fixture, Some("a/"), Some("/")).await?;

    ensure!(keys_of(&output) == ["a/1", "a/2"], "contents {:?}", keys_of(&output));
    ensure!(prefixes_of(&output) == ["a/b/"], "common prefixes {:?}", prefixes_of(&output));
    Ok(())
}

async fn list_has_no_implicit_directories(fixture: &S3Fixture) -> CaseResult {
    populate(fixture).await?;
    let keys = fixture.list_keys().await?;
    ensure!(keys == KEYS, "listing contains keys that were never written: {keys:?}");
    Ok(())
}
