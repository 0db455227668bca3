// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Single-object delete.

use anyhow::ensure;

use crate::case::{CaseResult, TestGroup};
use crate::fixture::S3Fixture;
use crate::test_case;

pub(crate) fn group() -> TestGroup<S3Fixture> {
    TestGroup::new(
        "delete_object",
        vec![
            test_case!(delete_object_basic),
            test_case!(delete_object_missing_key),
            test_case!(delete_object_nested_key, skip_for = [KeysWithSlashesCreateImplicitObjects]),
        ],
    )
}

async fn delete_object_basic(fixture: &S3Fixture) -> CaseResult {
    fixture.put("doomed", b"data").await?;
    fixture.client.delete_object().bucket(&fixture.bucket).key("doomed").send().await?;
    ensure!(!fixture.exists("doomed").await?, "object still exists after DeleteObject");
    Ok(())
}

async fn delete_object_missing_key(fixture: &S3Fixture) -> CaseResult {
    fixture.client.delete_object().bucket(&fixture.bucket).key("never-written").send().await?;
    Ok(())
}

async fn delete_object_nested_key(fixture: &S3Fixture) -> CaseResult {
    fixture.put("dir/sub/file", b"data").await?;
    fixture.client.delete_object().bucket(&fixture.bucket).key("dir/sub/file").send().await?;

    let remaining = fixture.list_keys().await?;
    ensure!(remaining.is_empty(), "expected an empty bucket, found {remaining:?}");
    Ok(())
}
