// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Multipart upload lifecycle.

use anyhow::{ensure, Context};
use aws_sdk_s3::primitives::ByteStream;

use super::{expect_status, multipart_etag_of, upload_multipart, MIN_PART_SIZE};
use crate::case::{CaseResult, TestGroup};
use crate::fixture::{random_bytes, S3Fixture};
use crate::test_case;

pub(crate) fn group() -> TestGroup<S3Fixture> {
    TestGroup::new(
        "multipart_upload",
        vec![
            test_case!(multipart_upload_basic),
            test_case!(multipart_upload_etag, skip_for = [MultipartSizesNotKept]),
            test_case!(multipart_upload_abort),
            test_case!(multipart_upload_listed_while_pending),
        ],
    )
}

async fn multipart_upload_basic(fixture: &S3Fixture) -> CaseResult {
    let parts = vec![random_bytes(MIN_PART_SIZE), random_bytes(1024)];
    upload_multipart(fixture, "multipart", &parts).await?;

    let data = fixture.get("multipart").await?;
    ensure!(data == parts.concat(), "assembled object differs from the uploaded parts");
    Ok(())
}

async fn multipart_upload_etag(fixture: &S3Fixture) -> CaseResult {
    let parts = vec![random_bytes(MIN_PART_SIZE), random_bytes(MIN_PART_SIZE), random_bytes(1)];
    let output = upload_multipart(fixture, "multipart-etag", &parts).await?;

    let expected = multipart_etag_of(&parts);
    ensure!(
        output.e_tag() == Some(expected.as_str()),
        "expected ETag {expected}, got {:?}",
        output.e_tag()
    );
    let head = fixture.head("multipart-etag").await?;
    ensure!(head.e_tag() == Some(expected.as_str()), "HeadObject ETag {:?}", head.e_tag());
    Ok(())
}

async fn multipart_upload_abort(fixture: &S3Fixture) -> CaseResult {
    let client = &fixture.client;
    let created =
        client.create_multipart_upload().bucket(&fixture.bucket).key("aborted").send().await?;
    let upload_id = created.upload_id().context("CreateMultipartUpload returned no upload id")?;

    client
        .upload_part()
        .bucket(&fixture.bucket)
        .key("aborted")
        .upload_id(upload_id)
        .part_number(1)
        .body(ByteStream::from_static(b"part"))
        .send()
        .await?;
    client
        .abort_multipart_upload()
        .bucket(&fixture.bucket)
        .key("aborted")
        .upload_id(upload_id)
        .send()
        .await?;

    let result = client
        .list_parts()
        .bucket(&fixture.bucket)
        .key("aborted")
        .upload_id(upload_id)
        .send()
        .await;
    expect_status(result, 404)?;
    ensure!(!fixture.exists("aborted").await?, "aborted upload produced an object");
    Ok(())
}

async fn multipart_upload_listed_while_pending(fixture: &S3Fixture) -> CaseResult {
    let created = fixture
        .client
        .create_multipart_upload()
        .bucket(&fixture.bucket)
        .key("pending")
        .send()
        .await?;
    let upload_id = created.upload_id().context("CreateMultipartUpload returned no upload id")?;

    let output = fixture.client.list_multipart_uploads().bucket(&fixture.bucket).send().await?;
    let listed = output
        .uploads()
        .iter()
        .any(|u| u.key() == Some("pending") && u.upload_id() == Some(upload_id));
    ensure!(listed, "pending upload {upload_id} missing from ListMultipartUploads");
    ensure!(!fixture.exists("pending").await?, "pending upload is visible as an object");
    Ok(())
}
