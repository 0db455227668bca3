// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Data integrity checksums on upload and download.

use anyhow::ensure;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{ChecksumAlgorithm, ChecksumMode};
use base64::Engine;

use super::{expect_status, sha256_base64};
use crate::case::{CaseResult, TestGroup};
use crate::fixture::{random_bytes, S3Fixture};
use crate::test_case;

pub(crate) fn group() -> TestGroup<S3Fixture> {
    TestGroup::new(
        "checksum",
        vec![
            test_case!(put_object_crc32, skip_for = [ChecksumsNotSupported]),
            test_case!(put_object_sha256, skip_for = [ChecksumsNotSupported]),
            test_case!(put_object_wrong_sha256_rejected, skip_for = [ChecksumsNotSupported]),
            test_case!(get_object_checksum_mode, skip_for = [ChecksumsNotSupported]),
            test_case!(put_object_wrong_content_md5_rejected),
        ],
    )
}

async fn put_object_crc32(fixture: &S3Fixture) -> CaseResult {
    let output = fixture
        .client
        .put_object()
        .bucket(&fixture.bucket)
        .key("checksum-crc32")
        .body(ByteStream::from_static(b"Hello, World with CRC32!"))
        .checksum_algorithm(ChecksumAlgorithm::Crc32)
        .send()
        .await?;

    ensure!(output.checksum_crc32().is_some(), "PutObject response carries no CRC32");
    Ok(())
}

async fn put_object_sha256(fixture: &S3Fixture) -> CaseResult {
    let data = random_bytes(4096);
    let expected = sha256_base64(&data);

    let output = fixture
        .client
        .put_object()
        .bucket(&fixture.bucket)
        .key("checksum-sha256")
        .body(ByteStream::from(data))
        .checksum_sha256(&expected)
        .send()
        .await?;

    ensure!(
        output.checksum_sha256() == Some(expected.as_str()),
        "expected SHA-256 {expected}, got {:?}",
        output.checksum_sha256()
    );
    Ok(())
}

async fn put_object_wrong_sha256_rejected(fixture: &S3Fixture) -> CaseResult {
    let wrong = sha256_base64(b"not the payload");
    let result = fixture
        .client
        .put_object()
        .bucket(&fixture.bucket)
        .key("checksum-wrong-sha256")
        .body(ByteStream::from_static(b"the payload"))
        .checksum_sha256(wrong)
        .send()
        .await;

    expect_status(result, 400)?;
    ensure!(!fixture.exists("checksum-wrong-sha256").await?, "rejected object was stored");
    Ok(())
}

async fn get_object_checksum_mode(fixture: &S3Fixture) -> CaseResult {
    let data = random_bytes(1024);
    let expected = sha256_base64(&data);
    fixture
        .client
        .put_object()
        .bucket(&fixture.bucket)
        .key("checksum-get")
        .body(ByteStream::from(data))
        .checksum_sha256(&expected)
        .send()
        .await?;

    let output = fixture
        .client
        .get_object()
        .bucket(&fixture.bucket)
        .key("checksum-get")
        .checksum_mode(ChecksumMode::Enabled)
        .send()
        .await?;

    ensure!(
        output.checksum_sha256() == Some(expected.as_str()),
        "expected SHA-256 {expected} on GetObject, got {:?}",
        output.checksum_sha256()
    );
    Ok(())
}

async fn put_object_wrong_content_md5_rejected(fixture: &S3Fixture) -> CaseResult {
    let wrong = base64::engine::general_purpose::STANDARD.encode(md5::compute(b"other").0);
    let result = fixture
        .client
        .put_object()
        .bucket(&fixture.bucket)
        .key("checksum-wrong-md5")
        .body(ByteStream::from_static(b"the payload"))
        .content_md5(wrong)
        .send()
        .await;

    expect_status(result, 400)
}
