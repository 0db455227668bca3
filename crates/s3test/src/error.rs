// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Errors raised while preparing or cleaning up a case.

use thiserror::Error;

/// Failure during fixture setup, wire capture or teardown.
///
/// These never abort a run; the driver records them as a failed case.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// Generic setup failure.
    #[error("fixture setup failed: {0}")]
    Setup(String),

    /// The bucket could not be created.
    #[error("failed to create bucket {bucket}")]
    CreateBucket {
        /// Bucket name.
        bucket: String,
        /// Client error.
        #[source]
        source: Box<aws_sdk_s3::Error>,
    },

    /// Objects or uploads could not be removed from the bucket.
    #[error("failed to clear bucket {bucket}")]
    ClearBucket {
        /// Bucket name.
        bucket: String,
        /// Client error.
        #[source]
        source: Box<aws_sdk_s3::Error>,
    },

    /// The bucket could not be deleted.
    #[error("failed to delete bucket {bucket}")]
    DeleteBucket {
        /// Bucket name.
        bucket: String,
        /// Client error.
        #[source]
        source: Box<aws_sdk_s3::Error>,
    },

    /// A request could not be built.
    #[error("failed to build request")]
    Build(#[from] aws_sdk_s3::error::BuildError),

    /// The wire log could not be opened.
    #[error("failed to start wire capture")]
    Capture(#[from] std::io::Error),
}

impl FixtureError {
    pub(crate) fn create_bucket(bucket: &str, source: impl Into<aws_sdk_s3::Error>) -> Self {
        Self::CreateBucket { bucket: bucket.to_string(), source: Box::new(source.into()) }
    }

    pub(crate) fn clear_bucket(bucket: &str, source: impl Into<aws_sdk_s3::Error>) -> Self {
        Self::ClearBucket { bucket: bucket.to_string(), source: Box::new(source.into()) }
    }

    pub(crate) fn delete_bucket(bucket: &str, source: impl Into<aws_sdk_s3::Error>) -> Self {
        Self::DeleteBucket { bucket: bucket.to_string(), source: Box::new(source.into()) }
    }
}
