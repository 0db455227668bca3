// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Conformance test harness for S3-compatible object storage.
//!
//! The [`Runner`] executes a catalog of [`TestGroup`]s against one [`Target`],
//! skipping cases the target's quirks would break and reporting every
//! lifecycle event to a [`DiagnosticsSink`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod case;
pub mod catalog;
pub mod diagnostics;
pub mod error;
pub mod fixture;
pub mod runner;
pub mod wire;

pub use case::{CaseId, CaseResult, CaseStatus, Failure, FailureKind, Outcome, TestCase, TestGroup};
pub use diagnostics::{ConsoleDiagnostics, DiagnosticsSink, FileDiagnostics, WireCapture};
pub use error::FixtureError;
pub use fixture::{FixtureProvider, S3Fixture, S3Provider};
pub use runner::{CaseReport, GroupReport, GroupState, RunReport, RunSummary, Runner};
pub use s3test_core::{Quirk, Rejection, RunFilter, SkipReason, Target};
