// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Test case definitions and their outcomes.

use std::any::Any;
use std::fmt;

use futures_util::future::BoxFuture;
use s3test_core::{should_skip, Quirk, Rejection, SkipReason, Target};

use crate::error::FixtureError;

/// Result of a case body. Bodies signal assertion failures with `anyhow::ensure!`/`bail!`.
pub type CaseResult = anyhow::Result<()>;

/// Signature of a case body running against a fixture of type `F`.
pub type CaseFn<F> = for<'a> fn(&'a F) -> BoxFuture<'a, CaseResult>;

/// A named unit of behavioral verification.
pub struct TestCase<F> {
    name: &'static str,
    skip_for_quirks: &'static [Quirk],
    body: CaseFn<F>,
}

impl<F> TestCase<F> {
    /// Creates a case that must not run on targets exhibiting any of `skip_for_quirks`.
    pub fn new(name: &'static str, skip_for_quirks: &'static [Quirk], body: CaseFn<F>) -> Self {
        Self { name, skip_for_quirks, body }
    }

    /// Case name, unique within its group.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Quirks this case is incompatible with.
    #[must_use]
    pub fn skip_for_quirks(&self) -> &'static [Quirk] {
        self.skip_for_quirks
    }

    /// Applies the skip policy against `target`.
    #[must_use]
    pub fn should_skip(&self, target: &Target) -> Option<SkipReason> {
        should_skip(self.skip_for_quirks, target)
    }

    /// Starts the body against `fixture`.
    pub fn run<'a>(&self, fixture: &'a F) -> BoxFuture<'a, CaseResult> {
        (self.body)(fixture)
    }
}

impl<F> fmt::Debug for TestCase<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("skip_for_quirks", &self.skip_for_quirks)
            .finish_non_exhaustive()
    }
}

/// An ordered group of related cases.
pub struct TestGroup<F> {
    name: &'static str,
    cases: Vec<TestCase<F>>,
}

impl<F> TestGroup<F> {
    /// Creates a group; cases run in the order given.
    #[must_use]
    pub fn new(name: &'static str, cases: Vec<TestCase<F>>) -> Self {
        Self { name, cases }
    }

    /// Group name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Cases in run order.
    #[must_use]
    pub fn cases(&self) -> &[TestCase<F>] {
        &self.cases
    }
}

impl<F> fmt::Debug for TestGroup<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestGroup").field("name", &self.name).field("cases", &self.cases).finish()
    }
}

/// Builds a [`TestCase`] from an `async fn(&Fixture) -> CaseResult`, named after the function.
///
/// ```ignore
/// test_case!(put_object_basic);
/// test_case!(put_object_storage_class, skip_for = [StorageClassNotKept]);
/// ```
#[macro_export]
macro_rules! test_case {
    ($body:ident) => {
        $crate::test_case!($body, skip_for = [])
    };
    ($body:ident, skip_for = [$($quirk:ident),* $(,)?]) => {
        $crate::case::TestCase::new(
            stringify!($body),
            &[$($crate::Quirk::$quirk),*],
            |fixture| ::std::boxed::Box::pin($body(fixture)),
        )
    };
}

/// Identity of a case within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaseId {
    /// Group name.
    pub group: &'static str,
    /// Case name.
    pub case: &'static str,
}

impl CaseId {
    /// Creates a case identity.
    #[must_use]
    pub const fn new(group: &'static str, case: &'static str) -> Self {
        Self { group, case }
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.group, self.case)
    }
}

/// Where a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Setup, capture or teardown failed.
    Fixture,
    /// The body reported a mismatch or a request error.
    Assertion,
    /// The body panicked.
    Panic,
}

/// A failed case with its diagnostic text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Source of the failure.
    pub kind: FailureKind,
    /// Single-line error chain.
    pub message: String,
    /// Full multi-line report, written to `error.log` or the console.
    pub trace: String,
}

impl Failure {
    /// Failure reported by a case body.
    #[must_use]
    pub fn assertion(err: &anyhow::Error) -> Self {
        let (message, trace) = (format!("{err:#}"), format!("{err:?}"));
        Self { kind: FailureKind::Assertion, message, trace }
    }

    /// Failure of fixture setup, capture or teardown.
    #[must_use]
    pub fn fixture(err: FixtureError) -> Self {
        let err = anyhow::Error::new(err);
        Self { kind: FailureKind::Fixture, message: format!("{err:#}"), trace: format!("{err:?}") }
    }

    /// Failure caused by a panic in the case body.
    #[must_use]
    pub fn panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "case panicked".to_string()
        };
        Self { kind: FailureKind::Panic, trace: format!("panicked: {message}"), message }
    }
}

/// Outcome of a case that passed the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The body completed without error.
    Passed,
    /// The body, its fixture or its teardown failed.
    Failed(Failure),
    /// The target exhibits a quirk the case is incompatible with.
    Skipped(SkipReason),
}

impl Outcome {
    /// Returns the marker word printed for this outcome.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed(_) => "failed",
            Self::Skipped(_) => "skipped",
        }
    }

    /// Returns true for [`Outcome::Failed`].
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Terminal status of a case in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseStatus {
    /// Rejected by the name filter; nothing was provisioned.
    FilteredOut(Rejection),
    /// Evaluated by the skip policy and, if not skipped, executed.
    Completed(Outcome),
}
