// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Sequential run driver.
//!
//! Groups run in catalog order and cases in group order, one at a time. Every
//! case of a group goes through the [`RunFilter`] before the group starts, so
//! rejected cases never cost a fixture. A selected case then goes through
//!
//! 1. the quirk skip check,
//! 2. fixture setup,
//! 3. wire capture,
//! 4. the body (panics included),
//! 5. capture stop and teardown,
//!
//! and ends with exactly one [`Outcome`]. Nothing a case does aborts the run.

use std::fmt;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use s3test_core::{RunFilter, Target};
use tracing::{debug, info, warn};

use crate::case::{CaseId, CaseStatus, Failure, Outcome, TestCase, TestGroup};
use crate::diagnostics::DiagnosticsSink;
use crate::error::FixtureError;
use crate::fixture::FixtureProvider;

/// Terminal state of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    /// At least one case was selected and every selected case ran.
    Completed,
    /// The filter rejected every case.
    SkippedEntirely,
}

/// Status of one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseReport {
    /// Case name.
    pub name: &'static str,
    /// How the case ended.
    pub status: CaseStatus,
}

/// Cases of one group, in run order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReport {
    /// Group name.
    pub name: &'static str,
    /// Terminal state.
    pub state: GroupState,
    /// One entry per catalog case.
    pub cases: Vec<CaseReport>,
}

impl GroupReport {
    /// Looks up a case by name.
    pub fn case(&self, name: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|c| c.name == name)
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// One entry per group, in run order.
    pub groups: Vec<GroupReport>,
}

impl RunReport {
    /// Looks up a group by name.
    pub fn group(&self, name: &str) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Status of `group::case`, if both exist.
    pub fn status(&self, group: &str, case: &str) -> Option<&CaseStatus> {
        self.group(group)?.case(case).map(|c| &c.status)
    }

    /// Aggregate counts.
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for group in &self.groups {
            if group.state == GroupState::SkippedEntirely {
                summary.groups_skipped += 1;
            }
            for case in &group.cases {
                match &case.status {
                    CaseStatus::FilteredOut(_) => summary.filtered += 1,
                    CaseStatus::Completed(Outcome::Passed) => summary.passed += 1,
                    CaseStatus::Completed(Outcome::Failed(_)) => summary.failed += 1,
                    CaseStatus::Completed(Outcome::Skipped(_)) => summary.skipped += 1,
                }
            }
        }
        summary
    }
}

/// Aggregate counts of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Cases that passed.
    pub passed: usize,
    /// Cases that failed.
    pub failed: usize,
    /// Cases skipped because of a target quirk.
    pub skipped: usize,
    /// Cases rejected by the filter.
    pub filtered: usize,
    /// Groups whose every case was rejected by the filter.
    pub groups_skipped: usize,
}

impl RunSummary {
    /// Returns true if any case failed.
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Number of cases that went through the skip check.
    #[must_use]
    pub const fn selected(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} skipped, {} filtered out",
            self.passed, self.failed, self.skipped, self.filtered
        )
    }
}

/// Drives groups of cases against one target.
pub struct Runner<'a, P, S> {
    target: &'a Target,
    filter: &'a RunFilter,
    provider: P,
    sink: S,
}

impl<'a, P, S> Runner<'a, P, S>
where
    P: FixtureProvider,
    S: DiagnosticsSink,
{
    /// Creates a runner.
    pub fn new(target: &'a Target, filter: &'a RunFilter, provider: P, sink: S) -> Self {
        Self { target, filter, provider, sink }
    }

    /// Consumes the runner and returns the diagnostics sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Runs every group in order and reports the result of each case.
    pub async fn run(&mut self, groups: &[TestGroup<P::Fixture>]) -> RunReport {
        let mut report = RunReport::default();
        for group in groups {
            report.groups.push(self.run_group(group).await);
        }

        let summary = report.summary();
        info!(
            selected = summary.selected(),
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            filtered = summary.filtered,
            "Run finished"
        );
        self.sink.run_finished(&summary);
        report
    }

    async fn run_group(&mut self, group: &TestGroup<P::Fixture>) -> GroupReport {
        let mut statuses = Vec::with_capacity(group.cases().len());
        for case in group.cases() {
            let verdict = self.filter.evaluate(case.name());
            if let Err(rejection) = verdict {
                self.sink.case_rejected(&CaseId::new(group.name(), case.name()), rejection);
            }
            statuses.push(verdict);
        }

        let state = if statuses.iter().any(Result::is_ok) {
            self.sink.run_started(group.name());
            GroupState::Completed
        } else {
            debug!(group = group.name(), "Every case filtered out");
            self.sink.group_skipped(group.name());
            GroupState::SkippedEntirely
        };

        let mut cases = Vec::with_capacity(statuses.len());
        for (case, verdict) in group.cases().iter().zip(statuses) {
            let status = match verdict {
                Err(rejection) => CaseStatus::FilteredOut(rejection),
                Ok(()) => {
                    let id = CaseId::new(group.name(), case.name());
                    CaseStatus::Completed(self.run_case(id, case).await)
                }
            };
            cases.push(CaseReport { name: case.name(), status });
        }
        GroupReport { name: group.name(), state, cases }
    }

    async fn run_case(&mut self, id: CaseId, case: &TestCase<P::Fixture>) -> Outcome {
        self.sink.case_started(&id);
        let outcome = self.execute(&id, case).await;
        debug!(case = %id, outcome = outcome.as_str(), "Case finished");
        self.sink.case_finished(&id, &outcome);
        outcome
    }

    async fn execute(&mut self, id: &CaseId, case: &TestCase<P::Fixture>) -> Outcome {
        if let Some(reason) = case.should_skip(self.target) {
            debug!(case = %id, quirk = %reason.quirk, "Skipping case");
            return Outcome::Skipped(reason);
        }

        debug!(case = %id, "Setting up fixture");
        let fixture = match self.provider.setup(self.target).await {
            Ok(fixture) => fixture,
            Err(e) => return Outcome::Failed(Failure::fixture(e)),
        };

        let capture = match self.sink.start_capture(id) {
            Ok(capture) => capture,
            Err(e) => {
                if let Err(teardown) = self.provider.teardown(fixture).await {
                    warn!(case = %id, error = %teardown, "Teardown failed after capture error");
                }
                return Outcome::Failed(Failure::fixture(FixtureError::Capture(e)));
            }
        };

        debug!(case = %id, "Running case body");
        let body = AssertUnwindSafe(case.run(&fixture)).catch_unwind().await;
        capture.stop();

        debug!(case = %id, "Tearing down fixture");
        let teardown = self.provider.teardown(fixture).await;

        match (body, teardown) {
            (Err(payload), teardown) => {
                log_discarded(id, teardown);
                Outcome::Failed(Failure::panic(payload.as_ref()))
            }
            (Ok(Err(e)), teardown) => {
                log_discarded(id, teardown);
                Outcome::Failed(Failure::assertion(&e))
            }
            (Ok(Ok(())), Err(e)) => Outcome::Failed(Failure::fixture(e)),
            (Ok(Ok(())), Ok(())) => Outcome::Passed,
        }
    }
}

impl<P, S> fmt::Debug for Runner<'_, P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("target", &self.target.endpoint())
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

fn log_discarded(id: &CaseId, teardown: Result<(), FixtureError>) {
    if let Err(e) = teardown {
        warn!(case = %id, error = %e, "Teardown failed after case failure");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use s3test_core::Rejection;

    fn report() -> RunReport {
        RunReport {
            groups: vec![
                GroupReport {
                    name: "get_object",
                    state: GroupState::Completed,
                    cases: vec![
                        CaseReport {
                            name: "get_object_basic",
                            status: CaseStatus::Completed(Outcome::Passed),
                        },
                        CaseReport {
                            name: "get_object_range",
                            status: CaseStatus::Completed(Outcome::Failed(Failure::panic(&"x"))),
                        },
                        CaseReport {
                            name: "get_object_multipart",
                            status: CaseStatus::FilteredOut(Rejection::Excluded),
                        },
                    ],
                },
                GroupReport {
                    name: "checksum",
                    state: GroupState::SkippedEntirely,
                    cases: vec![CaseReport {
                        name: "checksum_crc32",
                        status: CaseStatus::FilteredOut(Rejection::NotIncluded),
                    }],
                },
            ],
        }
    }

    #[test]
    fn test_summary_counts() {
        let summary = report().summary();
        assert_eq!(
            summary,
            RunSummary { passed: 1, failed: 1, skipped: 0, filtered: 2, groups_skipped: 1 }
        );
        assert!(summary.has_failures());
        assert_eq!(summary.selected(), 2);
        assert_eq!(summary.to_string(), "1 passed, 1 failed, 0 skipped, 2 filtered out");
    }

    #[test]
    fn test_report_lookup() {
        let report = report();
        assert_eq!(
            report.status("get_object", "get_object_basic"),
            Some(&CaseStatus::Completed(Outcome::Passed))
        );
        assert_eq!(report.status("get_object", "missing"), None);
        assert_eq!(report.group("checksum").map(|g| g.state), Some(GroupState::SkippedEntirely));
    }
}
