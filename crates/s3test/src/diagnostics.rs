// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Run and case lifecycle reporting.
//!
//! [`ConsoleDiagnostics`] prints one status line per case. With a log root
//! configured it also writes, per case,
//!
//! ```text
//! {root}/{group}/{case}/wire.log    request/response trace
//! {root}/{group}/{case}/error.log   failure trace, only when the case failed
//! ```

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::subscriber::DefaultGuard;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::case::{CaseId, Outcome};
use crate::runner::RunSummary;
use s3test_core::Rejection;

/// Consumer of run lifecycle events.
pub trait DiagnosticsSink {
    /// A group with at least one selected case is about to run.
    fn run_started(&mut self, group: &str);

    /// Every case of a group was rejected by the filter.
    fn group_skipped(&mut self, group: &str);

    /// The filter rejected a case. Reported before any fixture work.
    fn case_rejected(&mut self, case: &CaseId, rejection: Rejection);

    /// A selected case is starting.
    fn case_started(&mut self, case: &CaseId);

    /// Begins capturing the wire trace of `case`. The capture ends when the
    /// returned guard is stopped or dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the capture file cannot be created.
    fn start_capture(&mut self, case: &CaseId) -> io::Result<WireCapture>;

    /// A case reached its outcome. Called exactly once per selected case.
    fn case_finished(&mut self, case: &CaseId, outcome: &Outcome);

    /// All groups have been processed.
    fn run_finished(&mut self, summary: &RunSummary);
}

/// Scoped redirection of wire-level logging for one case.
///
/// Holds the thread's default-dispatcher guard; the previous dispatcher is
/// restored when the capture is stopped or dropped.
#[must_use = "the capture ends as soon as it is dropped"]
pub struct WireCapture {
    guard: Option<DefaultGuard>,
}

impl WireCapture {
    /// A capture that records nothing.
    pub fn disabled() -> Self {
        Self { guard: None }
    }

    /// Redirects events selected by `filter` into a freshly truncated file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or the filter is invalid.
    pub fn to_file(path: &Path, filter: &str) -> io::Result<Self> {
        let filter = EnvFilter::try_new(filter)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let file = File::create(path)?;
        let subscriber = tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_env_filter(filter)
            .with_ansi(false)
            .without_time()
            .with_level(false)
            .with_target(false)
            .finish();
        Ok(Self { guard: Some(tracing::subscriber::set_default(subscriber)) })
    }

    /// Returns true if events are being written somewhere.
    pub fn is_active(&self) -> bool {
        self.guard.is_some()
    }

    /// Ends the capture and restores the previous dispatcher.
    pub fn stop(mut self) {
        self.guard.take();
    }
}

impl fmt::Debug for WireCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireCapture").field("active", &self.is_active()).finish()
    }
}

/// File-backed diagnostics settings.
#[derive(Debug, Clone)]
pub struct FileDiagnostics {
    root: PathBuf,
    wire_filter: String,
}

impl FileDiagnostics {
    /// Writes diagnostics under `root`, capturing events matched by `wire_filter`.
    pub fn new(root: impl Into<PathBuf>, wire_filter: impl Into<String>) -> Self {
        Self { root: root.into(), wire_filter: wire_filter.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the logs of `case`.
    pub fn case_dir(&self, case: &CaseId) -> PathBuf {
        self.root.join(case.group).join(case.case)
    }

    fn ensure_case_dir(&self, case: &CaseId) -> io::Result<PathBuf> {
        let dir = self.case_dir(case);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

/// Prints a live status stream and optionally persists per-case logs.
pub struct ConsoleDiagnostics<W> {
    out: W,
    files: Option<FileDiagnostics>,
}

impl<W: Write> ConsoleDiagnostics<W> {
    /// Reports to `out`.
    pub fn new(out: W, files: Option<FileDiagnostics>) -> Self {
        Self { out, files }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        if let Err(e) = self.out.write_fmt(args).and_then(|()| self.out.write_all(b"\n")) {
            warn!(error = %e, "Failed to write status line");
        }
    }

    fn write_error_log(&self, case: &CaseId, trace: &str) -> io::Result<()> {
        let Some(files) = &self.files else {
            return Ok(());
        };
        let path = files.ensure_case_dir(case)?.join("error.log");
        fs::write(&path, trace)?;
        debug!(path = %path.display(), "Wrote error log");
        Ok(())
    }
}

impl<W: Write> DiagnosticsSink for ConsoleDiagnostics<W> {
    fn run_started(&mut self, group: &str) {
        self.line(format_args!("Running {group}"));
    }

    fn group_skipped(&mut self, group: &str) {
        self.line(format_args!("Skipping {group}"));
    }

    fn case_rejected(&mut self, case: &CaseId, rejection: Rejection) {
        self.line(format_args!("{} {}", case.case, rejection));
    }

    fn case_started(&mut self, case: &CaseId) {
        debug!(%case, "Case started");
    }

    fn start_capture(&mut self, case: &CaseId) -> io::Result<WireCapture> {
        match &self.files {
            Some(files) => {
                let path = files.ensure_case_dir(case)?.join("wire.log");
                WireCapture::to_file(&path, &files.wire_filter)
            }
            None => Ok(WireCapture::disabled()),
        }
    }

    fn case_finished(&mut self, case: &CaseId, outcome: &Outcome) {
        match outcome {
            Outcome::Passed => self.line(format_args!("  {} ✅ passed", case.case)),
            Outcome::Skipped(reason) => {
                self.line(format_args!("  {} 🙈 skipped ({reason})", case.case));
            }
            Outcome::Failed(failure) => {
                self.line(format_args!("  {} ❌ failed", case.case));
                if self.files.is_some() {
                    if let Err(e) = self.write_error_log(case, &failure.trace) {
                        warn!(%case, error = %e, "Failed to write error log");
                        self.line(format_args!("    {}", failure.message));
                    }
                } else {
                    for trace_line in failure.trace.lines() {
                        self.line(format_args!("    {trace_line}"));
                    }
                }
            }
        }
    }

    fn run_finished(&mut self, summary: &RunSummary) {
        self.line(format_args!(""));
        self.line(format_args!("{summary}"));
        if let Some(files) = &self.files {
            let root = files.root().display().to_string();
            self.line(format_args!("Diagnostics written to {root}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::Failure;
    use s3test_core::{Quirk, SkipReason};

    const CASE: CaseId = CaseId::new("put_object", "put_object_basic");

    fn output(sink: ConsoleDiagnostics<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    fn failed() -> Outcome {
        Outcome::Failed(Failure::assertion(
            &anyhow::anyhow!("expected 200, got 500").context("put_object_basic"),
        ))
    }

    #[test]
    fn test_one_terminal_line_per_outcome() {
        let mut sink = ConsoleDiagnostics::new(Vec::new(), None);
        sink.run_started("put_object");
        sink.case_finished(&CASE, &Outcome::Passed);
        sink.case_finished(
            &CASE,
            &Outcome::Skipped(SkipReason { quirk: Quirk::ChecksumsNotSupported }),
        );

        assert_eq!(
            output(sink),
            "Running put_object\n  put_object_basic ✅ passed\n  put_object_basic 🙈 skipped \
             (Ignored due to quirk CHECKSUMS_NOT_SUPPORTED)\n"
        );
    }

    #[test]
    fn test_rejections_and_skipped_groups() {
        let mut sink = ConsoleDiagnostics::new(Vec::new(), None);
        sink.case_rejected(&CASE, Rejection::Excluded);
        sink.case_rejected(&CASE, Rejection::NotIncluded);
        sink.group_skipped("put_object");

        assert_eq!(
            output(sink),
            "put_object_basic excluded\nput_object_basic not included\nSkipping put_object\n"
        );
    }

    #[test]
    fn test_console_mode_prints_trace_inline() {
        let mut sink = ConsoleDiagnostics::new(Vec::new(), None);
        sink.case_finished(&CASE, &failed());

        let out = output(sink);
        assert!(out.starts_with("  put_object_basic ❌ failed\n"));
        assert!(out.contains("    put_object_basic\n"));
        assert!(out.contains("expected 200, got 500"));
    }

    #[test]
    fn test_file_mode_writes_error_log_only_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileDiagnostics::new(dir.path(), "s3test::wire=trace");
        let mut sink = ConsoleDiagnostics::new(Vec::new(), Some(files.clone()));

        let passed = CaseId::new("put_object", "passes");
        sink.case_finished(&passed, &Outcome::Passed);
        sink.case_finished(&CASE, &failed());

        assert!(!files.case_dir(&passed).join("error.log").exists());
        let error_log = fs::read_to_string(files.case_dir(&CASE).join("error.log")).unwrap();
        assert!(error_log.contains("expected 200, got 500"));

        let out = output(sink);
        assert_eq!(out, "  passes ✅ passed\n  put_object_basic ❌ failed\n");
    }

    #[test]
    fn test_capture_writes_wire_events_and_restores_dispatcher() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileDiagnostics::new(dir.path(), "s3test::wire=trace");
        let mut sink = ConsoleDiagnostics::new(Vec::new(), Some(files.clone()));

        let capture = sink.start_capture(&CASE).unwrap();
        assert!(capture.is_active());
        tracing::trace!(target: "s3test::wire", "PUT /bucket/key");
        tracing::info!(target: "other", "not wire");
        capture.stop();
        tracing::trace!(target: "s3test::wire", "after stop");

        let wire = fs::read_to_string(files.case_dir(&CASE).join("wire.log")).unwrap();
        assert!(wire.contains("PUT /bucket/key"));
        assert!(!wire.contains("not wire"));
        assert!(!wire.contains("after stop"));
    }

    #[test]
    fn test_capture_disabled_without_log_root() {
        let mut sink = ConsoleDiagnostics::new(Vec::new(), None);
        let capture = sink.start_capture(&CASE).unwrap();
        assert!(!capture.is_active());
    }

    #[test]
    fn test_capture_truncates_previous_log() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileDiagnostics::new(dir.path(), "s3test::wire=trace");
        let path = files.ensure_case_dir(&CASE).unwrap().join("wire.log");
        fs::write(&path, "stale").unwrap();

        let capture = WireCapture::to_file(&path, "s3test::wire=trace").unwrap();
        drop(capture);

        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }
}
