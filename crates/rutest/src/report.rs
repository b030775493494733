//! Run results - per-case outcomes and the aggregate report

use crate::assertions::{AssertionFailure, Location};
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Why a case failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A check in the body failed
    Assertion,
    /// The body panicked or its process terminated abnormally
    Fault,
    /// The body exceeded the per-case timeout
    Timeout,
}

impl FailureKind {
    /// Word used in `<Kind> in TEST(Group, Case)` lines
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Assertion => "Failure",
            FailureKind::Fault => "Fault",
            FailureKind::Timeout => "Timeout",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Failure" => Some(FailureKind::Assertion),
            "Fault" => Some(FailureKind::Fault),
            "Timeout" => Some(FailureKind::Timeout),
            _ => None,
        }
    }
}

/// A recorded failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Failure {
    pub fn fault(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Fault,
            message: message.into(),
            location: None,
        }
    }

    pub fn timeout(limit: Duration) -> Self {
        Self {
            kind: FailureKind::Timeout,
            message: format!("case exceeded its {:.2?} timeout", limit),
            location: None,
        }
    }
}

impl From<AssertionFailure> for Failure {
    fn from(failure: AssertionFailure) -> Self {
        Self {
            kind: FailureKind::Assertion,
            message: failure.message,
            location: Some(failure.location),
        }
    }
}

/// Outcome of one visited case
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseOutcome {
    Passed,
    Failed(Failure),
    Ignored,
}

impl CaseOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, CaseOutcome::Passed)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, CaseOutcome::Failed(_))
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, CaseOutcome::Ignored)
    }
}

/// A visited case and its outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseRun {
    /// Executable the case ran in, for runs that drive external executables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub group: String,
    pub case: String,
    pub outcome: CaseOutcome,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

/// A failure with the case it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub group: String,
    pub case: String,
    #[serde(flatten)]
    pub failure: Failure,
}

/// Aggregate of one run.
///
/// `total` counts the cases selected by the filter;
/// `passed + failed + ignored + not_run == total` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub ignored: usize,
    pub filtered_out: usize,
    /// Selected cases skipped because the run was cancelled
    pub not_run: usize,
    pub cancelled: bool,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
    pub runs: Vec<CaseRun>,
    pub failures: Vec<FailureRecord>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a visited case
    pub fn record(&mut self, run: CaseRun) {
        self.total += 1;
        match &run.outcome {
            CaseOutcome::Passed => self.passed += 1,
            CaseOutcome::Ignored => self.ignored += 1,
            CaseOutcome::Failed(failure) => {
                self.failed += 1;
                self.failures.push(FailureRecord {
                    source: run.source.clone(),
                    group: run.group.clone(),
                    case: run.case.clone(),
                    failure: failure.clone(),
                });
            }
        }
        self.runs.push(run);
    }

    /// Count a selected case left unvisited by cancellation
    pub fn record_not_run(&mut self) {
        self.total += 1;
        self.not_run += 1;
    }

    pub fn record_filtered_out(&mut self) {
        self.filtered_out += 1;
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: RunReport) {
        self.total += other.total;
        self.passed += other.passed;
        self.failed += other.failed;
        self.ignored += other.ignored;
        self.filtered_out += other.filtered_out;
        self.not_run += other.not_run;
        self.cancelled |= other.cancelled;
        self.duration += other.duration;
        self.runs.extend(other.runs);
        self.failures.extend(other.failures);
    }

    /// Number of cases whose bodies were invoked
    pub fn ran(&self) -> usize {
        self.passed + self.failed
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Process exit code: 0 iff no selected, non-ignored case failed
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}
