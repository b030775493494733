//! Test execution
//!
//! Cases run one at a time in registration order. Each non-ignored case runs
//! either on its own thread ([`Isolation::InProcess`]) or in a child process
//! ([`Isolation::Process`]); in both modes a failing, panicking or stuck case
//! is recorded and the run moves on to the next one.

use crate::assertions::CaseResult;
use crate::cancel::CancelToken;
use crate::error::HarnessResult;
use crate::executable::{ChildExit, ChildOutput, ExecutableRunner};
use crate::filter::TestFilter;
use crate::output_parser::{parse_case_output, TestState};
use crate::registry::{Registry, TestCase};
use crate::report::{CaseOutcome, CaseRun, Failure, FailureKind, RunReport};
use crate::reporter::{RunListener, SilentListener};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// Arguments a process-isolated child is started with, after `-sg G -sn N -v`
pub const CHILD_ARGS: [&str; 5] = ["--isolation", "in-process", "--no-color", "--timeout-ms", "0"];

/// Where case bodies run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Isolation {
    /// On a dedicated thread of the running process
    #[default]
    InProcess,
    /// In a child process running the same executable
    Process,
}

impl FromStr for Isolation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in-process" => Ok(Isolation::InProcess),
            "process" => Ok(Isolation::Process),
            other => Err(format!(
                "unknown isolation '{}' (expected 'process' or 'in-process')",
                other
            )),
        }
    }
}

impl fmt::Display for Isolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Isolation::InProcess => write!(f, "in-process"),
            Isolation::Process => write!(f, "process"),
        }
    }
}

/// Runs the cases of a [`Registry`] or of a test executable
pub struct TestRunner<'a> {
    isolation: Isolation,
    timeout: Option<Duration>,
    cancel: CancelToken,
    listener: Box<dyn RunListener + 'a>,
}

impl<'a> TestRunner<'a> {
    /// In-process runner without timeout that reports nothing
    pub fn new() -> Self {
        Self {
            isolation: Isolation::default(),
            timeout: None,
            cancel: CancelToken::new(),
            listener: Box::new(SilentListener),
        }
    }

    pub fn with_isolation(mut self, isolation: Isolation) -> Self {
        self.isolation = isolation;
        self
    }

    /// Per-case time limit; `None` or zero disables it
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|limit| !limit.is_zero());
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_reporter(mut self, listener: impl RunListener + 'a) -> Self {
        self.listener = Box::new(listener);
        self
    }

    pub fn isolation(&self) -> Isolation {
        self.isolation
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run every declared case the filter selects, in registration order
    pub fn run_all(&mut self, registry: &Registry, filter: &TestFilter) -> RunReport {
        let timeout = self.timeout;
        let child = match self.isolation {
            Isolation::InProcess => None,
            Isolation::Process => match ExecutableRunner::current() {
                Ok(runner) => Some(runner.with_extra_args(CHILD_ARGS)),
                Err(e) => {
                    tracing::warn!(error = %e, "cannot locate current executable, running in-process");
                    None
                }
            },
        };

        tracing::debug!(
            cases = registry.len(),
            isolation = %self.isolation,
            ?timeout,
            "starting run"
        );

        let cases = registry
            .cases()
            .iter()
            .map(|case| (case.group.as_str(), case.name.as_str(), Some(case)));

        self.drive(cases, filter, None, |group, name, case| match (&child, case) {
            (Some(runner), _) => run_in_child(runner, group, name, timeout),
            (None, Some(case)) => run_in_thread(case, timeout),
            (None, None) => CaseOutcome::Failed(Failure::fault("case body unavailable")),
        })
    }

    /// Run the cases `runner` lists, each in its own child process.
    ///
    /// Every run and failure carries the executable name as its source.
    pub fn run_executable(
        &mut self,
        runner: &ExecutableRunner,
        filter: &TestFilter,
    ) -> HarnessResult<RunReport> {
        let timeout = self.timeout;
        let listed = runner.list_tests()?;
        tracing::debug!(executable = runner.name(), cases = listed.len(), "listed tests");

        let cases = listed
            .iter()
            .map(|(group, case)| (group.as_str(), case.as_str(), None));

        Ok(self.drive(cases, filter, Some(runner.name()), |group, name, _| {
            run_in_child(runner, group, name, timeout)
        }))
    }

    fn drive<'c, I, F>(
        &mut self,
        cases: I,
        filter: &TestFilter,
        source: Option<&str>,
        mut execute: F,
    ) -> RunReport
    where
        I: Iterator<Item = (&'c str, &'c str, Option<&'c TestCase>)>,
        F: FnMut(&str, &str, Option<&TestCase>) -> CaseOutcome,
    {
        let started = Instant::now();
        let mut report = RunReport::new();

        for (group, name, case) in cases {
            if !filter.matches(group, name) {
                report.record_filtered_out();
                continue;
            }

            let ignored = case.is_some_and(|c| c.ignored);
            if !ignored && self.cancel.is_cancelled() {
                if !report.cancelled {
                    tracing::debug!(group, case = name, "run cancelled, skipping remaining cases");
                    report.cancelled = true;
                }
                report.record_not_run();
                continue;
            }

            let case_started = Instant::now();
            let outcome = if ignored {
                CaseOutcome::Ignored
            } else {
                if case.is_some() {
                    self.listener.case_started(group, name);
                }
                tracing::debug!(group, case = name, "running case");
                execute(group, name, case)
            };

            if let CaseOutcome::Failed(failure) = &outcome {
                if failure.kind != FailureKind::Assertion {
                    tracing::warn!(
                        group,
                        case = name,
                        kind = failure.kind.label(),
                        message = %failure.message,
                        "case did not complete"
                    );
                }
            }

            let run = CaseRun {
                source: source.map(str::to_string),
                group: group.to_string(),
                case: name.to_string(),
                outcome,
                duration: case_started.elapsed(),
            };
            tracing::trace!(group, case = name, duration = ?run.duration, "case finished");
            self.listener.case_finished(&run);
            report.record(run);
        }

        report.duration = started.elapsed();
        tracing::debug!(
            total = report.total,
            passed = report.passed,
            failed = report.failed,
            ignored = report.ignored,
            "run finished"
        );
        self.listener.run_finished(&report);
        report
    }
}

impl Default for TestRunner<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the selected cases of `registry` with a default [`TestRunner`]
pub fn run_all(registry: &Registry, filter: &TestFilter) -> RunReport {
    TestRunner::new().run_all(registry, filter)
}

/// Run a case body on a named thread, catching panics and enforcing `timeout`.
///
/// A timed-out thread is left detached; it can't be stopped from outside.
fn run_in_thread(case: &TestCase, timeout: Option<Duration>) -> CaseOutcome {
    let body = case.body();
    let (tx, rx) = mpsc::channel();

    let spawned = thread::Builder::new()
        .name(case.full_name())
        .spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| body()));
            let _ = tx.send(result);
        });

    let handle = match spawned {
        Ok(handle) => handle,
        Err(e) => {
            return CaseOutcome::Failed(Failure::fault(format!("failed to start case thread: {}", e)))
        }
    };

    let received = match timeout {
        Some(limit) => rx.recv_timeout(limit),
        None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
    };

    match received {
        Ok(result) => {
            let _ = handle.join();
            outcome_from_result(result)
        }
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!(case = %case.full_name(), "case timed out, detaching its thread");
            CaseOutcome::Failed(Failure::timeout(timeout.unwrap_or_default()))
        }
        Err(RecvTimeoutError::Disconnected) => {
            let _ = handle.join();
            CaseOutcome::Failed(Failure::fault("case thread ended without a result"))
        }
    }
}

fn outcome_from_result(result: thread::Result<CaseResult>) -> CaseOutcome {
    match result {
        Ok(Ok(())) => CaseOutcome::Passed,
        Ok(Err(failure)) => CaseOutcome::Failed(failure.into()),
        Err(payload) => {
            CaseOutcome::Failed(Failure::fault(format!("panicked: {}", panic_message(&*payload))))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn run_in_child(
    runner: &ExecutableRunner,
    group: &str,
    name: &str,
    timeout: Option<Duration>,
) -> CaseOutcome {
    match runner.run_test(group, name, timeout) {
        Ok(output) => outcome_from_child(&output, timeout),
        Err(e) => CaseOutcome::Failed(Failure::fault(e.to_string())),
    }
}

/// Interpret the output of a child that ran a single case
pub fn outcome_from_child(output: &ChildOutput, timeout: Option<Duration>) -> CaseOutcome {
    if output.exit == ChildExit::TimedOut {
        return CaseOutcome::Failed(Failure::timeout(timeout.unwrap_or(output.duration)));
    }

    let parsed = parse_case_output(&output.stdout);
    match parsed.state {
        TestState::Skipped => CaseOutcome::Ignored,
        TestState::Failed => CaseOutcome::Failed(Failure {
            kind: parsed.kind.unwrap_or(FailureKind::Fault),
            message: parsed.message,
            location: parsed.location,
        }),
        TestState::Passed if output.success() => CaseOutcome::Passed,
        TestState::Passed => CaseOutcome::Failed(Failure::fault(with_stderr_tail(
            format!("process terminated abnormally ({})", output.describe_exit()),
            &output.stderr,
        ))),
        TestState::Unknown => CaseOutcome::Failed(Failure::fault(with_stderr_tail(
            format!("no test result in output ({})", output.describe_exit()),
            &output.stderr,
        ))),
    }
}

fn with_stderr_tail(message: String, stderr: &str) -> String {
    match stderr.lines().rev().find(|line| !line.trim().is_empty()) {
        Some(last) => format!("{}\n{}", message, last.trim()),
        None => message,
    }
}
