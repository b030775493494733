//! Run command - run test executables case by case

use anyhow::{Context, Result};
use colored::Colorize;
use rutest::{
    CancelToken, CaseRun, ConsoleReporter, RunListener, RunReport, SilentListener, TestFilter,
    TestRunner,
};
use rutest_config::Config;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// Arguments for the run command
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub filter: TestFilter,
    /// Overrides the configured timeout
    pub timeout_ms: Option<u64>,
    pub json: bool,
    pub verbose: bool,
    pub no_color: bool,
}

/// Forwards case progress to the console, leaving the summary to the caller
struct Progress<'r, W: Write>(&'r mut ConsoleReporter<W>);

impl<W: Write> RunListener for Progress<'_, W> {
    fn case_started(&mut self, group: &str, case: &str) {
        self.0.case_started(group, case);
    }

    fn case_finished(&mut self, run: &CaseRun) {
        self.0.case_finished(run);
    }
}

/// Run every selected case of every executable; returns the exit code
pub fn run(executables: &[PathBuf], config: &Config, args: RunArgs) -> Result<i32> {
    if args.no_color || !config.color() {
        colored::control::set_override(false);
    }

    let runners = super::resolve_executables(executables, config)?;
    let timeout = args
        .timeout_ms
        .or_else(|| config.timeout_ms())
        .map(Duration::from_millis);
    let verbose = args.verbose || config.verbose();

    let cancel = CancelToken::new();
    if let Err(e) = cancel.watch_sigint() {
        tracing::debug!(error = %e, "SIGINT handler not installed");
    }

    let mut console = ConsoleReporter::stdout(verbose);
    let mut report = RunReport::new();

    for runner in &runners {
        let runner_report = if args.json {
            TestRunner::new()
                .with_timeout(timeout)
                .with_cancel(cancel.clone())
                .with_reporter(SilentListener)
                .run_executable(runner, &args.filter)
        } else {
            console.source_header(runner.name());
            TestRunner::new()
                .with_timeout(timeout)
                .with_cancel(cancel.clone())
                .with_reporter(Progress(&mut console))
                .run_executable(runner, &args.filter)
        }
        .with_context(|| format!("failed to run {}", runner.command().display()))?;

        report.merge(runner_report);
    }

    if args.json {
        println!("{}", rutest::reporter::json(&report)?);
    } else {
        console.summary(&report)?;
        if report.cancelled {
            eprintln!("{}", "Interrupted".yellow());
        }
    }

    Ok(report.exit_code())
}
