//! Console reporting of a run as it happens
//!
//! The verbose block format is the protocol `output_parser` reads back, so
//! headers and failure lines are never colored.

use crate::output_parser::failure_line;
use crate::report::{CaseOutcome, CaseRun, Failure, RunReport};
use colored::Colorize;
use std::io::{self, Write};
use std::time::Duration;

/// Receives run progress from the runner
pub trait RunListener {
    /// A non-ignored case is about to run
    fn case_started(&mut self, _group: &str, _case: &str) {}

    /// A case was visited
    fn case_finished(&mut self, run: &CaseRun);

    /// The run is over
    fn run_finished(&mut self, _report: &RunReport) {}
}

/// Listener that prints nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentListener;

impl RunListener for SilentListener {
    fn case_finished(&mut self, _run: &CaseRun) {}
}

/// Streams progress and a final summary to a writer.
///
/// Verbose mode prints one block per case; otherwise each case prints a
/// single marker (`.` pass, `F` fail, `!` ignored) and failures are printed
/// in full as they happen.
pub struct ConsoleReporter<W: Write> {
    out: W,
    verbose: bool,
    open_header: Option<(String, String)>,
    column: usize,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout(verbose: bool) -> Self {
        Self::new(io::stdout(), verbose)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self {
            out,
            verbose,
            open_header: None,
            column: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print the header of a source executable in multi-executable runs
    pub fn source_header(&mut self, source: &str) {
        self.end_marker_line();
        let _ = writeln!(self.out, "{}", format!("Running {}", source).bold());
        let _ = self.out.flush();
    }

    fn end_marker_line(&mut self) {
        if self.column > 0 {
            let _ = writeln!(self.out);
            self.column = 0;
        }
    }

    fn write_failure(&mut self, run: &CaseRun, failure: &Failure) -> io::Result<()> {
        writeln!(
            self.out,
            "{}",
            failure_line(failure.kind, failure.location.as_ref(), &run.group, &run.case)
        )?;
        // Blank message lines keep their tab so the block does not end early.
        for line in failure.message.lines() {
            writeln!(self.out, "\t{}", line)?;
        }
        writeln!(self.out)
    }

    fn write_verbose(&mut self, run: &CaseRun) -> io::Result<()> {
        let opened = self
            .open_header
            .take()
            .is_some_and(|(group, case)| group == run.group && case == run.case);

        match &run.outcome {
            CaseOutcome::Ignored => {
                if !opened {
                    write!(self.out, "IGNORE_TEST({}, {})", run.group, run.case)?;
                }
            }
            _ => {
                if !opened {
                    write!(self.out, "TEST({}, {})", run.group, run.case)?;
                }
            }
        }

        if let CaseOutcome::Failed(failure) = &run.outcome {
            writeln!(self.out)?;
            self.write_failure(run, failure)?;
        }
        writeln!(self.out, " - {} ms", run.duration.as_millis())
    }

    fn write_marker(&mut self, run: &CaseRun) -> io::Result<()> {
        match &run.outcome {
            CaseOutcome::Passed => write!(self.out, ".")?,
            CaseOutcome::Ignored => write!(self.out, "{}", "!".yellow())?,
            CaseOutcome::Failed(failure) => {
                self.end_marker_line();
                self.write_failure(run, failure)?;
                write!(self.out, "{}", "F".red())?;
            }
        }
        self.column += 1;
        if self.column >= 50 {
            self.end_marker_line();
        }
        Ok(())
    }

    /// Print the end-of-run summary
    pub fn summary(&mut self, report: &RunReport) -> io::Result<()> {
        self.end_marker_line();
        writeln!(self.out)?;
        writeln!(self.out, "{}", "─".repeat(60).dimmed())?;

        let status = if report.is_success() {
            "PASSED".green().bold()
        } else {
            "FAILED".red().bold()
        };
        writeln!(
            self.out,
            "Test result: {} | {} total, {} passed, {} failed, {} ignored, {} filtered out",
            status, report.total, report.passed, report.failed, report.ignored, report.filtered_out
        )?;
        writeln!(self.out, "Time: {}", format_duration(report.duration))?;

        if report.cancelled {
            writeln!(
                self.out,
                "{}",
                format!("Run cancelled: {} cases not run", report.not_run).yellow()
            )?;
        }

        if !report.failures.is_empty() {
            writeln!(self.out)?;
            writeln!(self.out, "{}", "Failures:".red().bold())?;
            for record in &report.failures {
                let origin = match &record.source {
                    Some(source) => format!("{}: ", source),
                    None => String::new(),
                };
                let location = match &record.failure.location {
                    Some(location) => format!(" ({})", location),
                    None => String::new(),
                };
                writeln!(
                    self.out,
                    "  {}{}.{} [{}]{}",
                    origin,
                    record.group,
                    record.case,
                    record.failure.kind.label(),
                    location
                )?;
                for line in record.failure.message.lines() {
                    writeln!(self.out, "      {}", line)?;
                }
            }
        }

        self.out.flush()
    }
}

impl<W: Write> RunListener for ConsoleReporter<W> {
    fn case_started(&mut self, group: &str, case: &str) {
        if !self.verbose {
            return;
        }
        // Written before the body runs so a crashing case still shows its header.
        let _ = write!(self.out, "TEST({}, {})", group, case);
        let _ = self.out.flush();
        self.open_header = Some((group.to_string(), case.to_string()));
    }

    fn case_finished(&mut self, run: &CaseRun) {
        let written = if self.verbose {
            self.write_verbose(run)
        } else {
            self.write_marker(run)
        };
        if let Err(e) = written.and_then(|_| self.out.flush()) {
            tracing::debug!(error = %e, "console write failed");
        }
    }

    fn run_finished(&mut self, report: &RunReport) {
        if let Err(e) = self.summary(report) {
            tracing::debug!(error = %e, "console write failed");
        }
    }
}

/// Render a report as pretty-printed JSON
pub fn json(report: &RunReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{} ms", millis)
    } else {
        format!("{:.2} s", duration.as_secs_f64())
    }
}
