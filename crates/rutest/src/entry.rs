//! Suite entry points
//!
//! A suite binary declares its cases and returns the value of [`run_main`]
//! (or [`run_suite`]) as its process exit code:
//! - 0 when no selected case failed
//! - 1 when at least one failed
//! - 2 for declaration or usage errors

use crate::cancel::CancelToken;
use crate::cli::HarnessArgs;
use crate::error::HarnessResult;
use crate::logging;
use crate::registry::Registry;
use crate::report::RunReport;
use crate::reporter::{self, ConsoleReporter, SilentListener};
use crate::runner::{Isolation, TestRunner};
use rutest_config::{Config, ConfigLoader};
use std::ffi::OsString;
use std::time::Duration;

/// Exit code for declaration and usage errors
pub const USAGE_ERROR: i32 = 2;

/// Declare cases with `declare`, then run them with the process arguments.
///
/// A declaration error is printed and no case runs.
pub fn run_suite<F>(declare: F) -> i32
where
    F: FnOnce(&mut Registry) -> HarnessResult<()>,
{
    let mut registry = Registry::new();
    if let Err(e) = declare(&mut registry) {
        eprintln!("error: {}", e);
        return USAGE_ERROR;
    }
    run_main(&registry)
}

/// Run `registry` with the process arguments; Ctrl-C cancels the run.
pub fn run_main(registry: &Registry) -> i32 {
    let cancel = CancelToken::new();
    let watched = cancel.watch_sigint();
    let code = run_with_args(registry, std::env::args_os(), cancel);
    if let Err(e) = watched {
        tracing::debug!(error = %e, "SIGINT handler not installed");
    }
    code
}

/// Run `registry` with an explicit argument list (program name first)
pub fn run_with_args<I, T>(registry: &Registry, args: I, cancel: CancelToken) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args = match HarnessArgs::parse_from_args(args) {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return e.exit_code();
        }
    };

    logging::init(args.debug);

    if args.is_listing() {
        print_listings(registry, &args);
        return 0;
    }

    let settings = Settings::resolve(&args, &load_config());
    if !settings.color {
        colored::control::set_override(false);
    }
    tracing::debug!(?settings, "resolved run settings");

    let mut runner = TestRunner::new()
        .with_isolation(settings.isolation)
        .with_timeout(settings.timeout)
        .with_cancel(cancel);

    let filter = args.filter();
    let report = if args.json {
        runner = runner.with_reporter(SilentListener);
        let report = runner.run_all(registry, &filter);
        print_json(&report);
        report
    } else {
        runner = runner.with_reporter(ConsoleReporter::stdout(settings.verbose));
        runner.run_all(registry, &filter)
    };

    report.exit_code()
}

/// Effective run settings: flags over configuration over defaults
#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    isolation: Isolation,
    timeout: Option<Duration>,
    verbose: bool,
    color: bool,
}

impl Settings {
    /// `-v` and `--no-color` only switch on: a configured `verbose = true`
    /// or `color = false` can't be undone from the command line.
    fn resolve(args: &HarnessArgs, config: &Config) -> Self {
        let isolation = args
            .isolation
            .or_else(|| config.isolation().and_then(|mode| mode.parse().ok()))
            .unwrap_or(Isolation::Process);

        Self {
            isolation,
            timeout: args
                .timeout_ms
                .or_else(|| config.timeout_ms())
                .map(Duration::from_millis),
            verbose: args.verbose || config.verbose(),
            color: !args.no_color && config.color(),
        }
    }
}

fn load_config() -> Config {
    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(_) => return Config::default(),
    };
    match ConfigLoader::new().load_from_directory(&cwd) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring invalid configuration");
            Config::default()
        }
    }
}

fn print_listings(registry: &Registry, args: &HarnessArgs) {
    if args.list_groups {
        println!("{}", registry.list_groups());
    }
    if args.list_names {
        println!("{}", registry.list_names());
    }
    if args.list_locations {
        println!("{}", registry.list_locations());
    }
}

fn print_json(report: &RunReport) {
    match reporter::json(report) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("error: failed to serialize report: {}", e),
    }
}
