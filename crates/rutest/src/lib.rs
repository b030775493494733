//! rutest - an xUnit-style test registry and runner
//!
//! Suites are ordinary binaries: they declare named groups and cases on an
//! explicit [`Registry`], then hand control to [`run_main`], which parses the
//! command line, runs every selected case in registration order and returns
//! the process exit code.
//!
//! ```no_run
//! use rutest::{check_text, Registry};
//!
//! fn declare(registry: &mut Registry) -> rutest::HarnessResult<()> {
//!     let group = registry.declare_group("Arithmetic")?;
//!     registry.declare_case(&group, "Adds", || check_text!(1 + 1 == 2, "sum"))?;
//!     registry.declare_ignored_case(&group, "Overflows", || rutest::fail("todo"))?;
//!     Ok(())
//! }
//!
//! fn main() {
//!     std::process::exit(rutest::run_suite(declare));
//! }
//! ```
//!
//! By default each case runs in its own child process (the suite binary
//! re-invoked with `-sg <group> -sn <case> -v`), so a crashing case is
//! reported as a fault instead of taking the whole run down.

pub mod assertions;
pub mod cancel;
pub mod cli;
pub mod entry;
pub mod error;
pub mod executable;
pub mod filter;
pub mod logging;
pub mod output_parser;
pub mod registry;
pub mod report;
pub mod reporter;
pub mod runner;

pub use assertions::{check, check_equal, check_false, fail, AssertionFailure, CaseResult, Location};
pub use cancel::CancelToken;
pub use entry::{run_main, run_suite, run_with_args};
pub use error::{HarnessError, HarnessResult};
pub use executable::{ChildExit, ChildOutput, ExecutableRunner};
pub use output_parser::TestLocation;
pub use filter::{NameMatcher, TestFilter};
pub use registry::{CaseHandle, GroupHandle, Registry, TestCase, TestGroup};
pub use report::{CaseOutcome, CaseRun, Failure, FailureKind, FailureRecord, RunReport};
pub use reporter::{ConsoleReporter, RunListener, SilentListener};
pub use runner::{run_all, Isolation, TestRunner};
