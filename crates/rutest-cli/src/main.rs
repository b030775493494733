use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rutest::cli::{normalize_args, FilterArgs};
use std::path::PathBuf;

mod commands;

/// Runner for test executables built on the rutest harness.
///
/// Each case runs in its own child process, so a crashing case is reported
/// as a fault and the remaining cases still run.
///
/// EXAMPLES:
///     rutest list target/debug/basic_tests     List the cases of an executable
///     rutest run target/debug/*_tests           Run every case of several executables
///     rutest run -sg SecondClass --json         Run one group of the configured executables
///
/// ENVIRONMENT VARIABLES:
///     RUTEST_LOG         Log filter for diagnostics on stderr (e.g. "debug")
///     RUTEST_TIMEOUT_MS  Default per-case timeout
///     RUTEST_JSON        Set to '1' for JSON output by default
///     NO_COLOR           Set to disable colored output
#[derive(Parser)]
#[command(name = "rutest")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Diagnostic logging to stderr (-d debug, -dd trace)
    #[arg(short = 'd', long = "debug", action = clap::ArgAction::Count, global = true)]
    debug: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the cases of test executables, grouped by group
    ///
    /// Executables default to the `[executables]` patterns of rutest.toml.
    #[command(visible_alias = "ls")]
    List {
        /// Test executables
        executables: Vec<PathBuf>,
        /// Output as JSON
        #[arg(long, env = "RUTEST_JSON")]
        json: bool,
    },

    /// Run test executables, every case in its own process
    ///
    /// EXAMPLES:
    ///     rutest run build/basic_tests              Run all cases
    ///     rutest run build/basic_tests -g Second    Groups containing "Second"
    ///     rutest run --timeout-ms 2000 --json       Configured executables, JSON report
    #[command(visible_alias = "r")]
    Run {
        /// Test executables
        executables: Vec<PathBuf>,
        #[command(flatten)]
        selection: FilterArgs,
        /// Per-case timeout in milliseconds; 0 disables it
        #[arg(long = "timeout-ms", value_name = "MS")]
        timeout_ms: Option<u64>,
        /// Output the report as JSON
        #[arg(long, env = "RUTEST_JSON")]
        json: bool,
        /// Print one block per case
        #[arg(long, short = 'v')]
        verbose: bool,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

fn main() {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    rutest::logging::init(cli.debug);

    match dispatch(cli.command) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            std::process::exit(rutest::entry::USAGE_ERROR);
        }
    }
}

fn dispatch(command: Commands) -> Result<i32> {
    let config = commands::load_config()?;

    match command {
        Commands::List { executables, json } => {
            commands::list::run(&executables, &config, json)?;
            Ok(0)
        }
        Commands::Run {
            executables,
            selection,
            timeout_ms,
            json,
            verbose,
            no_color,
        } => {
            let args = commands::run::RunArgs {
                filter: selection.filter(),
                timeout_ms,
                json,
                verbose,
                no_color,
            };
            commands::run::run(&executables, &config, args)
        }
    }
}
