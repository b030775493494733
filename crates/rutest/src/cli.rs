//! Command line of a test suite binary
//!
//! Besides the usual `--long` flags, suites accept the traditional
//! single-dash spellings (`-sg`, `-sn`, `-xg`, `-xn`, `-ln`, `-lg`, `-ll`),
//! which are rewritten to their long forms before parsing.

use crate::filter::{NameMatcher, TestFilter};
use crate::runner::Isolation;
use clap::{Args, Parser};
use std::ffi::OsString;

const SINGLE_DASH_FLAGS: [&str; 7] = ["sg", "sn", "xg", "xn", "ln", "lg", "ll"];

/// Case selection flags, shared with the `rutest` CLI
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterArgs {
    /// Only run groups whose name contains TEXT
    #[arg(short = 'g', long = "group", value_name = "TEXT", conflicts_with = "sg")]
    pub group: Option<String>,

    /// Only run the group named exactly GROUP
    #[arg(long = "sg", value_name = "GROUP")]
    pub sg: Option<String>,

    /// Only run cases whose name contains TEXT
    #[arg(short = 'n', long = "name", value_name = "TEXT", conflicts_with = "sn")]
    pub name: Option<String>,

    /// Only run the case named exactly CASE
    #[arg(long = "sn", value_name = "CASE")]
    pub sn: Option<String>,

    /// Skip groups whose name contains TEXT (repeatable)
    #[arg(long = "xg", value_name = "TEXT")]
    pub exclude_groups: Vec<String>,

    /// Skip cases whose name contains TEXT (repeatable)
    #[arg(long = "xn", value_name = "TEXT")]
    pub exclude_names: Vec<String>,
}

impl FilterArgs {
    pub fn filter(&self) -> TestFilter {
        let mut filter = TestFilter::all();

        if let Some(group) = &self.sg {
            filter = filter.with_group(NameMatcher::Exact(group.clone()));
        } else if let Some(group) = &self.group {
            filter = filter.with_group(NameMatcher::Contains(group.clone()));
        }

        if let Some(name) = &self.sn {
            filter = filter.with_name(NameMatcher::Exact(name.clone()));
        } else if let Some(name) = &self.name {
            filter = filter.with_name(NameMatcher::Contains(name.clone()));
        }

        for text in &self.exclude_groups {
            filter = filter.excluding_group(text.clone());
        }
        for text in &self.exclude_names {
            filter = filter.excluding_name(text.clone());
        }

        filter
    }
}

/// Run the tests declared in this executable
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(version, about)]
pub struct HarnessArgs {
    /// Print one block per case
    #[arg(short = 'v', long)]
    pub verbose: bool,

    #[command(flatten)]
    pub selection: FilterArgs,

    /// List case names (`Group.Case ...`) and exit
    #[arg(long = "ln")]
    pub list_names: bool,

    /// List group names and exit
    #[arg(long = "lg")]
    pub list_groups: bool,

    /// List case locations (`Group.Case.file.line`) and exit
    #[arg(long = "ll")]
    pub list_locations: bool,

    /// Where case bodies run: process or in-process
    #[arg(long, value_name = "MODE")]
    pub isolation: Option<Isolation>,

    /// Per-case timeout in milliseconds; 0 disables it
    #[arg(long = "timeout-ms", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Print the report as JSON instead of console output
    #[arg(long)]
    pub json: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Diagnostic logging to stderr (-d debug, -dd trace)
    #[arg(short = 'd', long = "debug", action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Only run cases whose `Group.Case` name contains PATTERN
    #[arg(value_name = "PATTERN")]
    pub pattern: Option<String>,
}

impl HarnessArgs {
    /// Parse a full argument list (program name first)
    pub fn parse_from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_args(args))
    }

    /// Case selection described by the arguments
    pub fn filter(&self) -> TestFilter {
        let filter = self.selection.filter();
        match &self.pattern {
            Some(pattern) => filter.with_pattern(pattern.clone()),
            None => filter,
        }
    }

    /// Whether any listing flag was given
    pub fn is_listing(&self) -> bool {
        self.list_names || self.list_groups || self.list_locations
    }
}

/// Rewrite single-dash multi-letter flags (`-sg`) to long flags (`--sg`)
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            let rewritten = arg.to_str().and_then(|text| {
                let flag = text.strip_prefix('-')?;
                let (name, value) = match flag.split_once('=') {
                    Some((name, value)) => (name, Some(value)),
                    None => (flag, None),
                };
                if !SINGLE_DASH_FLAGS.contains(&name) {
                    return None;
                }
                Some(match value {
                    Some(value) => format!("--{}={}", name, value),
                    None => format!("--{}", name),
                })
            });
            rewritten.map(OsString::from).unwrap_or(arg)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(args: &[&str]) -> HarnessArgs {
        let mut full = vec!["suite"];
        full.extend_from_slice(args);
        HarnessArgs::parse_from_args(full).unwrap()
    }

    #[rstest]
    #[case(&["-sg", "G"], &["--sg", "G"])]
    #[case(&["-sn=C"], &["--sn=C"])]
    #[case(&["-ln"], &["--ln"])]
    #[case(&["-v", "-g", "G"], &["-v", "-g", "G"])]
    #[case(&["--sg", "G"], &["--sg", "G"])]
    #[case(&["-dd"], &["-dd"])]
    fn test_normalize_args(#[case] input: &[&str], #[case] expected: &[&str]) {
        let normalized: Vec<OsString> = normalize_args(input.iter().copied());
        let expected: Vec<OsString> = expected.iter().map(OsString::from).collect();
        assert_eq!(normalized, expected);
    }

    #[test]
    fn test_child_invocation() {
        let args = parse(&[
            "-sg",
            "SecondClass",
            "-sn",
            "ShouldFail",
            "-v",
            "--isolation",
            "in-process",
            "--no-color",
            "--timeout-ms",
            "0",
        ]);

        assert!(args.verbose);
        assert!(args.no_color);
        assert_eq!(args.isolation, Some(Isolation::InProcess));
        assert_eq!(args.timeout_ms, Some(0));

        let filter = args.filter();
        assert!(filter.matches("SecondClass", "ShouldFail"));
        assert!(!filter.matches("SecondClass", "ShouldFailToo"));
        assert!(!filter.matches("SecondClassic", "ShouldFail"));
    }

    #[rstest]
    #[case(&["-g", "Second"], "SecondClass", "ShouldPass", true)]
    #[case(&["-g", "Second"], "ClassName", "ShouldPass", false)]
    #[case(&["-n", "Pass"], "ClassName", "ShouldPass", true)]
    #[case(&["-xg", "Class"], "ClassName", "Create", false)]
    #[case(&["-xn", "Ignored", "-xn", "Fail"], "SecondClass", "ShouldFail", false)]
    #[case(&["ClassName.Cr"], "ClassName", "Create", true)]
    #[case(&["ClassName.Cr"], "ClassName", "ShouldPass", false)]
    fn test_filters(
        #[case] argv: &[&str],
        #[case] group: &str,
        #[case] name: &str,
        #[case] selected: bool,
    ) {
        assert_eq!(parse(argv).filter().matches(group, name), selected);
    }

    #[test]
    fn test_listing_flags() {
        assert!(parse(&["-ln"]).list_names);
        assert!(parse(&["-lg"]).list_groups);
        assert!(parse(&["-ll"]).is_listing());
        assert!(!parse(&[]).is_listing());
    }

    #[test]
    fn test_debug_count() {
        assert_eq!(parse(&["-dd"]).debug, 2);
    }

    #[test]
    fn test_rejects_bad_isolation() {
        assert!(HarnessArgs::parse_from_args(["suite", "--isolation", "sandbox"]).is_err());
    }

    #[test]
    fn test_rejects_conflicting_group_filters() {
        assert!(HarnessArgs::parse_from_args(["suite", "-g", "A", "-sg", "B"]).is_err());
    }
}
