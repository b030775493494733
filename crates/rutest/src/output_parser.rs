//! Parsing of suite output: verbose per-case blocks, `-ln` test lists and
//! `-ll` location lists
//!
//! A verbose block looks like
//!
//! ```text
//! TEST(SecondClass, ShouldFail)
//! src/bin/basic_tests.rs:41: error: Failure in TEST(SecondClass, ShouldFail)
//!     Message: This is failing
//!     CHECK_TEXT(false) failed
//!
//!  - 0 ms
//! ```
//!
//! Passing cases print `TEST(Group, Case) - N ms` and ignored ones
//! `IGNORE_TEST(Group, Case) - N ms`.

use crate::assertions::Location;
use crate::report::FailureKind;
use regex::Regex;
use std::sync::OnceLock;

/// State of a case as read from its output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestState {
    Passed,
    Failed,
    Skipped,
    /// No case header was found
    Unknown,
}

/// Result read from one case's verbose output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResult {
    pub state: TestState,
    /// Set when `state` is `Failed`
    pub kind: Option<FailureKind>,
    pub message: String,
    pub location: Option<Location>,
}

impl ParsedResult {
    fn with_state(state: TestState) -> Self {
        Self {
            state,
            kind: None,
            message: String::new(),
            location: None,
        }
    }
}

fn header_regex() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        Regex::new(r"^(IGNORE_)?TEST\(([^,\s()]+), ([^,\s()]+)\)").expect("valid header regex")
    })
}

fn failure_regex() -> &'static Regex {
    static FAILURE: OnceLock<Regex> = OnceLock::new();
    FAILURE.get_or_init(|| {
        Regex::new(r"^(?:(.+):(\d+): )?error: (Failure|Fault|Timeout) in TEST\(([^,\s()]+), ([^,\s()]+)\)")
            .expect("valid failure regex")
    })
}

/// Render the failure line the parser reads back
pub fn failure_line(kind: FailureKind, location: Option<&Location>, group: &str, case: &str) -> String {
    match location {
        Some(location) => format!(
            "{}: error: {} in TEST({}, {})",
            location,
            kind.label(),
            group,
            case
        ),
        None => format!("error: {} in TEST({}, {})", kind.label(), group, case),
    }
}

/// Read the outcome of a single case from its verbose output.
///
/// The failure message is the run of lines after the failure line up to the
/// first empty one. Each line loses one leading tab; a lone tab is a blank
/// message line.
pub fn parse_case_output(output: &str) -> ParsedResult {
    let mut result = ParsedResult::with_state(TestState::Unknown);
    let mut message_lines: Vec<&str> = Vec::new();
    let mut collecting = false;

    for line in output.lines() {
        if collecting {
            if line.is_empty() {
                break;
            }
            message_lines.push(line.strip_prefix('\t').unwrap_or_else(|| line.trim_start()));
            continue;
        }

        if let Some(caps) = header_regex().captures(line) {
            if caps.get(1).is_some() {
                return ParsedResult::with_state(TestState::Skipped);
            }
            result.state = TestState::Passed;
            continue;
        }

        if let Some(caps) = failure_regex().captures(line.trim_start()) {
            result.state = TestState::Failed;
            result.kind = caps.get(3).and_then(|k| FailureKind::from_label(k.as_str()));
            result.location = match (caps.get(1), caps.get(2)) {
                (Some(file), Some(line)) => line
                    .as_str()
                    .parse()
                    .ok()
                    .map(|n| Location::new(file.as_str(), n)),
                _ => None,
            };
            collecting = true;
        }
    }

    result.message = message_lines.join("\n");
    result
}

/// Parse `-ln` output (`Group.Case Group.Case ...`) into (group, case) pairs.
///
/// Tokens without a `.` are skipped.
pub fn parse_test_list(output: &str) -> Vec<(String, String)> {
    output
        .split_whitespace()
        .filter_map(|token| {
            let (group, case) = token.split_once('.')?;
            if group.is_empty() || case.is_empty() {
                return None;
            }
            Some((group.to_string(), case.to_string()))
        })
        .collect()
}

/// A case and where it is declared, as listed by `-ll`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestLocation {
    pub group: String,
    pub case: String,
    pub location: Location,
}

/// Parse `-ll` output, one `Group.Case.file.line` per line.
///
/// Names hold no `.`, so the file is everything between the case and the
/// last `.`. Malformed lines are skipped.
pub fn parse_location_list(output: &str) -> Vec<TestLocation> {
    output
        .lines()
        .filter_map(|line| {
            let (group, rest) = line.trim().split_once('.')?;
            let (case, rest) = rest.split_once('.')?;
            let (file, line) = rest.rsplit_once('.')?;
            if group.is_empty() || case.is_empty() || file.is_empty() {
                return None;
            }
            Some(TestLocation {
                group: group.to_string(),
                case: case.to_string(),
                location: Location::new(file, line.parse().ok()?),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_passing() {
        let result = parse_case_output("TEST(SecondClass, ShouldPass) - 0 ms\n\nOK (9 tests, 1 ran)\n");
        assert_eq!(result.state, TestState::Passed);
        assert!(result.message.is_empty());
    }

    #[test]
    fn test_parse_ignored() {
        let result = parse_case_output("IGNORE_TEST(SecondClass, ShouldBeIgnored) - 0 ms\n");
        assert_eq!(result.state, TestState::Skipped);
    }

    #[test]
    fn test_parse_failing_with_location() {
        let output = "TEST(SecondClass, ShouldFail)\n\
                      src/bin/basic_tests.rs:41: error: Failure in TEST(SecondClass, ShouldFail)\n\
                      \tMessage: This is failing\n\
                      \tCHECK_TEXT(false) failed\n\
                      \n - 1 ms\n";
        let result = parse_case_output(output);

        assert_eq!(result.state, TestState::Failed);
        assert_eq!(result.kind, Some(FailureKind::Assertion));
        assert_eq!(result.location, Some(Location::new("src/bin/basic_tests.rs", 41)));
        assert_eq!(result.message, "Message: This is failing\nCHECK_TEXT(false) failed");
    }

    #[test]
    fn test_parse_fault_without_location() {
        let output = "TEST(Specials, Crash)\nerror: Fault in TEST(Specials, Crash)\n\tpanicked: boom\n";
        let result = parse_case_output(output);

        assert_eq!(result.state, TestState::Failed);
        assert_eq!(result.kind, Some(FailureKind::Fault));
        assert_eq!(result.location, None);
        assert_eq!(result.message, "panicked: boom");
    }

    #[test]
    fn test_parse_keeps_blank_and_indented_message_lines() {
        let output = "TEST(G, C)\n\
                      a.rs:5: error: Failure in TEST(G, C)\n\
                      \tfirst paragraph\n\
                      \t\n\
                      \t    indented detail\n\
                      \n - 0 ms\n";
        let result = parse_case_output(output);

        assert_eq!(result.message, "first paragraph\n\n    indented detail");
    }

    #[test]
    fn test_parse_unknown_when_no_header() {
        let result = parse_case_output("Segmentation fault\n");
        assert_eq!(result.state, TestState::Unknown);
    }

    #[test]
    fn test_failure_line_is_parseable() {
        let location = Location::new("a.rs", 3);
        let line = failure_line(FailureKind::Timeout, Some(&location), "G", "C");
        let result = parse_case_output(&format!("TEST(G, C)\n{}\n\ttoo slow\n", line));
        assert_eq!(result.kind, Some(FailureKind::Timeout));
        assert_eq!(result.location, Some(location));
    }

    #[test]
    fn test_parse_test_list() {
        let list = parse_test_list("Group1.Test1 Group2.Test2\nGroup2.Test3 junk .x y.\n");
        assert_eq!(
            list,
            vec![
                ("Group1".to_string(), "Test1".to_string()),
                ("Group2".to_string(), "Test2".to_string()),
                ("Group2".to_string(), "Test3".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_location_list() {
        let list = parse_location_list(
            "Specials.Pass.crates/rutest-cli/src/bin/basic_tests.rs.14\n\
             OtherTests.Ok.C:/work/other.tests.rs.7\n\
             junk\n\
             Group.Case.file.notanumber\n",
        );

        assert_eq!(
            list,
            vec![
                TestLocation {
                    group: "Specials".to_string(),
                    case: "Pass".to_string(),
                    location: Location::new("crates/rutest-cli/src/bin/basic_tests.rs", 14),
                },
                TestLocation {
                    group: "OtherTests".to_string(),
                    case: "Ok".to_string(),
                    location: Location::new("C:/work/other.tests.rs", 7),
                },
            ]
        );
    }
}
