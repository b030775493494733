//! List command - print the cases of test executables

use anyhow::{Context, Result};
use colored::Colorize;
use rutest::{ExecutableRunner, Location, TestLocation};
use rutest_config::Config;
use std::collections::HashMap;
use std::path::PathBuf;

/// A listed case and, when the executable reports it, where it is declared
#[derive(Debug, Clone, PartialEq, Eq)]
struct ListedCase {
    group: String,
    case: String,
    location: Option<Location>,
}

/// Print each executable's cases grouped by group
pub fn run(executables: &[PathBuf], config: &Config, json: bool) -> Result<()> {
    let runners = super::resolve_executables(executables, config)?;
    let mut listings = Vec::with_capacity(runners.len());

    for runner in &runners {
        let tests = runner
            .list_tests()
            .with_context(|| format!("failed to list tests of {}", runner.command().display()))?;
        let locations = locations_of(runner);
        listings.push((runner, with_locations(tests, locations)));
    }

    if json {
        let value: Vec<_> = listings
            .iter()
            .map(|(runner, cases)| {
                serde_json::json!({
                    "executable": runner.name(),
                    "path": runner.command(),
                    "tests": cases
                        .iter()
                        .map(|listed| {
                            let mut entry = serde_json::json!({
                                "group": listed.group,
                                "case": listed.case,
                            });
                            if let Some(location) = &listed.location {
                                entry["file"] = location.file.clone().into();
                                entry["line"] = location.line.into();
                            }
                            entry
                        })
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    for (runner, cases) in &listings {
        println!("{} ({} tests)", runner.name().bold(), cases.len());
        for (group, cases) in group_cases(cases) {
            println!("  {}", group.cyan());
            for listed in cases {
                match &listed.location {
                    Some(location) => {
                        println!("    {}  {}", listed.case, format!("({})", location).dimmed())
                    }
                    None => println!("    {}", listed.case),
                }
            }
        }
    }

    Ok(())
}

/// `-ll` output of an executable; suites without it list names only
fn locations_of(runner: &ExecutableRunner) -> Vec<TestLocation> {
    match runner.list_locations() {
        Ok(locations) => locations,
        Err(e) => {
            tracing::warn!(executable = runner.name(), error = %e, "cannot list test locations");
            Vec::new()
        }
    }
}

/// Attach locations to the `-ln` list, keeping its order
fn with_locations(tests: Vec<(String, String)>, locations: Vec<TestLocation>) -> Vec<ListedCase> {
    let mut by_name: HashMap<(String, String), Location> = locations
        .into_iter()
        .map(|l| ((l.group, l.case), l.location))
        .collect();

    tests
        .into_iter()
        .map(|(group, case)| {
            let location = by_name.remove(&(group.clone(), case.clone()));
            ListedCase {
                group,
                case,
                location,
            }
        })
        .collect()
}

/// Group cases by group name, keeping first-seen group order
fn group_cases(cases: &[ListedCase]) -> Vec<(&str, Vec<&ListedCase>)> {
    let mut groups: Vec<(&str, Vec<&ListedCase>)> = Vec::new();
    for listed in cases {
        match groups.iter_mut().find(|(name, _)| *name == listed.group) {
            Some((_, members)) => members.push(listed),
            None => groups.push((listed.group.as_str(), vec![listed])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(names: &[(&str, &str)]) -> Vec<(String, String)> {
        names
            .iter()
            .map(|(g, c)| (g.to_string(), c.to_string()))
            .collect()
    }

    #[test]
    fn test_group_cases_keeps_order() {
        let cases = with_locations(pairs(&[("B", "x"), ("A", "y"), ("B", "z")]), Vec::new());

        let grouped: Vec<(&str, Vec<&str>)> = group_cases(&cases)
            .into_iter()
            .map(|(group, members)| (group, members.iter().map(|l| l.case.as_str()).collect()))
            .collect();
        assert_eq!(grouped, vec![("B", vec!["x", "z"]), ("A", vec!["y"])]);
    }

    #[test]
    fn test_locations_attach_by_name() {
        let locations = vec![TestLocation {
            group: "A".to_string(),
            case: "y".to_string(),
            location: Location::new("src/a.rs", 4),
        }];
        let cases = with_locations(pairs(&[("B", "x"), ("A", "y")]), locations);

        assert_eq!(cases[0].location, None);
        assert_eq!(cases[1].location, Some(Location::new("src/a.rs", 4)));
    }
}
