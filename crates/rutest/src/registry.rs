//! Test registry - declared groups and cases
//!
//! Declaration and execution are separate phases: a suite fills a
//! [`Registry`] first, then hands it to the runner read-only.

use crate::assertions::{CaseResult, Location};
use crate::error::{HarnessError, HarnessResult};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Executable body of a case
pub type CaseBody = Arc<dyn Fn() -> CaseResult + Send + Sync + 'static>;

/// A declared group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestGroup {
    pub name: String,
}

/// Handle returned by [`Registry::declare_group`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupHandle {
    index: usize,
    name: String,
}

impl GroupHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl AsRef<str> for GroupHandle {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

/// Handle returned by [`Registry::declare_case`]; the case's registration index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaseHandle(usize);

impl CaseHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A declared case
#[derive(Clone)]
pub struct TestCase {
    pub group: String,
    pub name: String,
    pub ignored: bool,
    /// Where the case was declared
    pub location: Location,
    body: CaseBody,
}

impl TestCase {
    /// `Group.Case`
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.group, self.name)
    }

    /// Shared handle to the body, for running it on another thread
    pub fn body(&self) -> CaseBody {
        Arc::clone(&self.body)
    }

    /// Invoke the body on the current thread
    pub fn invoke(&self) -> CaseResult {
        (self.body)()
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("group", &self.group)
            .field("name", &self.name)
            .field("ignored", &self.ignored)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// All declared groups and cases, in registration order
#[derive(Debug, Default)]
pub struct Registry {
    groups: Vec<TestGroup>,
    group_index: HashMap<String, usize>,
    cases: Vec<TestCase>,
    case_keys: HashSet<(String, String)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group, or re-open it if the name is already declared.
    ///
    /// Re-opening returns the handle of the existing group.
    pub fn declare_group(&mut self, name: &str) -> HarnessResult<GroupHandle> {
        if let Some(&index) = self.group_index.get(name) {
            return Ok(GroupHandle {
                index,
                name: name.to_string(),
            });
        }

        validate_name("group", name)?;

        let index = self.groups.len();
        self.groups.push(TestGroup {
            name: name.to_string(),
        });
        self.group_index.insert(name.to_string(), index);

        Ok(GroupHandle {
            index,
            name: name.to_string(),
        })
    }

    /// Register a case that runs when selected
    #[track_caller]
    pub fn declare_case<G, F>(&mut self, group: G, name: &str, body: F) -> HarnessResult<CaseHandle>
    where
        G: AsRef<str>,
        F: Fn() -> CaseResult + Send + Sync + 'static,
    {
        self.declare(group.as_ref(), name, Arc::new(body), false)
    }

    /// Register a case that is counted as ignored and never invoked
    #[track_caller]
    pub fn declare_ignored_case<G, F>(
        &mut self,
        group: G,
        name: &str,
        body: F,
    ) -> HarnessResult<CaseHandle>
    where
        G: AsRef<str>,
        F: Fn() -> CaseResult + Send + Sync + 'static,
    {
        self.declare(group.as_ref(), name, Arc::new(body), true)
    }

    /// Register a case under an already declared group.
    ///
    /// A rejected declaration leaves the registry unchanged.
    #[track_caller]
    pub fn declare(
        &mut self,
        group: &str,
        name: &str,
        body: CaseBody,
        ignored: bool,
    ) -> HarnessResult<CaseHandle> {
        if !self.group_index.contains_key(group) {
            return Err(HarnessError::UnknownGroup(group.to_string()));
        }
        validate_name("case", name)?;

        let key = (group.to_string(), name.to_string());
        if self.case_keys.contains(&key) {
            return Err(HarnessError::duplicate_case(group, name));
        }

        let handle = CaseHandle(self.cases.len());
        self.cases.push(TestCase {
            group: key.0.clone(),
            name: key.1.clone(),
            ignored,
            location: Location::caller(),
            body,
        });
        self.case_keys.insert(key);

        Ok(handle)
    }

    pub fn groups(&self) -> &[TestGroup] {
        &self.groups
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn case(&self, handle: CaseHandle) -> Option<&TestCase> {
        self.cases.get(handle.0)
    }

    pub fn find(&self, group: &str, name: &str) -> Option<&TestCase> {
        self.cases
            .iter()
            .find(|c| c.group == group && c.name == name)
    }

    /// Cases of one group, in registration order
    pub fn cases_in<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a TestCase> + 'a {
        self.cases.iter().filter(move |c| c.group == group)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Space separated `Group.Case` list, the `-ln` output
    pub fn list_names(&self) -> String {
        self.cases
            .iter()
            .map(TestCase::full_name)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Space separated group list, the `-lg` output
    pub fn list_groups(&self) -> String {
        self.groups
            .iter()
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// One `Group.Case.file.line` entry per case, the `-ll` output
    pub fn list_locations(&self) -> String {
        self.cases
            .iter()
            .map(|c| format!("{}.{}.{}", c.full_name(), c.location.file, c.location.line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Names travel through `Group.Case` listings and `TEST(Group, Case)` lines,
/// so separators are not allowed in them. A leading `-` would read as a flag
/// on the child command line.
fn validate_name(kind: &'static str, name: &str) -> HarnessResult<()> {
    let reason = if name.is_empty() {
        Some("name cannot be empty")
    } else if name.chars().any(char::is_whitespace) {
        Some("name cannot contain whitespace")
    } else if name.contains(['.', ',', '(', ')']) {
        Some("name cannot contain '.', ',', '(' or ')'")
    } else if name.starts_with('-') {
        Some("name cannot start with '-'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(HarnessError::InvalidName {
            kind,
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
