//! Case selection by group and case name

/// How a name filter compares against a group or case name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatcher {
    /// Name contains the text (`-g`, `-n`)
    Contains(String),
    /// Name equals the text (`-sg`, `-sn`)
    Exact(String),
}

impl NameMatcher {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NameMatcher::Contains(text) => name.contains(text.as_str()),
            NameMatcher::Exact(text) => name == text,
        }
    }
}

/// Selects which declared cases a run visits. The default selects everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestFilter {
    group: Option<NameMatcher>,
    name: Option<NameMatcher>,
    exclude_groups: Vec<String>,
    exclude_names: Vec<String>,
    pattern: Option<String>,
}

impl TestFilter {
    /// Filter that selects every case
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter that selects exactly one case
    pub fn exact(group: &str, name: &str) -> Self {
        Self::all()
            .with_group(NameMatcher::Exact(group.to_string()))
            .with_name(NameMatcher::Exact(name.to_string()))
    }

    pub fn with_group(mut self, matcher: NameMatcher) -> Self {
        self.group = Some(matcher);
        self
    }

    pub fn with_name(mut self, matcher: NameMatcher) -> Self {
        self.name = Some(matcher);
        self
    }

    /// Skip groups whose name contains `text`
    pub fn excluding_group(mut self, text: impl Into<String>) -> Self {
        self.exclude_groups.push(text.into());
        self
    }

    /// Skip cases whose name contains `text`
    pub fn excluding_name(mut self, text: impl Into<String>) -> Self {
        self.exclude_names.push(text.into());
        self
    }

    /// Select cases whose `Group.Case` name contains `pattern`
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Whether the filter narrows the selection at all
    pub fn is_all(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, group: &str, name: &str) -> bool {
        if let Some(matcher) = &self.group {
            if !matcher.matches(group) {
                return false;
            }
        }
        if let Some(matcher) = &self.name {
            if !matcher.matches(name) {
                return false;
            }
        }
        if self.exclude_groups.iter().any(|x| group.contains(x.as_str())) {
            return false;
        }
        if self.exclude_names.iter().any(|x| name.contains(x.as_str())) {
            return false;
        }
        match &self.pattern {
            Some(pattern) => format!("{}.{}", group, name).contains(pattern.as_str()),
            None => true,
        }
    }
}
