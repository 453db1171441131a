//! Filter: a pattern that auto-attaches to newly appearing processes.

use crate::id::{FilterId, JobContextId};

/// How a Filter's pattern is matched against a candidate process name/URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterPattern {
    Substring(String),
    ExactName(String),
    Url(String),
}

impl FilterPattern {
    pub fn matches(&self, candidate_name: &str, candidate_url: Option<&str>) -> bool {
        match self {
            FilterPattern::Substring(s) => candidate_name.contains(s.as_str()),
            FilterPattern::ExactName(s) => candidate_name == s,
            FilterPattern::Url(s) => candidate_url == Some(s.as_str()),
        }
    }
}

/// A persistent pattern that auto-attaches to newly appearing processes
/// matching it, optionally scoped to a JobContext.
#[derive(Debug, Clone)]
pub struct Filter {
    id: FilterId,
    pattern: FilterPattern,
    job_scope: Option<JobContextId>,
}

impl Filter {
    pub fn new(id: FilterId, pattern: FilterPattern, job_scope: Option<JobContextId>) -> Self {
        Self { id, pattern, job_scope }
    }

    pub fn id(&self) -> FilterId {
        self.id
    }

    pub fn pattern(&self) -> &FilterPattern {
        &self.pattern
    }

    pub fn job_scope(&self) -> Option<JobContextId> {
        self.job_scope
    }

    /// Whether this filter matches a newly-reported process, given the
    /// JobContext (if any) the process was reported under.
    pub fn matches(&self, name: &str, url: Option<&str>, reported_under: Option<JobContextId>) -> bool {
        if let Some(scope) = self.job_scope {
            if Some(scope) != reported_under {
                return false;
            }
        }
        self.pattern.matches(name, url)
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
