use globset::{Glob, GlobMatcher};

use crate::correlate::Triple;
use crate::error::{Error, Result};

/// Advisory-id filter compiled from glob patterns (`*`, `?`, `[...]`).
///
/// An empty pattern set matches everything. Retention is order-preserving
/// and never deduplicates; it applies identically to every correlator query.
#[derive(Debug, Clone, Default)]
pub struct AdvisoryFilter {
    matchers: Vec<GlobMatcher>,
}

impl AdvisoryFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut matchers = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = Glob::new(pattern).map_err(|e| Error::Pattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
            matchers.push(glob.compile_matcher());
        }
        Ok(Self { matchers })
    }

    pub fn matches(&self, id: &str) -> bool {
        self.matchers.is_empty() || self.matchers.iter().any(|m| m.is_match(id))
    }

    /// Triples whose advisory id matches at least one pattern, in input order.
    pub fn apply(&self, triples: &[Triple]) -> Vec<Triple> {
        triples
            .iter()
            .filter(|t| self.matches(&t.advisory.id))
            .cloned()
            .collect()
    }
}
