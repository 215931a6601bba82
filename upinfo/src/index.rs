use std::str::FromStr;
use std::sync::Arc;

use globset::{Glob, GlobMatcher};

use crate::advisory::Advisory;
use crate::error::{Error, Result};
use crate::package::Package;

/// Comparison boundary used when querying advisories for a package.
///
/// Equality always lands on the applied side: `AtOrBelow` is inclusive,
/// `Above` strict. The asymmetry is deliberate and pinned by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// Corrective version at or below the installed one (already applied).
    AtOrBelow,
    /// Corrective version strictly above the installed one (still pending).
    Above,
}

/// Read access to the resolved set of packages on the host.
pub trait PackageIndex {
    fn installed(&self) -> Result<Vec<Package>>;

    /// Installed packages whose name matches the constraint.
    fn matching(&self, spec: &PackageSpec) -> Result<Vec<Package>>;
}

/// Read access to published advisories, keyed by package and boundary.
pub trait AdvisoryIndex {
    /// Advisories carrying a corrective package for `pkg` (same name and
    /// architecture) whose version satisfies the predicate.
    fn advisories_for(&self, pkg: &Package, pred: Predicate) -> Result<Vec<Arc<Advisory>>>;
}

/// Name glob restricting correlation to a subset of installed packages.
#[derive(Debug, Clone)]
pub struct PackageSpec {
    raw: String,
    matcher: GlobMatcher,
}

impl PackageSpec {
    pub fn new(pattern: &str) -> Result<Self> {
        let glob = Glob::new(pattern).map_err(|e| Error::Pattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            raw: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.matcher.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for PackageSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
