use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::advisory::Advisory;
use crate::error::Result;
use crate::filter::AdvisoryFilter;
use crate::index::{AdvisoryIndex, PackageIndex, PackageSpec, Predicate};
use crate::package::{Evr, Package};
use crate::vercmp::VersionOrder;

/// One correlated (corrective package, advisory, installed) entry.
#[derive(Debug, Clone)]
pub struct Triple {
    pub package: Package,
    pub advisory: Arc<Advisory>,
    /// Comparator verdict at snapshot time: the corrective version is at or
    /// below what is installed. Never re-evaluated later.
    pub installed: bool,
}

/// Whether a correlation holds one installation state or both.
///
/// Carried next to the triples instead of as a bare boolean so call sites
/// cannot silently drop it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mix {
    /// Every triple shares one installed state, or the set is empty.
    Uniform,
    /// Applied and pending triples are both present.
    Mixed,
}

impl Mix {
    pub fn is_mixed(self) -> bool {
        matches!(self, Mix::Mixed)
    }
}

/// Result of one correlator query.
#[derive(Debug, Clone)]
pub struct Correlation {
    pub mix: Mix,
    pub triples: Vec<Triple>,
}

impl Correlation {
    pub fn is_mixed(&self) -> bool {
        self.mix.is_mixed()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }
}

#[derive(Debug, Default)]
struct Snapshot {
    applied: Vec<Triple>,
    pending: Vec<Triple>,
}

/// Invocation-scoped memo of the installed/advisory correlation.
///
/// One instance serves one invocation: the first query refreshes it
/// implicitly, `clear` drops it, and nothing is reused afterwards. The
/// `&mut` receivers rule out sharing an instance between concurrent users;
/// callers wanting parallelism create independent instances.
#[derive(Debug, Default)]
pub struct InstalledCache {
    snapshot: Option<Snapshot>,
}

impl InstalledCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the memoized applied/pending pair lists.
    ///
    /// Every scanned package is asked for its advisories under both
    /// predicates; each corrective package is classified by comparing its
    /// version with the installed one of the same name and architecture
    /// (equality counts as applied, absence as pending). A pair reachable
    /// through several installed packages is recorded once.
    pub fn refresh(
        &mut self,
        packages: &dyn PackageIndex,
        advisories: &dyn AdvisoryIndex,
        order: &dyn VersionOrder,
        restrict: Option<&PackageSpec>,
    ) -> Result<()> {
        let installed = packages.installed()?;
        let ievr: HashMap<(String, String), Evr> = installed
            .iter()
            .map(|p| ((p.name.clone(), p.arch.clone()), p.evr.clone()))
            .collect();
        let scan = match restrict {
            Some(spec) => packages.matching(spec)?,
            None => installed,
        };

        let mut snapshot = Snapshot::default();
        let mut seen: HashSet<(String, String)> = HashSet::new();
        for pkg in &scan {
            for pred in [Predicate::AtOrBelow, Predicate::Above] {
                for advisory in advisories.advisories_for(pkg, pred)? {
                    for corrective in &advisory.packages {
                        let key = (corrective.name.clone(), corrective.arch.clone());
                        let applied = match ievr.get(&key) {
                            Some(iv) => order.cmp_evr(iv, &corrective.evr)? != Ordering::Less,
                            None => false,
                        };
                        if applied != (pred == Predicate::AtOrBelow) {
                            continue;
                        }
                        if !seen.insert((advisory.id.clone(), corrective.filename.clone())) {
                            continue;
                        }
                        let triple = Triple {
                            package: corrective.clone(),
                            advisory: advisory.clone(),
                            installed: applied,
                        };
                        if applied {
                            snapshot.applied.push(triple);
                        } else {
                            snapshot.pending.push(triple);
                        }
                    }
                }
            }
        }
        debug!(
            applied = snapshot.applied.len(),
            pending = snapshot.pending.len(),
            "refreshed installed snapshot"
        );
        self.snapshot = Some(snapshot);
        Ok(())
    }

    /// Drops the memoized state. Idempotent; safe without a prior refresh.
    pub fn clear(&mut self) {
        self.snapshot = None;
    }

    fn is_fresh(&self) -> bool {
        self.snapshot.is_some()
    }
}

/// Core engine answering the three report queries over injected indexes.
pub struct Correlator<'a> {
    packages: &'a dyn PackageIndex,
    advisories: &'a dyn AdvisoryIndex,
    order: &'a dyn VersionOrder,
    restrict: Option<PackageSpec>,
    cache: InstalledCache,
}

impl<'a> Correlator<'a> {
    pub fn new(
        packages: &'a dyn PackageIndex,
        advisories: &'a dyn AdvisoryIndex,
        order: &'a dyn VersionOrder,
    ) -> Self {
        Self {
            packages,
            advisories,
            order,
            restrict: None,
            cache: InstalledCache::new(),
        }
    }

    /// Restricts correlation to installed packages whose name matches the
    /// constraint. Classification still compares against the full installed
    /// set.
    pub fn restrict_packages(mut self, spec: PackageSpec) -> Self {
        self.restrict = Some(spec);
        self
    }

    pub fn refresh(&mut self) -> Result<()> {
        self.cache
            .refresh(self.packages, self.advisories, self.order, self.restrict.as_ref())
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    fn snapshot(&mut self) -> Result<&Snapshot> {
        if !self.cache.is_fresh() {
            self.refresh()?;
        }
        Ok(self.cache.snapshot.as_ref().expect("snapshot just refreshed"))
    }

    /// Already-applied correlations; `mix` is always `Uniform`.
    pub fn installed(&mut self, filter: &AdvisoryFilter) -> Result<Correlation> {
        let snapshot = self.snapshot()?;
        Ok(Correlation {
            mix: Mix::Uniform,
            triples: filter.apply(&snapshot.applied),
        })
    }

    /// Still-pending correlations; `mix` is always `Uniform`.
    pub fn updating(&mut self, filter: &AdvisoryFilter) -> Result<Correlation> {
        let snapshot = self.snapshot()?;
        Ok(Correlation {
            mix: Mix::Uniform,
            triples: filter.apply(&snapshot.pending),
        })
    }

    /// Union of both, applied triples first. `Mixed` exactly when both sides
    /// survive the filter.
    pub fn all(&mut self, filter: &AdvisoryFilter) -> Result<Correlation> {
        let snapshot = self.snapshot()?;
        let mut triples = filter.apply(&snapshot.applied);
        let pending = filter.apply(&snapshot.pending);
        let mix = if !triples.is_empty() && !pending.is_empty() {
            Mix::Mixed
        } else {
            Mix::Uniform
        };
        triples.extend(pending);
        Ok(Correlation { mix, triples })
    }
}
