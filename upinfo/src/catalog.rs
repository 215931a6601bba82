use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::advisory::{Advisory, AdvisoryKind};
use crate::error::{Error, Result};
use crate::index::{AdvisoryIndex, PackageIndex, PackageSpec, Predicate};
use crate::package::{ARCHIVE_SUFFIX, Evr, Package};
use crate::vercmp::VersionOrder;

#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    packages: Vec<RawPackage>,
    #[serde(default)]
    advisories: Vec<RawAdvisory>,
}

#[derive(Deserialize)]
struct RawPackage {
    name: String,
    evr: Evr,
    arch: String,
    #[serde(default)]
    filename: Option<String>,
}

#[derive(Deserialize)]
struct RawAdvisory {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    updated: i64,
    #[serde(default)]
    description: String,
    #[serde(default)]
    packages: Vec<RawPackage>,
}

/// In-memory package and advisory indexes over one resolved-metadata
/// snapshot.
///
/// The snapshot is produced elsewhere (repository metadata is never parsed
/// here); this adapter only answers queries against it, ordering versions
/// through the injected comparator.
pub struct Catalog {
    packages: Vec<Package>,
    advisories: Vec<Arc<Advisory>>,
    order: Box<dyn VersionOrder>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("packages", &self.packages)
            .field("advisories", &self.advisories)
            .finish_non_exhaustive()
    }
}

impl Catalog {
    pub fn new(
        packages: Vec<Package>,
        advisories: Vec<Advisory>,
        order: Box<dyn VersionOrder>,
    ) -> Self {
        Self {
            packages,
            advisories: advisories.into_iter().map(Arc::new).collect(),
            order,
        }
    }

    pub fn from_json(json: &str, order: Box<dyn VersionOrder>) -> Result<Self> {
        let raw: RawSnapshot = serde_json::from_str(json).map_err(|e| Error::Data {
            reason: format!("snapshot is not valid JSON: {e}"),
        })?;
        let packages = raw
            .packages
            .into_iter()
            .map(package_from_raw)
            .collect::<Result<Vec<_>>>()?;
        let advisories = raw
            .advisories
            .into_iter()
            .map(advisory_from_raw)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(packages, advisories, order))
    }

    pub fn load(path: &Path, order: Box<dyn VersionOrder>) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| Error::Data {
            reason: format!("cannot read snapshot {}: {e}", path.display()),
        })?;
        Self::from_json(&json, order)
    }
}

fn package_from_raw(raw: RawPackage) -> Result<Package> {
    if raw.name.is_empty() {
        return Err(Error::data("package record with empty name"));
    }
    let filename = raw
        .filename
        .unwrap_or_else(|| format!("{}-{}.{}{ARCHIVE_SUFFIX}", raw.name, raw.evr, raw.arch));
    Ok(Package {
        name: raw.name,
        evr: raw.evr,
        arch: raw.arch,
        filename,
    })
}

fn advisory_from_raw(raw: RawAdvisory) -> Result<Advisory> {
    if raw.id.is_empty() {
        return Err(Error::data("advisory record with empty id"));
    }
    let packages = raw
        .packages
        .into_iter()
        .map(package_from_raw)
        .collect::<Result<Vec<_>>>()?;
    Ok(Advisory {
        id: raw.id,
        kind: AdvisoryKind::from(raw.kind.as_str()),
        updated: raw.updated,
        description: raw.description,
        packages,
    })
}

impl PackageIndex for Catalog {
    fn installed(&self) -> Result<Vec<Package>> {
        Ok(self.packages.clone())
    }

    fn matching(&self, spec: &PackageSpec) -> Result<Vec<Package>> {
        Ok(self
            .packages
            .iter()
            .filter(|p| spec.matches(&p.name))
            .cloned()
            .collect())
    }
}

impl AdvisoryIndex for Catalog {
    fn advisories_for(&self, pkg: &Package, pred: Predicate) -> Result<Vec<Arc<Advisory>>> {
        let mut out = Vec::new();
        for advisory in &self.advisories {
            let mut hit = false;
            for corrective in &advisory.packages {
                if corrective.name != pkg.name || corrective.arch != pkg.arch {
                    continue;
                }
                let ord = self.order.cmp_evr(&corrective.evr, &pkg.evr)?;
                let matched = match pred {
                    Predicate::AtOrBelow => ord != Ordering::Greater,
                    Predicate::Above => ord == Ordering::Greater,
                };
                if matched {
                    hit = true;
                    break;
                }
            }
            if hit {
                out.push(advisory.clone());
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vercmp::RpmOrder;

    const TOUR_SNAPSHOT: &str = r#"{
        "packages": [
            { "name": "tour", "evr": "5-0", "arch": "noarch" }
        ],
        "advisories": [
            {
                "id": "DNF-2014-1",
                "type": "bugfix",
                "updated": 1404840841,
                "description": "testing advisory",
                "packages": [
                    { "name": "tour", "evr": "4-4", "arch": "noarch",
                      "filename": "tour-4-4.noarch.rpm" }
                ]
            },
            {
                "id": "DNF-2014-3",
                "type": "security",
                "updated": 1404841143,
                "description": "testing advisory",
                "packages": [
                    { "name": "tour", "evr": "5-1", "arch": "noarch",
                      "filename": "tour-5-1.noarch.rpm" }
                ]
            }
        ]
    }"#;

    fn catalog() -> Catalog {
        Catalog::from_json(TOUR_SNAPSHOT, Box::new(RpmOrder)).unwrap()
    }

    #[test]
    fn parses_packages_and_advisories() {
        let catalog = catalog();
        let installed = catalog.installed().unwrap();
        assert_eq!(installed.len(), 1);
        assert_eq!(installed[0].to_string(), "tour-5-0.noarch");
        assert_eq!(catalog.advisories.len(), 2);
    }

    #[test]
    fn synthesizes_missing_filenames() {
        let catalog = catalog();
        let installed = catalog.installed().unwrap();
        assert_eq!(installed[0].filename, "tour-5-0.noarch.rpm");
    }

    #[test]
    fn at_or_below_includes_equal_versions() {
        let catalog = catalog();
        let pkg = Package {
            name: "tour".to_string(),
            evr: "5-1".parse().unwrap(),
            arch: "noarch".to_string(),
            filename: "tour-5-1.noarch.rpm".to_string(),
        };
        let found = catalog.advisories_for(&pkg, Predicate::AtOrBelow).unwrap();
        let ids: Vec<&str> = found.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["DNF-2014-1", "DNF-2014-3"]);
    }

    #[test]
    fn above_is_strict() {
        let catalog = catalog();
        let installed = catalog.installed().unwrap();
        let found = catalog.advisories_for(&installed[0], Predicate::Above).unwrap();
        let ids: Vec<&str> = found.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["DNF-2014-3"]);
    }

    #[test]
    fn other_names_and_arches_do_not_match() {
        let catalog = catalog();
        let other = Package {
            name: "tour".to_string(),
            evr: "5-0".parse().unwrap(),
            arch: "x86_64".to_string(),
            filename: "tour-5-0.x86_64.rpm".to_string(),
        };
        assert!(catalog.advisories_for(&other, Predicate::AtOrBelow).unwrap().is_empty());
        let stranger = Package {
            name: "detour".to_string(),
            evr: "5-0".parse().unwrap(),
            arch: "noarch".to_string(),
            filename: "detour-5-0.noarch.rpm".to_string(),
        };
        assert!(catalog.advisories_for(&stranger, Predicate::Above).unwrap().is_empty());
    }

    #[test]
    fn matching_filters_by_name_glob() {
        let catalog = catalog();
        let spec = PackageSpec::new("tou*").unwrap();
        assert_eq!(catalog.matching(&spec).unwrap().len(), 1);
        let none = PackageSpec::new("pepper").unwrap();
        assert!(catalog.matching(&none).unwrap().is_empty());
    }

    #[test]
    fn invalid_json_is_a_data_error() {
        let err = Catalog::from_json("{ nope", Box::new(RpmOrder)).unwrap_err();
        assert!(matches!(err, Error::Data { .. }));
    }

    #[test]
    fn malformed_evr_is_a_data_error() {
        let json = r#"{ "packages": [ { "name": "tour", "evr": "x:1", "arch": "noarch" } ] }"#;
        let err = Catalog::from_json(json, Box::new(RpmOrder)).unwrap_err();
        assert!(matches!(err, Error::Data { .. }));
    }

    #[test]
    fn empty_advisory_id_is_a_data_error() {
        let json = r#"{ "advisories": [ { "id": "", "type": "bugfix", "updated": 0 } ] }"#;
        let err = Catalog::from_json(json, Box::new(RpmOrder)).unwrap_err();
        assert!(matches!(err, Error::Data { .. }));
    }

    #[test]
    fn unknown_advisory_type_is_kept_as_unknown() {
        let json = r#"{ "advisories": [ { "id": "X-1", "type": "newpackage", "updated": 0 } ] }"#;
        let catalog = Catalog::from_json(json, Box::new(RpmOrder)).unwrap();
        assert_eq!(catalog.advisories[0].kind, AdvisoryKind::Unknown);
    }

    #[test]
    fn missing_snapshot_file_is_a_data_error() {
        let err = Catalog::load(Path::new("/nonexistent/updates.json"), Box::new(RpmOrder))
            .unwrap_err();
        assert!(matches!(err, Error::Data { .. }));
    }
}
