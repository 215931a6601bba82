use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::error::Error;

/// Archive suffix stripped from filenames in list output.
pub(crate) const ARCHIVE_SUFFIX: &str = ".rpm";

/// An (epoch, version, release) triple.
///
/// Parsed from `[epoch:]version[-release]`; a missing epoch means zero and
/// the release may be absent. Ordering between two values is the version
/// comparator's job, never derived from these fields directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Evr {
    pub epoch: u64,
    pub version: String,
    pub release: String,
}

impl FromStr for Evr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (epoch, rest) = match s.split_once(':') {
            Some((e, rest)) => {
                let epoch = e
                    .parse::<u64>()
                    .map_err(|_| Error::data(format!("bad epoch in version {s:?}")))?;
                (epoch, rest)
            }
            None => (0, s),
        };
        let (version, release) = match rest.rsplit_once('-') {
            Some((v, r)) => (v, r),
            None => (rest, ""),
        };
        if version.is_empty() {
            return Err(Error::data(format!("empty version in {s:?}")));
        }
        Ok(Self {
            epoch,
            version: version.to_string(),
            release: release.to_string(),
        })
    }
}

impl fmt::Display for Evr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}:", self.epoch)?;
        }
        f.write_str(&self.version)?;
        if !self.release.is_empty() {
            write!(f, "-{}", self.release)?;
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for Evr {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An installed or corrective package record.
///
/// Identity is (name, evr, arch); the filename is carried along for report
/// output but takes no part in equality.
#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub evr: Evr,
    pub arch: String,
    pub filename: String,
}

impl Package {
    /// Filename without the package archive suffix.
    pub fn file_basename(&self) -> &str {
        self.filename
            .strip_suffix(ARCHIVE_SUFFIX)
            .unwrap_or(&self.filename)
    }

    /// `name-evr`, the short form used as an info block heading.
    pub fn nevra_short(&self) -> String {
        format!("{}-{}", self.name, self.evr)
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}.{}", self.name, self.evr, self.arch)
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.evr == other.evr && self.arch == other.arch
    }
}

impl Eq for Package {}

impl Hash for Package {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.evr.hash(state);
        self.arch.hash(state);
    }
}
