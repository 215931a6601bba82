use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};

use chrono::{Local, LocalResult, TimeZone};
use indexmap::IndexMap;

use crate::advisory::AdvisoryKind;
use crate::correlate::Correlation;

/// Which correlator query produced the data; printed in the summary heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Available,
    Installed,
    All,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Available => f.write_str("available"),
            Scope::Installed => f.write_str("installed"),
            Scope::All => f.write_str("all"),
        }
    }
}

const INFO_RULE_WIDTH: usize = 80;
const INFO_LABELS: [&str; 6] = [
    "Update ID",
    "Type",
    "Updated",
    "Description",
    "Files",
    "Installed",
];

/// Renders correlations into the three report formats.
///
/// Pure over its input: every byte goes to the sink handed in by the caller,
/// nothing is filtered or re-correlated here, and well-formed input cannot
/// fail. Output is scraped by automation, so the exact bytes matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    /// Enables file enumeration in info blocks.
    pub verbose: bool,
}

impl Reporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Heading plus per-kind counts of distinct advisories, in fixed kind
    /// order. Counts are per advisory id, not per triple.
    pub fn summary(
        &self,
        out: &mut dyn Write,
        correlation: &Correlation,
        scope: Scope,
    ) -> io::Result<()> {
        let mut kinds: HashMap<&str, AdvisoryKind> = HashMap::new();
        for triple in &correlation.triples {
            kinds.insert(triple.advisory.id.as_str(), triple.advisory.kind);
        }
        if kinds.is_empty() {
            return writeln!(out, "No advisories found.");
        }
        writeln!(out, "Updates Information Summary: {scope}")?;
        for kind in AdvisoryKind::SUMMARY_ORDER {
            let count = kinds.values().filter(|k| **k == kind).count();
            if count > 0 {
                writeln!(out, "    {count} {}", kind.summary_label())?;
            }
        }
        Ok(())
    }

    /// One line per triple, sorted by (advisory id, stripped filename). The
    /// install-marker column appears only for mixed correlations.
    pub fn list(
        &self,
        out: &mut dyn Write,
        correlation: &Correlation,
        prefix: &str,
    ) -> io::Result<()> {
        let mut rows: Vec<(&str, &'static str, &str, bool)> = correlation
            .triples
            .iter()
            .map(|t| {
                (
                    t.advisory.id.as_str(),
                    t.advisory.kind.label(),
                    t.package.file_basename(),
                    t.installed,
                )
            })
            .collect();
        rows.sort_by(|a, b| (a.0, a.2).cmp(&(b.0, b.2)));

        let id_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(0);
        let kind_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(0);
        let mixed = correlation.is_mixed();
        for (id, kind, file, installed) in rows {
            if mixed {
                let marker = if installed { 'i' } else { ' ' };
                writeln!(out, "{prefix}{marker} {id:<id_width$} {kind:<kind_width$} {file}")?;
            } else {
                writeln!(out, "{prefix}{id:<id_width$} {kind:<kind_width$} {file}")?;
            }
        }
        Ok(())
    }

    /// Detail blocks grouped by (advisory id, corrective name-evr), ordered
    /// by first appearance in the input stream.
    pub fn info(
        &self,
        out: &mut dyn Write,
        correlation: &Correlation,
        prefix: &str,
    ) -> io::Result<()> {
        struct Block<'a> {
            advisory: &'a crate::advisory::Advisory,
            installed: bool,
            files: Vec<&'a str>,
        }

        let mut blocks: IndexMap<(&str, String), Block<'_>> = IndexMap::new();
        for triple in &correlation.triples {
            let key = (triple.advisory.id.as_str(), triple.package.nevra_short());
            let block = blocks.entry(key).or_insert_with(|| Block {
                advisory: &triple.advisory,
                installed: triple.installed,
                files: Vec::new(),
            });
            let file = triple.package.filename.as_str();
            if !block.files.contains(&file) {
                block.files.push(file);
            }
        }

        let mixed = correlation.is_mixed();
        let width = INFO_LABELS.iter().map(|l| l.len()).max().unwrap_or(0);
        let rule = "=".repeat(INFO_RULE_WIDTH);
        for (key, block) in &blocks {
            writeln!(out, "{prefix}{rule}")?;
            writeln!(out, "{prefix}  {}", key.1)?;
            writeln!(out, "{prefix}{rule}")?;
            let advisory = block.advisory;
            field(out, prefix, width, "Update ID", [advisory.id.as_str()])?;
            field(out, prefix, width, "Type", [advisory.kind.label()])?;
            let updated = format_updated(advisory.updated);
            field(out, prefix, width, "Updated", [updated.as_str()])?;
            field(out, prefix, width, "Description", advisory.description.lines())?;
            if self.verbose {
                field(out, prefix, width, "Files", block.files.iter().copied())?;
            }
            if mixed {
                let value = if block.installed { "true" } else { "false" };
                field(out, prefix, width, "Installed", [value])?;
            }
            writeln!(out, "{prefix}")?;
        }
        Ok(())
    }
}

/// Right-aligned labeled field; continuation lines carry a blank label.
fn field<'v>(
    out: &mut dyn Write,
    prefix: &str,
    width: usize,
    label: &str,
    values: impl IntoIterator<Item = &'v str>,
) -> io::Result<()> {
    for (i, value) in values.into_iter().enumerate() {
        let label = if i == 0 { label } else { "" };
        writeln!(out, "{prefix}{label:>width$} : {value}")?;
    }
    Ok(())
}

/// Local-time rendering of an advisory timestamp.
fn format_updated(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
            dt.format("%Y-%m-%d %H:%M:%S").to_string()
        }
        LocalResult::None => ts.to_string(),
    }
}
