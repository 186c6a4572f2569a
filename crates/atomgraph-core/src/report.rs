//! Integrity report assembly and rendering

use crate::graph::AtomGraph;
use crate::integrity::{IntegrityIssue, IssueCategory};
use crate::model::{AtomId, AtomType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Default cap on warnings printed by [`IntegrityReport::render`].
pub const DEFAULT_MAX_DISPLAYED_WARNINGS: usize = 10;

/// Result of one integrity check session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub total_atoms: usize,
    pub total_modules: usize,
    pub atoms_by_type: BTreeMap<AtomType, usize>,
    pub orphaned_atoms: usize,
    pub broken_references: usize,
    pub inconsistent_links: usize,
    pub cycles_found: usize,
    pub self_references: usize,
    pub invalid_module_atoms: usize,
    pub invalid_module_dependencies: usize,
    /// Each cycle starts and ends with the same atom.
    pub cycles: Vec<Vec<AtomId>>,
    pub orphans: Vec<AtomId>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Files skipped while loading the store.
    #[serde(default)]
    pub load_warnings: Vec<String>,
}

impl IntegrityReport {
    pub(crate) fn build(
        graph: &AtomGraph,
        issues: Vec<IntegrityIssue>,
        cycles: Vec<Vec<AtomId>>,
        orphans: Vec<AtomId>,
    ) -> Self {
        let mut atoms_by_type = BTreeMap::new();
        for atom in graph.atoms() {
            *atoms_by_type.entry(atom.kind).or_insert(0) += 1;
        }

        let count = |category: IssueCategory| {
            issues
                .iter()
                .filter(|issue| issue.category() == category)
                .count()
        };

        IntegrityReport {
            total_atoms: graph.atom_count(),
            total_modules: graph.module_count(),
            atoms_by_type,
            orphaned_atoms: orphans.len(),
            broken_references: count(IssueCategory::BrokenReference),
            inconsistent_links: count(IssueCategory::InconsistentLink),
            cycles_found: cycles.len(),
            self_references: count(IssueCategory::SelfReference),
            invalid_module_atoms: count(IssueCategory::InvalidModuleAtom),
            invalid_module_dependencies: count(IssueCategory::InvalidModuleDependency),
            errors: issues.iter().map(ToString::to_string).collect(),
            warnings: orphans
                .iter()
                .map(|id| format!("Orphaned atom: '{id}' has no upstream or downstream links"))
                .collect(),
            cycles,
            orphans,
            load_warnings: Vec::new(),
        }
    }

    /// Attach warnings collected while loading the store.
    pub fn with_load_warnings(mut self, warnings: Vec<String>) -> Self {
        self.load_warnings = warnings;
        self
    }

    /// True when no integrity errors were found. Warnings never fail a check.
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    /// Process exit code: 0 on success or in report-only mode, 1 otherwise.
    pub fn exit_code(&self, report_only: bool) -> u8 {
        if self.passed() || report_only { 0 } else { 1 }
    }

    /// Human-readable report. Errors are printed in full; warnings are
    /// capped at `max_warnings` with the remainder counted.
    pub fn display(&self, max_warnings: usize) -> ReportDisplay<'_> {
        ReportDisplay {
            report: self,
            max_warnings,
        }
    }

    /// The [`display`](Self::display) text as a `String`.
    pub fn render(&self, max_warnings: usize) -> String {
        self.display(max_warnings).to_string()
    }
}

/// Text rendering of an [`IntegrityReport`], see [`IntegrityReport::display`].
pub struct ReportDisplay<'a> {
    report: &'a IntegrityReport,
    max_warnings: usize,
}

impl fmt::Display for ReportDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        writeln!(f, "Integrity report")?;
        writeln!(f, "  Atoms:   {}", report.total_atoms)?;
        for (kind, count) in &report.atoms_by_type {
            writeln!(f, "    {kind}: {count}")?;
        }
        writeln!(f, "  Modules: {}", report.total_modules)?;
        writeln!(f)?;
        writeln!(f, "  Broken references:            {}", report.broken_references)?;
        writeln!(f, "  Inconsistent links:           {}", report.inconsistent_links)?;
        writeln!(f, "  Cycles:                       {}", report.cycles_found)?;
        writeln!(f, "  Self references:              {}", report.self_references)?;
        writeln!(f, "  Invalid module atoms:         {}", report.invalid_module_atoms)?;
        writeln!(
            f,
            "  Invalid module dependencies:  {}",
            report.invalid_module_dependencies
        )?;
        writeln!(f, "  Orphaned atoms:               {}", report.orphaned_atoms)?;

        if !report.errors.is_empty() {
            writeln!(f)?;
            writeln!(f, "Errors ({}):", report.errors.len())?;
            for error in &report.errors {
                writeln!(f, "  - {error}")?;
            }
        }

        let warnings: Vec<&String> = report
            .load_warnings
            .iter()
            .chain(&report.warnings)
            .collect();
        if !warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "Warnings ({}):", warnings.len())?;
            for warning in warnings.iter().take(self.max_warnings) {
                writeln!(f, "  - {warning}")?;
            }
            if warnings.len() > self.max_warnings {
                writeln!(f, "  ... and {} more", warnings.len() - self.max_warnings)?;
            }
        }

        Ok(())
    }
}
