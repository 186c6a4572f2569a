//! Atom graph data model and integrity checker

pub mod graph;
pub mod integrity;
pub mod model;
pub mod report;


#[cfg(test)]
pub mod test_utils;

pub use graph::AtomGraph;
pub use integrity::{IntegrityChecker, IntegrityIssue, IssueCategory};
pub use model::{Atom, AtomId, AtomType, LinkDirection, Module, ModuleId, ModuleMetadata};
pub use report::{DEFAULT_MAX_DISPLAYED_WARNINGS, IntegrityReport, ReportDisplay};
