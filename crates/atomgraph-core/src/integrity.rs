//! Graph integrity analyses
//!
//! Each analysis is a pure function of the graph and can run in any order.
//! [`IntegrityChecker::check`] runs all of them and assembles an
//! [`IntegrityReport`].

use crate::graph::AtomGraph;
use crate::model::{AtomId, LinkDirection, ModuleId};
use crate::report::IntegrityReport;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Which report bucket an issue is counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    BrokenReference,
    InconsistentLink,
    Cycle,
    SelfReference,
    InvalidModuleAtom,
    InvalidModuleDependency,
}

/// A single integrity error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityIssue {
    /// A link names an atom that does not exist.
    BrokenReference {
        atom: AtomId,
        target: AtomId,
        direction: LinkDirection,
    },
    /// `atom` lists `target` in `direction`, but `target` does not list
    /// `atom` in the reciprocal direction.
    InconsistentLink {
        atom: AtomId,
        target: AtomId,
        direction: LinkDirection,
    },
    /// Closed downstream path; first and last element are the same atom.
    Cycle { path: Vec<AtomId> },
    /// An atom lists itself.
    SelfReference {
        atom: AtomId,
        direction: LinkDirection,
    },
    /// A module lists an atom that does not exist.
    MissingModuleAtom { module: ModuleId, atom: AtomId },
    /// A module depends on a module that does not exist.
    MissingModuleDependency {
        module: ModuleId,
        dependency: ModuleId,
    },
    /// A module depends on itself.
    ModuleSelfDependency { module: ModuleId },
}

impl IntegrityIssue {
    pub fn category(&self) -> IssueCategory {
        match self {
            IntegrityIssue::BrokenReference { .. } => IssueCategory::BrokenReference,
            IntegrityIssue::InconsistentLink { .. } => IssueCategory::InconsistentLink,
            IntegrityIssue::Cycle { .. } => IssueCategory::Cycle,
            IntegrityIssue::SelfReference { .. } | IntegrityIssue::ModuleSelfDependency { .. } => {
                IssueCategory::SelfReference
            }
            IntegrityIssue::MissingModuleAtom { .. } => IssueCategory::InvalidModuleAtom,
            IntegrityIssue::MissingModuleDependency { .. } => {
                IssueCategory::InvalidModuleDependency
            }
        }
    }
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::BrokenReference {
                atom,
                target,
                direction,
            } => write!(
                f,
                "Broken reference: atom '{atom}' lists missing {direction} atom '{target}'"
            ),
            IntegrityIssue::InconsistentLink {
                atom,
                target,
                direction,
            } => write!(
                f,
                "Inconsistent link: '{atom}' lists '{target}' as {direction}, but '{target}' does not list '{atom}' as {}",
                direction.reciprocal()
            ),
            IntegrityIssue::Cycle { path } => {
                write!(f, "Circular dependency: {}", path.join(" -> "))
            }
            IntegrityIssue::SelfReference { atom, direction } => {
                write!(f, "Self reference: atom '{atom}' lists itself as {direction}")
            }
            IntegrityIssue::MissingModuleAtom { module, atom } => {
                write!(f, "Module '{module}' references missing atom '{atom}'")
            }
            IntegrityIssue::MissingModuleDependency { module, dependency } => {
                write!(f, "Module '{module}' depends on missing module '{dependency}'")
            }
            IntegrityIssue::ModuleSelfDependency { module } => {
                write!(f, "Module '{module}' depends on itself")
            }
        }
    }
}

/// Runs integrity analyses over one graph snapshot.
///
/// The checker only borrows the graph; findings are returned, never stored,
/// so one graph can be checked from several threads at once.
pub struct IntegrityChecker<'g> {
    graph: &'g AtomGraph,
}

impl<'g> IntegrityChecker<'g> {
    pub fn new(graph: &'g AtomGraph) -> Self {
        IntegrityChecker { graph }
    }

    /// Run every analysis and assemble the report.
    pub fn check(&self) -> IntegrityReport {
        tracing::info!(
            "Checking integrity of {} atoms and {} modules",
            self.graph.atom_count(),
            self.graph.module_count()
        );

        let orphans = self.find_orphans();
        let mut issues = Vec::new();
        issues.extend(self.find_broken_references());
        issues.extend(self.find_inconsistent_links());
        issues.extend(self.find_self_references());
        let cycles = self.find_cycles();
        issues.extend(
            cycles
                .iter()
                .map(|path| IntegrityIssue::Cycle { path: path.clone() }),
        );
        issues.extend(self.find_invalid_module_atoms());
        issues.extend(self.find_invalid_module_dependencies());

        let report = IntegrityReport::build(self.graph, issues, cycles, orphans);
        tracing::info!(
            "Integrity check finished: {} errors, {} warnings",
            report.errors.len(),
            report.warnings.len()
        );
        report
    }

    /// Atoms with neither upstream nor downstream links.
    pub fn find_orphans(&self) -> Vec<AtomId> {
        self.graph
            .atoms()
            .filter(|atom| atom.is_orphan())
            .map(|atom| atom.id.clone())
            .collect()
    }

    /// One issue per link whose target is not a known atom.
    pub fn find_broken_references(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();
        for atom in self.graph.atoms() {
            for (direction, target) in atom.references() {
                if !self.graph.contains_atom(target) {
                    issues.push(IntegrityIssue::BrokenReference {
                        atom: atom.id.clone(),
                        target: target.clone(),
                        direction,
                    });
                }
            }
        }
        issues
    }

    /// One issue per declared link the target atom fails to reciprocate.
    ///
    /// Both directions are checked independently, so a link missing on both
    /// sides is reported once from each atom.
    pub fn find_inconsistent_links(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();
        for atom in self.graph.atoms() {
            for (direction, target_id) in atom.references() {
                let Some(target) = self.graph.atom(target_id) else {
                    continue;
                };
                if !target.links(direction.reciprocal()).contains(&atom.id) {
                    issues.push(IntegrityIssue::InconsistentLink {
                        atom: atom.id.clone(),
                        target: target_id.clone(),
                        direction,
                    });
                }
            }
        }
        issues
    }

    /// Atoms listing themselves, and modules depending on themselves.
    pub fn find_self_references(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();
        for atom in self.graph.atoms() {
            for direction in [LinkDirection::Upstream, LinkDirection::Downstream] {
                if atom.links(direction).contains(&atom.id) {
                    issues.push(IntegrityIssue::SelfReference {
                        atom: atom.id.clone(),
                        direction,
                    });
                }
            }
        }
        for module in self.graph.modules() {
            if module.dependencies().contains(&module.module_id) {
                issues.push(IntegrityIssue::ModuleSelfDependency {
                    module: module.module_id.clone(),
                });
            }
        }
        issues
    }

    /// Cycles along downstream links.
    ///
    /// Depth-first search with an explicit frame stack. `visited` is shared
    /// across roots, so every atom is expanded at most once, and a root's
    /// search stops at the first cycle it closes. A component holding
    /// several cycles may therefore report only some of them in one pass.
    pub fn find_cycles(&self) -> Vec<Vec<AtomId>> {
        struct Frame<'a> {
            successors: Vec<&'a AtomId>,
            next: usize,
        }

        let mut cycles = Vec::new();
        let mut visited: HashSet<&AtomId> = HashSet::new();

        for root in self.graph.atoms() {
            if visited.contains(&root.id) {
                continue;
            }

            let mut path: Vec<&AtomId> = vec![&root.id];
            let mut on_path: HashSet<&AtomId> = HashSet::from([&root.id]);
            let mut frames = vec![Frame {
                successors: self.graph.successors(&root.id),
                next: 0,
            }];
            visited.insert(&root.id);

            while let Some(frame) = frames.last_mut() {
                if frame.next == frame.successors.len() {
                    frames.pop();
                    if let Some(done) = path.pop() {
                        on_path.remove(done);
                    }
                    continue;
                }

                let next = frame.successors[frame.next];
                frame.next += 1;

                if on_path.contains(next) {
                    let start = path.iter().position(|id| *id == next).unwrap_or(0);
                    let mut cycle: Vec<AtomId> =
                        path[start..].iter().map(|id| (*id).clone()).collect();
                    cycle.push(next.clone());
                    tracing::debug!("Found cycle: {}", cycle.join(" -> "));
                    cycles.push(cycle);
                    break;
                }

                if visited.insert(next) {
                    path.push(next);
                    on_path.insert(next);
                    frames.push(Frame {
                        successors: self.graph.successors(next),
                        next: 0,
                    });
                }
            }
        }

        cycles
    }

    /// Module atom lists naming atoms that do not exist.
    pub fn find_invalid_module_atoms(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();
        for module in self.graph.modules() {
            for atom in &module.atom_ids {
                if !self.graph.contains_atom(atom) {
                    issues.push(IntegrityIssue::MissingModuleAtom {
                        module: module.module_id.clone(),
                        atom: atom.clone(),
                    });
                }
            }
        }
        issues
    }

    /// Module dependencies naming modules that do not exist.
    pub fn find_invalid_module_dependencies(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();
        for module in self.graph.modules() {
            for dependency in module.dependencies() {
                if !self.graph.contains_module(dependency) {
                    issues.push(IntegrityIssue::MissingModuleDependency {
                        module: module.module_id.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }
        issues
    }
}
