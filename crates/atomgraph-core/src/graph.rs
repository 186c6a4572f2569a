//! Atom graph wrapper using petgraph::StableDiGraph keyed by atom id

use crate::model::*;
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// The loaded documentation graph.
///
/// Atom and module records are kept in id order. Downstream links whose
/// target exists are mirrored as petgraph edges; links to missing atoms
/// stay only in the records, where the integrity checker finds them.
pub struct AtomGraph {
    atoms: BTreeMap<AtomId, Atom>,
    modules: BTreeMap<ModuleId, Module>,
    inner: StableDiGraph<AtomId, ()>,
    index: HashMap<AtomId, NodeIndex>,
}

impl std::fmt::Debug for AtomGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomGraph")
            .field("atom_count", &self.atoms.len())
            .field("module_count", &self.modules.len())
            .field("link_count", &self.inner.edge_count())
            .finish()
    }
}

impl AtomGraph {
    pub fn new() -> Self {
        AtomGraph {
            atoms: BTreeMap::new(),
            modules: BTreeMap::new(),
            inner: StableDiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Build a graph from loaded maps in one pass.
    pub fn from_parts(
        atoms: BTreeMap<AtomId, Atom>,
        modules: BTreeMap<ModuleId, Module>,
    ) -> Self {
        let mut graph = AtomGraph {
            atoms,
            modules,
            inner: StableDiGraph::new(),
            index: HashMap::new(),
        };

        for id in graph.atoms.keys() {
            let idx = graph.inner.add_node(id.clone());
            graph.index.insert(id.clone(), idx);
        }
        for atom in graph.atoms.values() {
            let source = graph.index[&atom.id];
            for target in &atom.downstream_ids {
                if let Some(&target) = graph.index.get(target) {
                    graph.inner.add_edge(source, target, ());
                }
            }
        }

        tracing::debug!(
            "Built atom graph: {} atoms, {} modules, {} links",
            graph.atoms.len(),
            graph.modules.len(),
            graph.inner.edge_count()
        );
        graph
    }

    /// Insert or replace an atom. Returns the previous record with that id.
    pub fn insert_atom(&mut self, atom: Atom) -> Option<Atom> {
        let previous = self.remove_atom(&atom.id);

        let idx = self.inner.add_node(atom.id.clone());
        self.index.insert(atom.id.clone(), idx);

        for target in &atom.downstream_ids {
            if let Some(&target) = self.index.get(target) {
                self.inner.add_edge(idx, target, ());
            }
        }
        for other in self.atoms.values() {
            if other.downstream_ids.contains(&atom.id) {
                let source = self.index[&other.id];
                self.inner.add_edge(source, idx, ());
            }
        }

        self.atoms.insert(atom.id.clone(), atom);
        previous
    }

    /// Remove an atom and all its links.
    pub fn remove_atom(&mut self, id: &str) -> Option<Atom> {
        if let Some(idx) = self.index.remove(id) {
            self.inner.remove_node(idx);
        }
        self.atoms.remove(id)
    }

    /// Insert or replace a module. Returns the previous record with that id.
    pub fn insert_module(&mut self, module: Module) -> Option<Module> {
        self.modules.insert(module.module_id.clone(), module)
    }

    /// Get an atom by id.
    pub fn atom(&self, id: &str) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn contains_atom(&self, id: &str) -> bool {
        self.atoms.contains_key(id)
    }

    /// Get a module by id.
    pub fn module(&self, id: &str) -> Option<&Module> {
        self.modules.get(id)
    }

    pub fn contains_module(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    /// Total number of atoms.
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Total number of modules.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Number of downstream links between atoms that both exist.
    pub fn link_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Iterate over all atoms in id order.
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.values()
    }

    /// Iterate over all modules in id order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    /// Get all atoms of a specific type.
    pub fn atoms_of_type(&self, kind: AtomType) -> impl Iterator<Item = &Atom> + '_ {
        self.atoms.values().filter(move |a| a.kind == kind)
    }

    /// Check if a resolved downstream link exists from one atom to another.
    pub fn has_link(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => self.inner.contains_edge(a, b),
            _ => false,
        }
    }

    /// Existing downstream neighbours of an atom, in id order.
    pub fn successors(&self, id: &str) -> Vec<&AtomId> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Existing atoms that list this atom downstream, in id order.
    pub fn predecessors(&self, id: &str) -> Vec<&AtomId> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<&AtomId> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut ids: Vec<&AtomId> = self
            .inner
            .neighbors_directed(idx, direction)
            .filter_map(|n| self.inner.node_weight(n))
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Every atom transitively downstream of `id` (excluding `id` unless it
    /// sits on a cycle).
    pub fn downstream_closure(&self, id: &str) -> BTreeSet<AtomId> {
        self.closure(id, Direction::Outgoing)
    }

    /// Every atom transitively upstream of `id`, following resolved links
    /// backwards.
    pub fn upstream_closure(&self, id: &str) -> BTreeSet<AtomId> {
        self.closure(id, Direction::Incoming)
    }

    fn closure(&self, id: &str, direction: Direction) -> BTreeSet<AtomId> {
        let mut reached = BTreeSet::new();
        let Some(&start) = self.index.get(id) else {
            return reached;
        };
        let mut to_visit = vec![start];

        while let Some(current) = to_visit.pop() {
            for next in self.inner.neighbors_directed(current, direction) {
                if let Some(next_id) = self.inner.node_weight(next) {
                    if reached.insert(next_id.clone()) {
                        to_visit.push(next);
                    }
                }
            }
        }

        reached
    }
}

impl Default for AtomGraph {
    fn default() -> Self {
        Self::new()
    }
}
