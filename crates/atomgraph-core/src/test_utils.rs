//! Test utilities for building small atom graphs

use crate::graph::AtomGraph;
use crate::model::{Atom, AtomType, Module};

/// Build an atom with the given links.
pub fn atom(id: &str, upstream: &[&str], downstream: &[&str]) -> Atom {
    Atom::new(id, AtomType::Requirement)
        .with_upstream(upstream.iter().copied())
        .with_downstream(downstream.iter().copied())
}

/// Build a graph from atoms and modules.
pub fn graph_of(atoms: Vec<Atom>, modules: Vec<Module>) -> AtomGraph {
    AtomGraph::from_parts(
        atoms.into_iter().map(|a| (a.id.clone(), a)).collect(),
        modules
            .into_iter()
            .map(|m| (m.module_id.clone(), m))
            .collect(),
    )
}

/// A consistent downstream chain `ids[0] -> ids[1] -> ...`.
pub fn chain(ids: &[&str]) -> Vec<Atom> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| {
            let upstream: Vec<&str> = if i > 0 { vec![ids[i - 1]] } else { vec![] };
            let downstream: Vec<&str> = ids.get(i + 1).copied().into_iter().collect();
            atom(id, &upstream, &downstream)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_is_consistent() {
        let atoms = chain(&["a", "b", "c"]);
        assert_eq!(atoms.len(), 3);
        assert!(atoms[0].upstream_ids.is_empty());
        assert!(atoms[1].upstream_ids.contains("a"));
        assert!(atoms[1].downstream_ids.contains("c"));
        assert!(atoms[2].downstream_ids.is_empty());
    }
}
