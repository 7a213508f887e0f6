use std::collections::{HashSet, VecDeque};

use crate::model::molecule::Molecule;

/// Flags every bond that lies on at least one cycle.
///
/// A bond is a ring bond exactly when it is not a bridge of the graph;
/// bridges are found with an iterative lowlink search.
pub(crate) fn ring_bonds(mol: &Molecule) -> Vec<bool> {
    let n = mol.atom_count();
    let mut in_ring = vec![true; mol.bond_count()];
    let mut order = vec![usize::MAX; n];
    let mut low = vec![0usize; n];
    let mut counter = 0usize;

    for root in 0..n {
        if order[root] != usize::MAX {
            continue;
        }
        order[root] = counter;
        low[root] = counter;
        counter += 1;

        // (atom, bond used to enter it, next neighbor slot to inspect)
        let mut stack: Vec<(usize, Option<usize>, usize)> = vec![(root, None, 0)];
        while let Some(frame) = stack.last_mut() {
            let (atom, via, slot) = *frame;
            if let Some(nb) = mol.neighbors(atom).get(slot) {
                frame.2 += 1;
                if Some(nb.bond) == via {
                    continue;
                }
                if order[nb.atom] == usize::MAX {
                    order[nb.atom] = counter;
                    low[nb.atom] = counter;
                    counter += 1;
                    stack.push((nb.atom, Some(nb.bond), 0));
                } else {
                    low[atom] = low[atom].min(order[nb.atom]);
                }
            } else {
                stack.pop();
                if let (Some(bond), Some(&(parent, _, _))) = (via, stack.last()) {
                    low[parent] = low[parent].min(low[atom]);
                    if low[atom] > order[parent] {
                        in_ring[bond] = false;
                    }
                }
            }
        }
    }

    in_ring
}

/// Atoms touching at least one ring bond.
pub(crate) fn ring_atoms(mol: &Molecule, ring_bonds: &[bool]) -> Vec<bool> {
    let mut in_ring = vec![false; mol.atom_count()];
    for (bond, _) in mol.bonds.iter().zip(ring_bonds).filter(|(_, r)| **r) {
        in_ring[bond.i] = true;
        in_ring[bond.j] = true;
    }
    in_ring
}

/// Smallest cycle containing `bond`, as an atom path starting at one end of
/// the bond and finishing at the other.
pub(crate) fn smallest_ring_through(
    mol: &Molecule,
    bond: usize,
    ring_bonds: &[bool],
) -> Option<Vec<usize>> {
    if !ring_bonds[bond] {
        return None;
    }
    let start = mol.bonds[bond].i;
    let goal = mol.bonds[bond].j;

    let mut parent = vec![usize::MAX; mol.atom_count()];
    parent[start] = start;
    let mut queue = VecDeque::from([start]);

    while let Some(atom) = queue.pop_front() {
        if atom == goal {
            break;
        }
        for nb in mol.neighbors(atom) {
            if nb.bond == bond || !ring_bonds[nb.bond] || parent[nb.atom] != usize::MAX {
                continue;
            }
            parent[nb.atom] = atom;
            queue.push_back(nb.atom);
        }
    }

    if parent[goal] == usize::MAX {
        return None;
    }
    let mut path = vec![goal];
    let mut cursor = goal;
    while cursor != start {
        cursor = parent[cursor];
        path.push(cursor);
    }
    path.reverse();
    Some(path)
}

/// Distinct smallest rings over all ring bonds, each as a cyclic atom path.
pub(crate) fn candidate_rings(mol: &Molecule, ring_bonds: &[bool]) -> Vec<Vec<usize>> {
    let mut rings: Vec<Vec<usize>> = Vec::new();
    let mut seen: HashSet<Vec<usize>> = HashSet::new();

    for bond in 0..mol.bond_count() {
        let Some(ring) = smallest_ring_through(mol, bond, ring_bonds) else {
            continue;
        };
        let mut key = ring.clone();
        key.sort_unstable();
        if seen.insert(key) {
            rings.push(ring);
        }
    }

    rings
}
