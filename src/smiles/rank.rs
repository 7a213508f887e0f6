use std::collections::VecDeque;

use crate::model::molecule::Molecule;
use crate::model::types::BondOrder;

/// Canonical atom order for a molecule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Ranking {
    /// Unique rank per atom, `0..atom_count`.
    pub ranks: Vec<usize>,
    /// Graph-symmetry classes before any tie was broken.
    pub symmetry: Vec<usize>,
}

/// Per-bond contribution to a neighbor count, one 12-bit lane per order.
fn bond_weight(order: BondOrder) -> u64 {
    1 << (12 * u32::from(order.code() - 1))
}

/// Ordered partition of the atoms into cells of tied rank.
///
/// Each cell is a contiguous run of `order`, and an atom's rank is the
/// position where its cell starts.
struct Partition {
    order: Vec<usize>,
    position: Vec<usize>,
    cell: Vec<usize>,
    cell_end: Vec<usize>,
    cells: usize,
    key: Vec<u64>,
    queued: Vec<bool>,
}

impl Partition {
    fn from_keys<K: Ord>(keys: &[K]) -> Self {
        let n = keys.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));

        let mut position = vec![0; n];
        let mut cell = vec![0; n];
        let mut cell_end = vec![0; n];
        let mut cells = 0;
        let mut start = 0;
        while start < n {
            let mut end = start + 1;
            while end < n && keys[order[end]] == keys[order[start]] {
                end += 1;
            }
            for p in start..end {
                position[order[p]] = p;
                cell[order[p]] = start;
            }
            cell_end[start] = end;
            cells += 1;
            start = end;
        }

        Self {
            order,
            position,
            cell,
            cell_end,
            cells,
            key: vec![0; n],
            queued: vec![false; n],
        }
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn cell_starts(&self) -> Vec<usize> {
        let mut starts = Vec::with_capacity(self.cells);
        let mut start = 0;
        while start < self.len() {
            starts.push(start);
            start = self.cell_end[start];
        }
        starts
    }

    /// Splits cells by weighted neighbor counts into each splitter cell
    /// until the partition is equitable.
    fn refine(&mut self, mol: &Molecule, splitters: &[usize]) {
        let mut queue: VecDeque<usize> = splitters.iter().copied().collect();
        for &start in splitters {
            self.queued[start] = true;
        }
        let mut touched: Vec<usize> = Vec::new();

        while let Some(splitter) = queue.pop_front() {
            self.queued[splitter] = false;
            if self.cells == self.len() {
                continue;
            }

            let members = self.order[splitter..self.cell_end[splitter]].to_vec();
            for atom in members {
                for nb in mol.neighbors(atom) {
                    if self.key[nb.atom] == 0 {
                        touched.push(nb.atom);
                    }
                    self.key[nb.atom] += bond_weight(mol.bonds[nb.bond].order);
                }
            }
            touched.sort_unstable_by_key(|&a| (self.cell[a], self.key[a]));

            let mut i = 0;
            while i < touched.len() {
                let start = self.cell[touched[i]];
                let mut j = i + 1;
                while j < touched.len() && self.cell[touched[j]] == start {
                    j += 1;
                }
                self.split(start, &touched[i..j], &mut queue);
                i = j;
            }

            for &atom in &touched {
                self.key[atom] = 0;
            }
            touched.clear();
        }
    }

    /// Splits the cell at `start` by the counts of `group`, which holds its
    /// touched atoms sorted by count. Untouched atoms stay in front.
    fn split(&mut self, start: usize, group: &[usize], queue: &mut VecDeque<usize>) {
        let end = self.cell_end[start];
        let (Some(&first), Some(&last)) = (group.first(), group.last()) else {
            return;
        };
        if group.len() == end - start && self.key[first] == self.key[last] {
            return;
        }

        let mut back = end;
        for &atom in group.iter().rev() {
            back -= 1;
            let from = self.position[atom];
            let displaced = self.order[back];
            self.order.swap(from, back);
            self.position[displaced] = from;
            self.position[atom] = back;
        }

        let mut starts = Vec::new();
        if back > start {
            starts.push(start);
        }
        let mut p = back;
        while p < end {
            starts.push(p);
            let count = self.key[self.order[p]];
            while p < end && self.key[self.order[p]] == count {
                p += 1;
            }
        }

        let bounds: Vec<(usize, usize)> = starts
            .iter()
            .enumerate()
            .map(|(k, &s)| (s, starts.get(k + 1).copied().unwrap_or(end)))
            .collect();
        for &(s, e) in &bounds {
            self.cell_end[s] = e;
            if s != start {
                for q in s..e {
                    self.cell[self.order[q]] = s;
                }
            }
        }
        self.cells += bounds.len() - 1;

        // Splitting by the largest piece adds nothing once the others and
        // the original cell have been used.
        let skip = if self.queued[start] {
            start
        } else {
            let mut largest = 0;
            for k in 1..bounds.len() {
                if bounds[k].1 - bounds[k].0 > bounds[largest].1 - bounds[largest].0 {
                    largest = k;
                }
            }
            bounds[largest].0
        };
        for &(s, _) in &bounds {
            if s != skip && !self.queued[s] {
                self.queued[s] = true;
                queue.push_back(s);
            }
        }
    }

    /// Moves `atom` to the end of its cell as a singleton and returns the
    /// singleton's start.
    fn individualize(&mut self, atom: usize) -> usize {
        let start = self.cell[atom];
        let end = self.cell_end[start];
        let last = end - 1;

        let from = self.position[atom];
        let displaced = self.order[last];
        self.order.swap(from, last);
        self.position[displaced] = from;
        self.position[atom] = last;

        self.cell_end[start] = last;
        self.cell[atom] = last;
        self.cell_end[last] = end;
        self.cells += 1;
        last
    }
}

/// Ranks atoms by local invariants, refines by neighborhood, then breaks
/// remaining ties one atom at a time.
pub(super) fn canonical_ranks(mol: &Molecule, in_ring: &[bool]) -> Ranking {
    let n = mol.atom_count();
    let invariants: Vec<_> = mol
        .atoms
        .iter()
        .enumerate()
        .map(|(idx, atom)| {
            (
                mol.degree(idx),
                atom.element.atomic_number(),
                atom.isotope.unwrap_or(0),
                atom.charge,
                atom.hydrogens,
                atom.aromatic,
                in_ring[idx],
                atom.atom_class.unwrap_or(0),
            )
        })
        .collect();

    let mut partition = Partition::from_keys(&invariants);
    let starts = partition.cell_starts();
    partition.refine(mol, &starts);
    let symmetry = partition.cell.clone();

    let mut cursor = 0;
    while partition.cells < n {
        while partition.cell_end[cursor] - cursor == 1 {
            cursor = partition.cell_end[cursor];
        }
        let tied = &partition.order[cursor..partition.cell_end[cursor]];
        let Some(&chosen) = tied.iter().min() else {
            break;
        };
        let singleton = partition.individualize(chosen);
        partition.refine(mol, &[singleton]);
    }

    Ranking {
        ranks: partition.cell,
        symmetry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::molecule::{Atom, Bond, Neighbor};
    use crate::model::types::Element;

    fn chain(elements: &[Element]) -> Molecule {
        let atoms = elements.iter().map(|&e| Atom::new(e)).collect();
        let mut bonds = Vec::new();
        let mut adjacency = vec![Vec::new(); elements.len()];
        for i in 1..elements.len() {
            bonds.push(Bond::new(i - 1, i, BondOrder::Single));
            adjacency[i - 1].push(Neighbor { atom: i, bond: i - 1 });
            adjacency[i].push(Neighbor { atom: i - 1, bond: i - 1 });
        }
        Molecule::from_parts(atoms, bonds, adjacency)
    }

    #[test]
    fn initial_cells_follow_sorted_keys() {
        let partition = Partition::from_keys(&[5, 1, 5, 3]);
        assert_eq!(partition.cell, vec![2, 0, 2, 1]);
        assert_eq!(partition.cell_starts(), vec![0, 1, 2]);
        assert_eq!(partition.cells, 3);
    }

    #[test]
    fn ranks_are_a_permutation() {
        let mol = chain(&[Element::C, Element::C, Element::C, Element::C]);
        let ranking = canonical_ranks(&mol, &[false; 4]);
        let mut sorted = ranking.ranks.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3]);
    }

    #[test]
    fn symmetric_atoms_share_a_class() {
        let mol = chain(&[Element::C, Element::O, Element::C]);
        let ranking = canonical_ranks(&mol, &[false; 3]);
        assert_eq!(ranking.symmetry[0], ranking.symmetry[2]);
        assert_ne!(ranking.symmetry[0], ranking.symmetry[1]);
        assert_ne!(ranking.ranks[0], ranking.ranks[2]);
    }

    #[test]
    fn ranking_ignores_input_order() {
        let forward = chain(&[Element::C, Element::C, Element::O]);
        let backward = chain(&[Element::O, Element::C, Element::C]);
        let f = canonical_ranks(&forward, &[false; 3]).ranks;
        let b = canonical_ranks(&backward, &[false; 3]).ranks;
        assert_eq!(f, vec![b[2], b[1], b[0]]);
    }

    #[test]
    fn refinement_separates_chain_positions() {
        let mol = chain(&[Element::C; 7]);
        let ranking = canonical_ranks(&mol, &[false; 7]);
        for k in 0..7 {
            assert_eq!(ranking.symmetry[k], ranking.symmetry[6 - k]);
        }
        let mut classes = ranking.symmetry.clone();
        classes.sort_unstable();
        classes.dedup();
        assert_eq!(classes.len(), 4);
    }

    #[test]
    fn long_chain_ranks_without_quadratic_rounds() {
        let n = 100_000;
        let mol = chain(&vec![Element::C; n]);
        let ranking = canonical_ranks(&mol, &vec![false; n]);
        let mut sorted = ranking.ranks.clone();
        sorted.sort_unstable();
        assert!(sorted.iter().enumerate().all(|(k, &r)| k == r));
        assert_eq!(ranking.symmetry[0], ranking.symmetry[n - 1]);
    }
}
