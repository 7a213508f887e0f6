use super::types::{BondOrder, Element};

/// Tetrahedral chirality tag.
///
/// The tag is stored relative to the atom's reference neighbor order: the
/// attached hydrogen (if any) first, followed by [`Molecule::neighbors`] in
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chirality {
    /// `@`: remaining neighbors appear anticlockwise seen from the first.
    CounterClockwise,
    /// `@@`: remaining neighbors appear clockwise seen from the first.
    Clockwise,
}

impl Chirality {
    pub fn inverted(self) -> Self {
        match self {
            Chirality::CounterClockwise => Chirality::Clockwise,
            Chirality::Clockwise => Chirality::CounterClockwise,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Chirality::CounterClockwise => "@",
            Chirality::Clockwise => "@@",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    pub element: Element,
    pub isotope: Option<u16>,
    pub charge: i8,
    /// Total number of attached hydrogens, implicit and bracket count alike.
    pub hydrogens: u8,
    pub aromatic: bool,
    pub chirality: Option<Chirality>,
    pub atom_class: Option<u32>,
}

impl Atom {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            isotope: None,
            charge: 0,
            hydrogens: 0,
            aromatic: false,
            chirality: None,
            atom_class: None,
        }
    }

    pub fn with_aromatic(mut self, aromatic: bool) -> Self {
        self.aromatic = aromatic;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub i: usize,
    pub j: usize,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(idx1: usize, idx2: usize, order: BondOrder) -> Self {
        if idx1 <= idx2 {
            Self { i: idx1, j: idx2, order }
        } else {
            Self { i: idx2, j: idx1, order }
        }
    }

    /// Returns the atom on the other end of the bond.
    #[inline]
    pub fn partner(&self, atom: usize) -> usize {
        if self.i == atom { self.j } else { self.i }
    }
}

/// Neighbor of an atom together with the index of the connecting bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub atom: usize,
    pub bond: usize,
}

/// Molecular graph as read from a SMILES string.
///
/// Neighbor lists keep the order in which the bonds were written, which is
/// what tetrahedral chirality tags refer to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
    adjacency: Vec<Vec<Neighbor>>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        atoms: Vec<Atom>,
        bonds: Vec<Bond>,
        adjacency: Vec<Vec<Neighbor>>,
    ) -> Self {
        debug_assert_eq!(atoms.len(), adjacency.len());
        Self {
            atoms,
            bonds,
            adjacency,
        }
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    #[inline]
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    #[inline]
    pub fn neighbors(&self, atom: usize) -> &[Neighbor] {
        &self.adjacency[atom]
    }

    #[inline]
    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    pub fn bond_between(&self, a: usize, b: usize) -> Option<usize> {
        self.adjacency[a]
            .iter()
            .find(|n| n.atom == b)
            .map(|n| n.bond)
    }

    /// Sum of bond valences around `atom`, aromatic bonds counting as one.
    pub fn bond_valence(&self, atom: usize) -> u8 {
        self.adjacency[atom]
            .iter()
            .map(|n| self.bonds[n.bond].order.valence())
            .sum()
    }

    /// Connected components, each as a sorted list of atom indices.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let n = self.atom_count();
        let mut seen = vec![false; n];
        let mut components = Vec::new();

        for start in 0..n {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut stack = vec![start];
            let mut members = Vec::new();
            while let Some(atom) = stack.pop() {
                members.push(atom);
                for nb in &self.adjacency[atom] {
                    if !seen[nb.atom] {
                        seen[nb.atom] = true;
                        stack.push(nb.atom);
                    }
                }
            }
            members.sort_unstable();
            components.push(members);
        }

        components
    }

    /// Removes the atoms flagged in `remove`, renumbering the rest.
    ///
    /// Neighbor order of surviving atoms is preserved.
    pub(crate) fn remove_atoms(&mut self, remove: &[bool]) {
        let mut new_index = vec![usize::MAX; self.atoms.len()];
        let mut atoms = Vec::with_capacity(self.atoms.len());
        for (idx, atom) in self.atoms.iter().enumerate() {
            if !remove[idx] {
                new_index[idx] = atoms.len();
                atoms.push(atom.clone());
            }
        }

        let mut new_bond = vec![usize::MAX; self.bonds.len()];
        let mut bonds = Vec::with_capacity(self.bonds.len());
        for (idx, bond) in self.bonds.iter().enumerate() {
            if !remove[bond.i] && !remove[bond.j] {
                new_bond[idx] = bonds.len();
                bonds.push(Bond::new(new_index[bond.i], new_index[bond.j], bond.order));
            }
        }

        let adjacency = self
            .adjacency
            .iter()
            .enumerate()
            .filter(|(idx, _)| !remove[*idx])
            .map(|(_, list)| {
                list.iter()
                    .filter(|n| !remove[n.atom])
                    .map(|n| Neighbor {
                        atom: new_index[n.atom],
                        bond: new_bond[n.bond],
                    })
                    .collect()
            })
            .collect();

        self.atoms = atoms;
        self.bonds = bonds;
        self.adjacency = adjacency;
    }
}
