use std::collections::HashMap;
use std::fmt::Write as _;

use super::valence::implicit_for;
use crate::model::molecule::{Chirality, Molecule, Neighbor};
use crate::model::types::BondOrder;

const UNSEEN: usize = usize::MAX;
const HYDROGEN: usize = usize::MAX;
const MAX_RING_DIGIT: usize = 99;

/// Writes `mol` as SMILES, visiting atoms in the order given by `ranks`.
///
/// `pi` flags aromatic atoms whose Kekulé form carried a double bond inside
/// the ring; it decides whether such an atom can be written without
/// brackets.
pub(super) fn write_smiles(mol: &Molecule, ranks: &[usize], pi: &[bool]) -> String {
    let mut components = mol.components();
    components.sort_by_key(|members| members.iter().map(|&a| ranks[a]).min());

    let mut writer = Writer::new(mol, ranks, pi);
    let mut out = String::new();
    for (k, members) in components.iter().enumerate() {
        let Some(&root) = members.iter().min_by_key(|&&a| ranks[a]) else {
            continue;
        };
        if k > 0 {
            out.push('.');
        }
        writer.discover(root);
        writer.emit(root, &mut out);
    }
    out
}

/// Atom on the discovery stack and its next neighbor to look at.
struct Frame {
    atom: usize,
    around: Vec<Neighbor>,
    next: usize,
}

/// Pending output: an atom still to be written, or literal text.
enum Step {
    Atom(usize),
    Text(&'static str),
}

struct Writer<'a> {
    mol: &'a Molecule,
    ranks: &'a [usize],
    pi: &'a [bool],
    preorder: Vec<usize>,
    counter: usize,
    parent: Vec<Option<usize>>,
    children: Vec<Vec<Neighbor>>,
    closures: Vec<Vec<Neighbor>>,
    closure_bond: Vec<bool>,
    digit_in_use: [bool; MAX_RING_DIGIT + 1],
    open_digits: HashMap<usize, usize>,
}

impl<'a> Writer<'a> {
    fn new(mol: &'a Molecule, ranks: &'a [usize], pi: &'a [bool]) -> Self {
        let n = mol.atom_count();
        Self {
            mol,
            ranks,
            pi,
            preorder: vec![UNSEEN; n],
            counter: 0,
            parent: vec![None; n],
            children: vec![Vec::new(); n],
            closures: vec![Vec::new(); n],
            closure_bond: vec![false; mol.bond_count()],
            digit_in_use: [false; MAX_RING_DIGIT + 1],
            open_digits: HashMap::new(),
        }
    }

    fn enter(&mut self, atom: usize, via: Option<usize>) -> Frame {
        self.preorder[atom] = self.counter;
        self.counter += 1;

        let mut around: Vec<Neighbor> = self
            .mol
            .neighbors(atom)
            .iter()
            .filter(|nb| Some(nb.bond) != via)
            .copied()
            .collect();
        around.sort_by_key(|nb| self.ranks[nb.atom]);
        Frame {
            atom,
            around,
            next: 0,
        }
    }

    /// First pass: spanning tree and ring-closure bonds.
    fn discover(&mut self, root: usize) {
        let mut stack = vec![self.enter(root, None)];
        while let Some(frame) = stack.last_mut() {
            let atom = frame.atom;
            let Some(nb) = frame.around.get(frame.next).copied() else {
                stack.pop();
                continue;
            };
            frame.next += 1;

            if self.preorder[nb.atom] == UNSEEN {
                self.children[atom].push(nb);
                self.parent[nb.atom] = Some(atom);
                let child = self.enter(nb.atom, Some(nb.bond));
                stack.push(child);
            } else if !self.closure_bond[nb.bond] {
                self.closure_bond[nb.bond] = true;
                self.closures[atom].push(nb);
                self.closures[nb.atom].push(Neighbor {
                    atom,
                    bond: nb.bond,
                });
            }
        }
    }

    /// Second pass: text in preorder, branches in parentheses.
    fn emit(&mut self, root: usize, out: &mut String) {
        let mut steps = vec![Step::Atom(root)];
        while let Some(step) = steps.pop() {
            let atom = match step {
                Step::Text(text) => {
                    out.push_str(text);
                    continue;
                }
                Step::Atom(atom) => atom,
            };
            self.emit_head(atom, out);

            let children = &self.children[atom];
            let last = children.len().saturating_sub(1);
            for (k, child) in children.iter().enumerate().rev() {
                if k < last {
                    steps.push(Step::Text(")"));
                }
                steps.push(Step::Atom(child.atom));
                steps.push(Step::Text(self.bond_symbol(child.bond)));
                if k < last {
                    steps.push(Step::Text("("));
                }
            }
        }
    }

    /// Atom symbol followed by its ring-closure digits.
    fn emit_head(&mut self, atom: usize, out: &mut String) {
        let mut closing: Vec<Neighbor> = Vec::new();
        let mut opening: Vec<Neighbor> = Vec::new();
        for &nb in &self.closures[atom] {
            if self.preorder[nb.atom] < self.preorder[atom] {
                closing.push(nb);
            } else {
                opening.push(nb);
            }
        }
        closing.sort_by_key(|nb| self.ranks[nb.atom]);
        opening.sort_by_key(|nb| self.ranks[nb.atom]);

        let mut ring_text = String::new();
        let mut ring_order = Vec::with_capacity(closing.len() + opening.len());
        let mut released = Vec::new();

        for nb in &closing {
            if let Some(digit) = self.open_digits.remove(&nb.bond) {
                push_digit(&mut ring_text, digit);
                released.push(digit);
            }
            ring_order.push(nb.atom);
        }
        for nb in &opening {
            let digit = self.take_digit();
            ring_text.push_str(self.bond_symbol(nb.bond));
            push_digit(&mut ring_text, digit);
            self.open_digits.insert(nb.bond, digit);
            ring_order.push(nb.atom);
        }
        for digit in released {
            self.digit_in_use[digit] = false;
        }

        let chirality = self.written_chirality(atom, &ring_order);
        self.push_atom(atom, chirality, out);
        out.push_str(&ring_text);
    }

    fn take_digit(&mut self) -> usize {
        let digit = (1..=MAX_RING_DIGIT)
            .find(|&d| !self.digit_in_use[d])
            .unwrap_or(MAX_RING_DIGIT);
        self.digit_in_use[digit] = true;
        digit
    }

    fn bond_symbol(&self, bond: usize) -> &'static str {
        let bond = &self.mol.bonds[bond];
        match bond.order {
            BondOrder::Aromatic => "",
            BondOrder::Single
                if self.mol.atoms[bond.i].aromatic && self.mol.atoms[bond.j].aromatic =>
            {
                "-"
            }
            BondOrder::Single => "",
            order => order.symbol(),
        }
    }

    /// Chirality tag relative to the order neighbors appear in the output.
    fn written_chirality(&self, atom: usize, ring_order: &[usize]) -> Option<Chirality> {
        let tag = self.mol.atoms[atom].chirality?;
        let hydrogen = (self.mol.atoms[atom].hydrogens > 0).then_some(HYDROGEN);

        let reference: Vec<usize> = hydrogen
            .into_iter()
            .chain(self.mol.neighbors(atom).iter().map(|nb| nb.atom))
            .collect();
        let written: Vec<usize> = self.parent[atom]
            .into_iter()
            .chain(hydrogen)
            .chain(ring_order.iter().copied())
            .chain(self.children[atom].iter().map(|nb| nb.atom))
            .collect();

        let positions: Vec<usize> = written
            .iter()
            .map(|x| reference.iter().position(|r| r == x))
            .collect::<Option<_>>()?;

        if odd_permutation(&positions) {
            Some(tag.inverted())
        } else {
            Some(tag)
        }
    }

    fn push_atom(&self, idx: usize, chirality: Option<Chirality>, out: &mut String) {
        let atom = &self.mol.atoms[idx];
        let symbol = if atom.aromatic {
            atom.element.symbol().to_ascii_lowercase()
        } else {
            atom.element.symbol().to_string()
        };

        let plain = chirality.is_none()
            && atom.charge == 0
            && atom.isotope.is_none()
            && atom.atom_class.is_none()
            && atom.element.is_organic_subset();
        if plain {
            let implicit = implicit_for(atom.element, atom.aromatic, self.mol.bond_valence(idx));
            if implicit.hydrogens == atom.hydrogens && implicit.needs_pi == self.pi[idx] {
                out.push_str(&symbol);
                return;
            }
        }

        out.push('[');
        if let Some(isotope) = atom.isotope {
            let _ = write!(out, "{isotope}");
        }
        out.push_str(&symbol);
        if let Some(tag) = chirality {
            out.push_str(tag.symbol());
        }
        match atom.hydrogens {
            0 => {}
            1 => out.push('H'),
            h => {
                let _ = write!(out, "H{h}");
            }
        }
        match atom.charge {
            0 => {}
            1 => out.push('+'),
            -1 => out.push('-'),
            c if c > 0 => {
                let _ = write!(out, "+{c}");
            }
            c => {
                let _ = write!(out, "-{}", -i16::from(c));
            }
        }
        if let Some(class) = atom.atom_class {
            let _ = write!(out, ":{class}");
        }
        out.push(']');
    }
}

fn push_digit(out: &mut String, digit: usize) {
    if digit < 10 {
        let _ = write!(out, "{digit}");
    } else {
        let _ = write!(out, "%{digit}");
    }
}

fn odd_permutation(positions: &[usize]) -> bool {
    let mut inversions = 0usize;
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            if positions[i] > positions[j] {
                inversions += 1;
            }
        }
    }
    inversions % 2 == 1
}
