use super::error::Error;
use super::rings::ring_atoms;
use crate::model::molecule::Molecule;
use crate::model::types::BondOrder;

/// Upper bound on search steps before a system is declared unkekulizable.
const SEARCH_BUDGET: usize = 100_000;

/// Replaces aromatic bonds with an alternating single/double assignment.
///
/// Every atom flagged in `needs_pi` must receive exactly one double bond
/// along its aromatic bonds. On success all aromatic flags are cleared so
/// perception can start from the Kekulé form.
pub(super) fn kekulize(
    mol: &mut Molecule,
    needs_pi: &[bool],
    ring_bonds: &[bool],
) -> Result<(), Error> {
    let in_ring = ring_atoms(mol, ring_bonds);
    if let Some(idx) = (0..mol.atom_count()).find(|&i| mol.atoms[i].aromatic && !in_ring[i]) {
        return Err(Error::AromaticOutsideRing(idx));
    }
    if let Some(bond) = mol.bonds.iter().find(|b| {
        b.order == BondOrder::Aromatic && !(mol.atoms[b.i].aromatic && mol.atoms[b.j].aromatic)
    }) {
        return Err(Error::AromaticBondMismatch(bond.i, bond.j));
    }

    let mut matcher = Matcher {
        mol,
        open: needs_pi.to_vec(),
        chosen: Vec::new(),
        budget: SEARCH_BUDGET,
    };
    if !matcher.solve() {
        let idx = needs_pi.iter().position(|&p| p).unwrap_or(0);
        return Err(Error::Kekulize(idx));
    }
    let chosen = matcher.chosen;

    for bond in mol.bonds.iter_mut() {
        if bond.order == BondOrder::Aromatic {
            bond.order = BondOrder::Single;
        }
    }
    for bond in chosen {
        mol.bonds[bond].order = BondOrder::Double;
    }
    for atom in mol.atoms.iter_mut() {
        atom.aromatic = false;
    }
    Ok(())
}

struct Matcher<'a> {
    mol: &'a Molecule,
    open: Vec<bool>,
    chosen: Vec<usize>,
    budget: usize,
}

/// Atom whose double-bond partner is being chosen, and the next partner to
/// try.
struct Choice {
    atom: usize,
    options: Vec<(usize, usize)>,
    next: usize,
}

enum Pick {
    Done,
    DeadEnd,
    Branch(usize),
}

impl Matcher<'_> {
    fn open_partners(&self, atom: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.mol
            .neighbors(atom)
            .iter()
            .filter(|nb| {
                self.open[nb.atom] && self.mol.bonds[nb.bond].order == BondOrder::Aromatic
            })
            .map(|nb| (nb.atom, nb.bond))
    }

    /// The open atom with the fewest open partners.
    fn pick(&self) -> Pick {
        let mut best: Option<(usize, usize)> = None;
        for atom in (0..self.open.len()).filter(|&a| self.open[a]) {
            let count = self.open_partners(atom).count();
            if count == 0 {
                return Pick::DeadEnd;
            }
            if best.is_none_or(|(_, b)| count < b) {
                best = Some((atom, count));
            }
        }
        match best {
            Some((atom, _)) => Pick::Branch(atom),
            None => Pick::Done,
        }
    }

    /// Depth-first search that always extends the most constrained atom.
    fn solve(&mut self) -> bool {
        let mut stack: Vec<Choice> = Vec::new();
        loop {
            match self.pick() {
                Pick::Done => return true,
                Pick::DeadEnd => {}
                Pick::Branch(atom) => {
                    if self.budget == 0 {
                        return false;
                    }
                    self.budget -= 1;
                    let options: Vec<(usize, usize)> = self.open_partners(atom).collect();
                    self.open[atom] = false;
                    stack.push(Choice {
                        atom,
                        options,
                        next: 0,
                    });
                }
            }

            loop {
                let Some(choice) = stack.last_mut() else {
                    return false;
                };
                if choice.next > 0 {
                    let (partner, _) = choice.options[choice.next - 1];
                    self.open[partner] = true;
                    self.chosen.pop();
                }
                if let Some(&(partner, bond)) = choice.options.get(choice.next) {
                    choice.next += 1;
                    self.open[partner] = false;
                    self.chosen.push(bond);
                    break;
                }
                self.open[choice.atom] = true;
                stack.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::parser::parse;
    use super::super::rings::ring_bonds;
    use super::super::valence::assign_hydrogens;
    use super::*;

    fn kekule(text: &str) -> Result<Molecule, Error> {
        let mut parsed = parse(text)?;
        let pi = assign_hydrogens(&mut parsed);
        let rings = ring_bonds(&parsed.molecule);
        kekulize(&mut parsed.molecule, &pi, &rings)?;
        Ok(parsed.molecule)
    }

    fn doubles(mol: &Molecule) -> usize {
        mol.bonds
            .iter()
            .filter(|b| b.order == BondOrder::Double)
            .count()
    }

    #[test]
    fn benzene_gets_three_double_bonds() {
        let mol = kekule("c1ccccc1").unwrap();
        assert_eq!(doubles(&mol), 3);
        assert!(mol.atoms.iter().all(|a| !a.aromatic));
        for idx in 0..mol.atom_count() {
            assert_eq!(mol.bond_valence(idx) + mol.atoms[idx].hydrogens, 4);
        }
    }

    #[test]
    fn pyrrole_and_furan() {
        assert_eq!(doubles(&kekule("c1cc[nH]c1").unwrap()), 2);
        assert_eq!(doubles(&kekule("c1ccoc1").unwrap()), 2);
    }

    #[test]
    fn fused_rings() {
        assert_eq!(doubles(&kekule("c1ccc2ccccc2c1").unwrap()), 5);
        assert_eq!(doubles(&kekule("c1ccc2[nH]ccc2c1").unwrap()), 4);
    }

    #[test]
    fn odd_ring_without_heteroatom_fails() {
        assert!(matches!(kekule("c1cccc1"), Err(Error::Kekulize(_))));
        assert!(matches!(kekule("c1ccnc1"), Err(Error::Kekulize(_))));
    }

    #[test]
    fn long_linked_ring_chain_kekulizes() {
        let mut text = String::from("c1ccccc1");
        for _ in 0..999 {
            text.push_str("-c1ccccc1");
        }
        let mol = kekule(&text).unwrap();
        assert_eq!(doubles(&mol), 3000);
    }

    #[test]
    fn polycyclic_systems() {
        assert_eq!(doubles(&kekule("c1ccc2cc3ccccc3cc2c1").unwrap()), 7);
        assert_eq!(doubles(&kekule("c1cc2ccc3cccc4ccc(c1)c2c34").unwrap()), 8);
    }

    #[test]
    fn aromatic_atom_outside_ring_fails() {
        assert!(matches!(kekule("cC"), Err(Error::AromaticOutsideRing(0))));
    }

    #[test]
    fn aromatic_bond_needs_aromatic_atoms() {
        assert!(matches!(
            kekule("C1:CCCC1"),
            Err(Error::AromaticBondMismatch(0, 1))
        ));
    }
}
