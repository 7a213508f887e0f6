use super::rings::candidate_rings;
use crate::model::molecule::Molecule;
use crate::model::types::{BondOrder, Element};

/// Pi electrons an atom donates to a ring, or `None` if it cannot take part
/// in an aromatic system.
fn pi_electrons(mol: &Molecule, idx: usize, ring_bonds: &[bool]) -> Option<u32> {
    let atom = &mol.atoms[idx];
    if !atom.element.can_be_aromatic() {
        return None;
    }
    let connections = mol.degree(idx) + usize::from(atom.hydrogens);
    if connections > 3 {
        return None;
    }

    let mut double = None;
    for nb in mol.neighbors(idx) {
        match mol.bonds[nb.bond].order {
            BondOrder::Double if double.is_none() => double = Some(*nb),
            BondOrder::Single => {}
            _ => return None,
        }
    }

    if let Some(nb) = double {
        if ring_bonds[nb.bond] {
            return Some(1);
        }
        let partner = mol.atoms[nb.atom].element;
        return match (atom.element, partner) {
            (Element::C, Element::O | Element::N | Element::S) => Some(0),
            _ => None,
        };
    }

    match (atom.element, atom.charge, connections) {
        (Element::N | Element::P | Element::As, 0, 3) => Some(2),
        (Element::O | Element::S | Element::Se | Element::Te, 0, 2) => Some(2),
        (Element::C, -1, _) => Some(2),
        (Element::N, -1, 2) => Some(2),
        (Element::C, 1, _) => Some(0),
        (Element::B, 0, 3) => Some(0),
        _ => None,
    }
}

#[inline]
fn huckel(electrons: u32) -> bool {
    electrons >= 2 && (electrons - 2) % 4 == 0
}

fn ring_edges(ring: &[usize]) -> impl Iterator<Item = (usize, usize)> + '_ {
    ring.iter()
        .copied()
        .zip(ring.iter().copied().cycle().skip(1))
}

/// Marks 4n+2 rings of a Kekulé molecule as aromatic.
///
/// Single smallest rings are tested first, then pairs of rings fused along
/// one bond, which catches systems such as azulene whose members are not
/// aromatic on their own. Returns, per atom, whether one of its double bonds
/// was absorbed into an aromatic bond.
pub(super) fn perceive(mol: &mut Molecule, ring_bonds: &[bool]) -> Vec<bool> {
    let electrons: Vec<Option<u32>> = (0..mol.atom_count())
        .map(|idx| pi_electrons(mol, idx, ring_bonds))
        .collect();
    let rings = candidate_rings(mol, ring_bonds);

    let eligible: Vec<bool> = rings
        .iter()
        .map(|ring| ring.iter().all(|&a| electrons[a].is_some()))
        .collect();
    let count = |atoms: &mut dyn Iterator<Item = usize>| -> u32 {
        atoms.map(|a| electrons[a].unwrap_or(0)).sum()
    };

    let mut aromatic: Vec<bool> = rings
        .iter()
        .zip(&eligible)
        .map(|(ring, &ok)| ok && huckel(count(&mut ring.iter().copied())))
        .collect();

    for a in 0..rings.len() {
        for b in (a + 1)..rings.len() {
            if !(eligible[a] && eligible[b]) || (aromatic[a] && aromatic[b]) {
                continue;
            }
            let shared: Vec<usize> = rings[a]
                .iter()
                .copied()
                .filter(|x| rings[b].contains(x))
                .collect();
            if shared.len() != 2 || mol.bond_between(shared[0], shared[1]).is_none() {
                continue;
            }
            let mut union = rings[a]
                .iter()
                .copied()
                .chain(rings[b].iter().copied().filter(|x| !shared.contains(x)));
            if huckel(count(&mut union)) {
                aromatic[a] = true;
                aromatic[b] = true;
            }
        }
    }

    let mut pi = vec![false; mol.atom_count()];
    for (ring, _) in rings.iter().zip(&aromatic).filter(|(_, a)| **a) {
        for (x, y) in ring_edges(ring) {
            let Some(bond) = mol.bond_between(x, y) else {
                continue;
            };
            if mol.bonds[bond].order == BondOrder::Double {
                pi[x] = true;
                pi[y] = true;
            }
            mol.bonds[bond].order = BondOrder::Aromatic;
        }
        for &atom in ring {
            mol.atoms[atom].aromatic = true;
        }
    }

    pi
}

#[cfg(test)]
mod tests {
    use super::super::kekule::kekulize;
    use super::super::parser::parse;
    use super::super::rings::ring_bonds;
    use super::super::valence::assign_hydrogens;
    use super::*;

    fn perceived(text: &str) -> Molecule {
        let mut parsed = parse(text).unwrap();
        let needs_pi = assign_hydrogens(&mut parsed);
        let rings = ring_bonds(&parsed.molecule);
        kekulize(&mut parsed.molecule, &needs_pi, &rings).unwrap();
        perceive(&mut parsed.molecule, &rings);
        parsed.molecule
    }

    fn aromatic_count(mol: &Molecule) -> usize {
        mol.atoms.iter().filter(|a| a.aromatic).count()
    }

    #[test]
    fn kekule_benzene_becomes_aromatic() {
        let mol = perceived("C1=CC=CC=C1");
        assert_eq!(aromatic_count(&mol), 6);
        assert!(mol.bonds.iter().all(|b| b.order == BondOrder::Aromatic));
    }

    #[test]
    fn heteroaromatics() {
        assert_eq!(aromatic_count(&perceived("C1=CC=CN1")), 5);
        assert_eq!(aromatic_count(&perceived("C1=COC=C1")), 5);
        assert_eq!(aromatic_count(&perceived("C1=CSC=C1")), 5);
        assert_eq!(aromatic_count(&perceived("C1=CC=NC=C1")), 6);
    }

    #[test]
    fn pyridone_keeps_exocyclic_carbonyl() {
        let mol = perceived("O=C1C=CC=CN1");
        assert_eq!(aromatic_count(&mol), 6);
        let carbonyl = mol.bond_between(0, 1).unwrap();
        assert_eq!(mol.bonds[carbonyl].order, BondOrder::Double);
    }

    #[test]
    fn non_aromatic_rings() {
        assert_eq!(aromatic_count(&perceived("C1=CC=C1")), 0);
        assert_eq!(aromatic_count(&perceived("C1=CCC=C1")), 0);
        assert_eq!(aromatic_count(&perceived("C1CCCCC1")), 0);
        assert_eq!(aromatic_count(&perceived("C1=CC=CC=CC=C1")), 0);
    }

    #[test]
    fn fused_systems() {
        assert_eq!(aromatic_count(&perceived("c1ccc2ccccc2c1")), 10);
        assert_eq!(aromatic_count(&perceived("C1=CC=C2C=CC=C2C=C1")), 10);
    }

    #[test]
    fn biphenyl_link_stays_single() {
        let mol = perceived("c1ccccc1-c1ccccc1");
        let link = mol.bond_between(5, 6).unwrap();
        assert_eq!(mol.bonds[link].order, BondOrder::Single);
        assert_eq!(aromatic_count(&mol), 12);
    }

    #[test]
    fn reports_absorbed_double_bonds() {
        let mut parsed = parse("c1cc[nH]c1").unwrap();
        let needs_pi = assign_hydrogens(&mut parsed);
        let rings = ring_bonds(&parsed.molecule);
        kekulize(&mut parsed.molecule, &needs_pi, &rings).unwrap();
        let pi = perceive(&mut parsed.molecule, &rings);
        assert_eq!(pi, vec![true, true, true, false, true]);
    }
}
