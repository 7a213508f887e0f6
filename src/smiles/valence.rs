use super::error::Error;
use super::parser::ParsedSmiles;
use crate::model::molecule::{Atom, Molecule};
use crate::model::types::{BondOrder, Element};

/// Hydrogens and pi demand implied by a bonding sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Implicit {
    pub hydrogens: u8,
    /// Aromatic atom that still owes one double bond to its ring system.
    pub needs_pi: bool,
}

/// Infers hydrogens for an unbracketed atom from its default valences.
///
/// `bonded` counts aromatic bonds as one. Returns zero hydrogens when the
/// bonding sum already exceeds every default valence; the valence check
/// rejects such atoms afterwards.
pub(crate) fn implicit_for(element: Element, aromatic: bool, bonded: u8) -> Implicit {
    let Some(&target) = element
        .default_valences()
        .iter()
        .find(|&&v| v >= bonded)
    else {
        return Implicit {
            hydrogens: 0,
            needs_pi: false,
        };
    };
    let free = target - bonded;
    if aromatic && free >= 1 {
        Implicit {
            hydrogens: free - 1,
            needs_pi: true,
        }
    } else {
        Implicit {
            hydrogens: free,
            needs_pi: false,
        }
    }
}

/// Fills in implicit hydrogens and reports which aromatic atoms need a
/// double bond during kekulization.
pub(super) fn assign_hydrogens(parsed: &mut ParsedSmiles) -> Vec<bool> {
    let mol = &mut parsed.molecule;
    let mut needs_pi = vec![false; mol.atom_count()];

    for idx in 0..mol.atom_count() {
        let bonded = mol.bond_valence(idx);
        let atom = &mol.atoms[idx];

        if !parsed.bracket[idx] {
            let implicit = implicit_for(atom.element, atom.aromatic, bonded);
            needs_pi[idx] = implicit.needs_pi;
            mol.atoms[idx].hydrogens = implicit.hydrogens;
        } else if atom.aromatic {
            let used = bonded + atom.hydrogens;
            needs_pi[idx] = atom
                .element
                .allowed_valences(atom.charge)
                .and_then(|valences| valences.iter().find(|&&v| v >= used))
                .is_some_and(|&v| v > used);
        }
    }

    needs_pi
}

/// Rejects atoms whose total valence exceeds what their element and charge
/// permit. Expects a kekulized molecule.
pub(super) fn check_valences(mol: &Molecule) -> Result<(), Error> {
    for (idx, atom) in mol.atoms.iter().enumerate() {
        let Some(allowed) = atom.element.allowed_valences(atom.charge) else {
            continue;
        };
        let total = mol.bond_valence(idx) + atom.hydrogens;
        let max = allowed.iter().copied().max().unwrap_or(0);
        if total > max {
            return Err(Error::valence(idx, atom.element.symbol(), total));
        }
    }
    Ok(())
}

fn is_plain_hydrogen(atom: &Atom) -> bool {
    atom.element == Element::H
        && atom.isotope.is_none()
        && atom.charge == 0
        && atom.atom_class.is_none()
}

/// Merges explicit `[H]` atoms into the hydrogen count of their neighbor.
///
/// Isotopic, charged or mapped hydrogens stay explicit, as does a hydrogen
/// bonded to another hydrogen.
pub(super) fn fold_explicit_hydrogens(mol: &mut Molecule) {
    let mut remove = vec![false; mol.atom_count()];

    for idx in 0..mol.atom_count() {
        if !is_plain_hydrogen(&mol.atoms[idx]) || mol.degree(idx) != 1 {
            continue;
        }
        let nb = mol.neighbors(idx)[0];
        if mol.atoms[nb.atom].element == Element::H
            || mol.bonds[nb.bond].order != BondOrder::Single
        {
            continue;
        }
        remove[idx] = true;
    }

    if !remove.iter().any(|&r| r) {
        return;
    }

    for heavy in 0..mol.atom_count() {
        if remove[heavy] {
            continue;
        }
        let mut parity_flips = 0usize;
        let mut kept = 0usize;
        let mut folded = 0u8;
        for nb in mol.neighbors(heavy) {
            if remove[nb.atom] {
                // Moving this hydrogen to the front of the reference order
                // passes over `kept` neighbors and any implicit hydrogen.
                let implicit = usize::from(mol.atoms[heavy].hydrogens + folded > 0);
                parity_flips += kept + implicit;
                folded += 1;
            } else {
                kept += 1;
            }
        }
        if folded == 0 {
            continue;
        }
        let atom = &mut mol.atoms[heavy];
        atom.hydrogens += folded;
        if parity_flips % 2 == 1 {
            atom.chirality = atom.chirality.map(|c| c.inverted());
        }
    }

    mol.remove_atoms(&remove);
}

#[cfg(test)]
mod tests {
    use super::super::parser::parse;
    use super::*;
    use crate::model::molecule::Chirality;

    fn hydrogens(text: &str) -> (Vec<u8>, Vec<bool>) {
        let mut parsed = parse(text).unwrap();
        let pi = assign_hydrogens(&mut parsed);
        (
            parsed.molecule.atoms.iter().map(|a| a.hydrogens).collect(),
            pi,
        )
    }

    #[test]
    fn implicit_hydrogens_for_aliphatic_atoms() {
        assert_eq!(hydrogens("CCO").0, vec![3, 2, 1]);
        assert_eq!(hydrogens("C=O").0, vec![2, 0]);
        assert_eq!(hydrogens("C#N").0, vec![1, 0]);
        assert_eq!(hydrogens("CS(=O)(=O)C").0, vec![3, 0, 0, 0, 3]);
    }

    #[test]
    fn aromatic_atoms_reserve_a_pi_bond() {
        let (h, pi) = hydrogens("c1ccncc1");
        assert_eq!(h, vec![1, 1, 1, 0, 1, 1]);
        assert!(pi.iter().all(|&p| p));

        let (h, pi) = hydrogens("c1cc[nH]c1");
        assert_eq!(h, vec![1, 1, 1, 1, 1]);
        assert_eq!(pi, vec![true, true, true, false, true]);

        let (_, pi) = hydrogens("c1ccoc1");
        assert_eq!(pi, vec![true, true, true, false, true]);
    }

    #[test]
    fn bracket_atoms_keep_their_hydrogen_count() {
        assert_eq!(hydrogens("[CH2]C").0, vec![2, 3]);
        assert_eq!(hydrogens("[NH4+]").0, vec![4]);
        assert_eq!(hydrogens("[Na+]").0, vec![0]);
    }

    #[test]
    fn charged_aromatic_nitrogen_needs_pi() {
        let (_, pi) = hydrogens("C[n+]1ccccc1");
        assert!(pi[1]);
    }

    #[test]
    fn valence_check_rejects_overbonded_atoms() {
        let mut parsed = parse("C(C)(C)(C)(C)C").unwrap();
        assign_hydrogens(&mut parsed);
        assert!(matches!(
            check_valences(&parsed.molecule),
            Err(Error::Valence { atom: 0, valence: 5, .. })
        ));

        let mut parsed = parse("[NH4+]").unwrap();
        assign_hydrogens(&mut parsed);
        assert!(check_valences(&parsed.molecule).is_ok());

        let mut parsed = parse("[OH3]").unwrap();
        assign_hydrogens(&mut parsed);
        assert!(check_valences(&parsed.molecule).is_err());
    }

    #[test]
    fn unchecked_elements_pass() {
        let mut parsed = parse("[Fe](C)(C)(C)(C)(C)(C)C").unwrap();
        assign_hydrogens(&mut parsed);
        assert!(check_valences(&parsed.molecule).is_ok());
    }

    #[test]
    fn folds_plain_explicit_hydrogens() {
        let mut parsed = parse("[H]C([H])([H])[H]").unwrap();
        assign_hydrogens(&mut parsed);
        fold_explicit_hydrogens(&mut parsed.molecule);
        assert_eq!(parsed.molecule.atom_count(), 1);
        assert_eq!(parsed.molecule.atoms[0].hydrogens, 4);
    }

    #[test]
    fn keeps_isotopic_and_molecular_hydrogen() {
        let mut parsed = parse("[2H]C").unwrap();
        assign_hydrogens(&mut parsed);
        fold_explicit_hydrogens(&mut parsed.molecule);
        assert_eq!(parsed.molecule.atom_count(), 2);

        let mut parsed = parse("[H][H]").unwrap();
        assign_hydrogens(&mut parsed);
        fold_explicit_hydrogens(&mut parsed.molecule);
        assert_eq!(parsed.molecule.atom_count(), 2);
    }

    #[test]
    fn folding_preserves_chirality_meaning() {
        // F[C@H](Cl)Br and F[C@]([H])(Cl)Br describe the same center.
        let mut implicit = parse("F[C@H](Cl)Br").unwrap();
        assign_hydrogens(&mut implicit);

        let mut explicit = parse("F[C@]([H])(Cl)Br").unwrap();
        assign_hydrogens(&mut explicit);
        fold_explicit_hydrogens(&mut explicit.molecule);

        assert_eq!(
            implicit.molecule.atoms[1].chirality,
            explicit.molecule.atoms[1].chirality
        );
        assert_eq!(explicit.molecule.atoms[1].chirality, Some(Chirality::Clockwise));
    }
}
