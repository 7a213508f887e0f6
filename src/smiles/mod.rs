//! SMILES reading and canonical writing.
//!
//! A string goes through the same stages every time:
//!
//! 1. **Read** the graph, keeping written neighbor order for chirality.
//! 2. **Hydrogens** are inferred for organic-subset atoms.
//! 3. **Kekulize** aromatic input into alternating single/double bonds.
//! 4. **Check** valences and fold plain explicit `[H]` atoms.
//! 5. **Perceive** aromaticity again from the Kekulé form.
//! 6. **Rank** atoms canonically and **write** them out.
//!
//! Because aromaticity is always re-derived, `C1=CC=CC=C1` and `c1ccccc1`
//! reach step 6 as the same graph.

mod aromatic;
mod error;
mod kekule;
mod parser;
mod rank;
mod rings;
mod valence;
mod writer;

pub use error::Error;

use crate::model::molecule::Molecule;

/// Anything that maps a SMILES string to its canonical form.
///
/// `None` marks the input as an invalid molecule. Closures implement the
/// trait, which keeps scoring code testable with stub canonicalizers.
pub trait Canonicalizer {
    fn canonicalize(&self, smiles: &str) -> Option<String>;
}

impl<F> Canonicalizer for F
where
    F: Fn(&str) -> Option<String>,
{
    fn canonicalize(&self, smiles: &str) -> Option<String> {
        self(smiles)
    }
}

/// The built-in canonicalizer backed by [`canonical_smiles`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SmilesCanonicalizer;

impl Canonicalizer for SmilesCanonicalizer {
    fn canonicalize(&self, smiles: &str) -> Option<String> {
        match canonical_smiles(smiles) {
            Ok(canonical) => Some(canonical),
            Err(e) => {
                tracing::trace!(smiles, error = %e, "rejected molecule");
                None
            }
        }
    }
}

/// Molecule plus the per-atom pi flags the writer needs.
struct Prepared {
    molecule: Molecule,
    pi: Vec<bool>,
}

fn prepare(text: &str) -> Result<Prepared, Error> {
    let mut parsed = parser::parse(text)?;
    let needs_pi = valence::assign_hydrogens(&mut parsed);

    let mut molecule = parsed.molecule;
    let ring_bonds = rings::ring_bonds(&molecule);
    kekule::kekulize(&mut molecule, &needs_pi, &ring_bonds)?;
    valence::check_valences(&molecule)?;
    valence::fold_explicit_hydrogens(&mut molecule);

    let ring_bonds = rings::ring_bonds(&molecule);
    let pi = aromatic::perceive(&mut molecule, &ring_bonds);

    Ok(Prepared { molecule, pi })
}

/// Parses `text` into a validated molecule with perceived aromaticity and
/// all hydrogens counted on their heavy atoms.
pub fn parse_smiles(text: &str) -> Result<Molecule, Error> {
    prepare(text).map(|prepared| prepared.molecule)
}

/// Canonical SMILES for `text`.
///
/// Two strings describing the same molecule produce the same output, and
/// the output canonicalizes to itself. The empty string stays empty.
pub fn canonical_smiles(text: &str) -> Result<String, Error> {
    let Prepared { mut molecule, pi } = prepare(text)?;

    let ring_bonds = rings::ring_bonds(&molecule);
    let in_ring = rings::ring_atoms(&molecule, &ring_bonds);
    let ranking = rank::canonical_ranks(&molecule, &in_ring);
    drop_unresolved_chirality(&mut molecule, &ranking.symmetry);

    Ok(writer::write_smiles(&molecule, &ranking.ranks, &pi))
}

/// Clears chirality tags that cannot describe a stereocenter: too few or
/// too many neighbors, two hydrogens, or two symmetry-equivalent neighbors.
fn drop_unresolved_chirality(mol: &mut Molecule, symmetry: &[usize]) {
    for idx in 0..mol.atom_count() {
        if mol.atoms[idx].chirality.is_none() {
            continue;
        }
        let hydrogens = usize::from(mol.atoms[idx].hydrogens);
        let total = mol.degree(idx) + hydrogens;

        let mut classes: Vec<usize> = mol
            .neighbors(idx)
            .iter()
            .map(|nb| symmetry[nb.atom])
            .collect();
        classes.sort_unstable();
        let repeated = classes.windows(2).any(|w| w[0] == w[1]);

        if hydrogens > 1 || !(3..=4).contains(&total) || repeated {
            mol.atoms[idx].chirality = None;
        }
    }
}
