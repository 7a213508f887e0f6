use std::collections::HashMap;
use std::str::FromStr;

use super::error::Error;
use crate::model::molecule::{Atom, Bond, Chirality, Molecule, Neighbor};
use crate::model::types::{BondOrder, Element};

const MAX_CHARGE: i32 = 15;

/// Raw graph straight out of the reader, before hydrogens are assigned.
pub(super) struct ParsedSmiles {
    pub molecule: Molecule,
    /// `true` for atoms written in brackets; their hydrogen count is explicit.
    pub bracket: Vec<bool>,
}

struct RingOpening {
    atom: usize,
    order: Option<BondOrder>,
    slot: usize,
}

pub(super) fn parse(text: &str) -> Result<ParsedSmiles, Error> {
    Parser::new(text).run()
}

struct Parser<'a> {
    text: &'a str,
    input: &'a [u8],
    pos: usize,
    atoms: Vec<Atom>,
    bracket: Vec<bool>,
    bonds: Vec<Bond>,
    slots: Vec<Vec<Option<Neighbor>>>,
    rings: HashMap<u16, RingOpening>,
    branches: Vec<(usize, usize)>,
    prev: Option<usize>,
    pending: Option<(BondOrder, usize)>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            input: text.as_bytes(),
            pos: 0,
            atoms: Vec::new(),
            bracket: Vec::new(),
            bonds: Vec::new(),
            slots: Vec::new(),
            rings: HashMap::new(),
            branches: Vec::new(),
            prev: None,
            pending: None,
        }
    }

    fn run(mut self) -> Result<ParsedSmiles, Error> {
        while let Some(byte) = self.peek() {
            match byte {
                b'(' => self.open_branch()?,
                b')' => self.close_branch()?,
                b'[' => self.bracket_atom()?,
                b'.' => {
                    if let Some((_, position)) = self.pending {
                        return Err(Error::DanglingBond(position));
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                b'%' | b'0'..=b'9' => self.ring_bond()?,
                b'-' | b'=' | b'#' | b'$' | b':' | b'/' | b'\\' => self.bond_symbol()?,
                _ => self.organic_atom()?,
            }
        }

        if let Some((_, position)) = self.pending {
            return Err(Error::DanglingBond(position));
        }
        if let Some(&(_, position)) = self.branches.last() {
            return Err(Error::UnbalancedBranch(position));
        }
        if let Some(digit) = self.rings.keys().min() {
            return Err(Error::UnclosedRing(*digit));
        }

        let adjacency = self
            .slots
            .into_iter()
            .map(|slots| slots.into_iter().flatten().collect())
            .collect();

        Ok(ParsedSmiles {
            molecule: Molecule::from_parts(self.atoms, self.bonds, adjacency),
            bracket: self.bracket,
        })
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn unexpected_here(&self) -> Error {
        let found = self.text[self.pos..].chars().next().unwrap_or('\0');
        Error::unexpected(self.pos, found)
    }

    fn open_branch(&mut self) -> Result<(), Error> {
        let Some(atom) = self.prev else {
            return Err(Error::BranchWithoutAtom(self.pos));
        };
        if self.pending.is_some() {
            return Err(self.unexpected_here());
        }
        self.branches.push((atom, self.pos));
        self.pos += 1;
        Ok(())
    }

    fn close_branch(&mut self) -> Result<(), Error> {
        if let Some((_, position)) = self.pending {
            return Err(Error::DanglingBond(position));
        }
        if self.pos > 0 && self.input[self.pos - 1] == b'(' {
            return Err(self.unexpected_here());
        }
        let Some((atom, _)) = self.branches.pop() else {
            return Err(Error::UnbalancedBranch(self.pos));
        };
        self.prev = Some(atom);
        self.pos += 1;
        Ok(())
    }

    fn bond_symbol(&mut self) -> Result<(), Error> {
        let symbol = self.input[self.pos] as char;
        if self.pending.is_some() {
            return Err(self.unexpected_here());
        }
        if self.prev.is_none() {
            return Err(Error::DanglingBond(self.pos));
        }
        let order = BondOrder::from_symbol(symbol).ok_or_else(|| self.unexpected_here())?;
        self.pending = Some((order, self.pos));
        self.pos += 1;
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<(), Error> {
        let next = self.peek_at(1);
        let (element, aromatic, len) = match self.input[self.pos] {
            b'B' if next == Some(b'r') => (Element::Br, false, 2),
            b'C' if next == Some(b'l') => (Element::Cl, false, 2),
            b'B' => (Element::B, false, 1),
            b'C' => (Element::C, false, 1),
            b'N' => (Element::N, false, 1),
            b'O' => (Element::O, false, 1),
            b'P' => (Element::P, false, 1),
            b'S' => (Element::S, false, 1),
            b'F' => (Element::F, false, 1),
            b'I' => (Element::I, false, 1),
            b'b' => (Element::B, true, 1),
            b'c' => (Element::C, true, 1),
            b'n' => (Element::N, true, 1),
            b'o' => (Element::O, true, 1),
            b'p' => (Element::P, true, 1),
            b's' => (Element::S, true, 1),
            b'*' => {
                return Err(Error::Unsupported {
                    position: self.pos,
                    feature: "wildcard atom",
                });
            }
            _ => return Err(self.unexpected_here()),
        };
        self.pos += len;
        self.add_atom(Atom::new(element).with_aromatic(aromatic), false);
        Ok(())
    }

    fn bracket_atom(&mut self) -> Result<(), Error> {
        let start = self.pos;
        self.pos += 1;

        let isotope = self.read_number(3);
        let (element, aromatic) = self.bracket_symbol(start)?;

        let chirality = if self.peek() == Some(b'@') {
            self.pos += 1;
            let tag = if self.peek() == Some(b'@') {
                self.pos += 1;
                Chirality::Clockwise
            } else {
                Chirality::CounterClockwise
            };
            if matches!(self.peek(), Some(b'T' | b'A' | b'S' | b'O')) {
                return Err(Error::Unsupported {
                    position: self.pos,
                    feature: "non-tetrahedral chirality",
                });
            }
            Some(tag)
        } else {
            None
        };

        let hydrogens = if self.peek() == Some(b'H') {
            self.pos += 1;
            self.read_number(1).unwrap_or(1) as u8
        } else {
            0
        };

        let charge = self.bracket_charge()?;

        let atom_class = if self.peek() == Some(b':') {
            self.pos += 1;
            Some(self.read_number(9).ok_or_else(|| self.unexpected_here())?)
        } else {
            None
        };

        match self.peek() {
            Some(b']') => self.pos += 1,
            Some(_) => return Err(self.unexpected_here()),
            None => return Err(Error::UnterminatedBracket(start)),
        }

        // Reference order puts the hydrogen first; in the written order it
        // follows the preceding atom, one transposition away.
        let chirality = match chirality {
            Some(tag) if hydrogens > 0 && self.prev.is_some() => Some(tag.inverted()),
            other => other,
        };

        let atom = Atom {
            element,
            isotope: isotope.map(|v| v as u16),
            charge,
            hydrogens,
            aromatic,
            chirality,
            atom_class,
        };
        self.add_atom(atom, true);
        Ok(())
    }

    fn bracket_symbol(&mut self, start: usize) -> Result<(Element, bool), Error> {
        let Some(first) = self.peek() else {
            return Err(Error::UnterminatedBracket(start));
        };
        let second = self.peek_at(1);

        if first.is_ascii_uppercase() {
            if let Some(lower) = second.filter(u8::is_ascii_lowercase) {
                let symbol = format!("{}{}", first as char, lower as char);
                if let Ok(element) = Element::from_str(&symbol) {
                    self.pos += 2;
                    return Ok((element, false));
                }
            }
            let symbol = (first as char).to_string();
            return match Element::from_str(&symbol) {
                Ok(element) => {
                    self.pos += 1;
                    Ok((element, false))
                }
                Err(_) => Err(Error::UnknownElement {
                    position: self.pos,
                    symbol,
                }),
            };
        }

        if first.is_ascii_lowercase() {
            let two = match (first, second) {
                (b's', Some(b'e')) => Some(Element::Se),
                (b'a', Some(b's')) => Some(Element::As),
                (b't', Some(b'e')) => Some(Element::Te),
                _ => None,
            };
            if let Some(element) = two {
                self.pos += 2;
                return Ok((element, true));
            }
            let one = match first {
                b'b' => Some(Element::B),
                b'c' => Some(Element::C),
                b'n' => Some(Element::N),
                b'o' => Some(Element::O),
                b'p' => Some(Element::P),
                b's' => Some(Element::S),
                _ => None,
            };
            return match one {
                Some(element) => {
                    self.pos += 1;
                    Ok((element, true))
                }
                None => Err(Error::InvalidAromaticElement(
                    self.text[self.pos..].chars().take(1).collect(),
                )),
            };
        }

        if first == b'*' {
            return Err(Error::Unsupported {
                position: self.pos,
                feature: "wildcard atom",
            });
        }

        Err(self.unexpected_here())
    }

    fn bracket_charge(&mut self) -> Result<i8, Error> {
        let sign: i32 = match self.peek() {
            Some(b'+') => 1,
            Some(b'-') => -1,
            _ => return Ok(0),
        };
        let symbol = self.input[self.pos];
        self.pos += 1;

        let magnitude = match self.read_number(2) {
            Some(n) => n as i32,
            None => {
                let mut count = 1;
                while self.peek() == Some(symbol) {
                    count += 1;
                    self.pos += 1;
                }
                count
            }
        };

        if magnitude > MAX_CHARGE {
            return Err(Error::Unsupported {
                position: self.pos,
                feature: "formal charge magnitude above 15",
            });
        }
        Ok((sign * magnitude) as i8)
    }

    fn read_number(&mut self, max_digits: usize) -> Option<u32> {
        let mut value: Option<u32> = None;
        for _ in 0..max_digits {
            match self.peek() {
                Some(d @ b'0'..=b'9') => {
                    value = Some(value.unwrap_or(0) * 10 + u32::from(d - b'0'));
                    self.pos += 1;
                }
                _ => break,
            }
        }
        value
    }

    fn ring_bond(&mut self) -> Result<(), Error> {
        let start = self.pos;
        let digit = if self.peek() == Some(b'%') {
            match (self.peek_at(1), self.peek_at(2)) {
                (Some(a @ b'0'..=b'9'), Some(b @ b'0'..=b'9')) => {
                    self.pos += 3;
                    u16::from(a - b'0') * 10 + u16::from(b - b'0')
                }
                (Some(b'('), _) => {
                    return Err(Error::Unsupported {
                        position: start,
                        feature: "extended ring bond number",
                    });
                }
                _ => return Err(self.unexpected_here()),
            }
        } else {
            let d = self.input[self.pos];
            self.pos += 1;
            u16::from(d - b'0')
        };

        let Some(atom) = self.prev else {
            return Err(Error::unexpected(start, self.input[start] as char));
        };
        let order = self.pending.take().map(|(order, _)| order);

        match self.rings.remove(&digit) {
            Some(open) => {
                if open.atom == atom {
                    return Err(Error::RingSelfBond {
                        position: start,
                        digit,
                    });
                }
                if self.bonded(open.atom, atom) {
                    return Err(Error::DuplicateBond {
                        position: start,
                        digit,
                    });
                }
                let order = match (open.order, order) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(Error::ConflictingRingBond { digit });
                    }
                    (Some(a), _) | (None, Some(a)) => a,
                    (None, None) => self.default_order(open.atom, atom),
                };
                let bond = self.push_bond(open.atom, atom, order);
                self.slots[open.atom][open.slot] = Some(Neighbor { atom, bond });
                self.slots[atom].push(Some(Neighbor {
                    atom: open.atom,
                    bond,
                }));
            }
            None => {
                let slot = self.slots[atom].len();
                self.slots[atom].push(None);
                self.rings.insert(digit, RingOpening { atom, order, slot });
            }
        }
        Ok(())
    }

    fn add_atom(&mut self, atom: Atom, bracket: bool) {
        let idx = self.atoms.len();
        self.atoms.push(atom);
        self.bracket.push(bracket);
        self.slots.push(Vec::new());

        if let Some(prev) = self.prev {
            let order = match self.pending.take() {
                Some((order, _)) => order,
                None => self.default_order(prev, idx),
            };
            let bond = self.push_bond(prev, idx, order);
            self.slots[prev].push(Some(Neighbor { atom: idx, bond }));
            self.slots[idx].push(Some(Neighbor { atom: prev, bond }));
        }

        self.prev = Some(idx);
    }

    fn push_bond(&mut self, a: usize, b: usize, order: BondOrder) -> usize {
        self.bonds.push(Bond::new(a, b, order));
        self.bonds.len() - 1
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        if self.atoms[a].aromatic && self.atoms[b].aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn bonded(&self, a: usize, b: usize) -> bool {
        self.slots[a].iter().flatten().any(|n| n.atom == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(text: &str) -> ParsedSmiles {
        parse(text).unwrap_or_else(|e| panic!("failed to parse '{text}': {e}"))
    }

    #[test]
    fn parses_linear_chain() {
        let p = parsed("CCO");
        assert_eq!(p.molecule.atom_count(), 3);
        assert_eq!(p.molecule.bond_count(), 2);
        assert_eq!(p.molecule.atoms[2].element, Element::O);
        assert_eq!(p.bracket, vec![false, false, false]);
    }

    #[test]
    fn parses_two_letter_organic_symbols() {
        let p = parsed("ClCBr");
        let elements: Vec<_> = p.molecule.atoms.iter().map(|a| a.element).collect();
        assert_eq!(elements, vec![Element::Cl, Element::C, Element::Br]);
    }

    #[test]
    fn parses_branches_and_bond_orders() {
        let p = parsed("CC(=O)O");
        let mol = &p.molecule;
        assert_eq!(mol.degree(1), 3);
        let double = mol.bond_between(1, 2).unwrap();
        assert_eq!(mol.bonds[double].order, BondOrder::Double);
    }

    #[test]
    fn ring_closure_keeps_written_neighbor_order() {
        let p = parsed("C1CC1");
        let mol = &p.molecule;
        assert_eq!(mol.bond_count(), 3);
        let order: Vec<_> = mol.neighbors(0).iter().map(|n| n.atom).collect();
        assert_eq!(order, vec![2, 1]);
    }

    #[test]
    fn aromatic_atoms_get_aromatic_bonds() {
        let p = parsed("c1ccccc1");
        assert!(p.molecule.atoms.iter().all(|a| a.aromatic));
        assert!(
            p.molecule
                .bonds
                .iter()
                .all(|b| b.order == BondOrder::Aromatic)
        );
    }

    #[test]
    fn parses_bracket_atom_fields() {
        let p = parsed("[13CH3-:7]");
        let atom = &p.molecule.atoms[0];
        assert_eq!(atom.isotope, Some(13));
        assert_eq!(atom.element, Element::C);
        assert_eq!(atom.hydrogens, 3);
        assert_eq!(atom.charge, -1);
        assert_eq!(atom.atom_class, Some(7));
        assert!(p.bracket[0]);
    }

    #[test]
    fn parses_repeated_charge_signs() {
        assert_eq!(parsed("[Cu++]").molecule.atoms[0].charge, 2);
        assert_eq!(parsed("[O--]").molecule.atoms[0].charge, -2);
        assert_eq!(parsed("[Fe+3]").molecule.atoms[0].charge, 3);
    }

    #[test]
    fn chirality_is_normalized_to_hydrogen_first() {
        let first = parsed("[C@H](F)(Cl)Br");
        assert_eq!(
            first.molecule.atoms[0].chirality,
            Some(Chirality::CounterClockwise)
        );

        let inner = parsed("F[C@H](Cl)Br");
        assert_eq!(inner.molecule.atoms[1].chirality, Some(Chirality::Clockwise));
    }

    #[test]
    fn percent_ring_numbers() {
        let p = parsed("C%10CC%10");
        assert_eq!(p.molecule.bond_count(), 3);
    }

    #[test]
    fn dot_separates_components() {
        let p = parsed("[Na+].[Cl-]");
        assert_eq!(p.molecule.bond_count(), 0);
        assert_eq!(p.molecule.components().len(), 2);
    }

    #[test]
    fn empty_string_is_empty_molecule() {
        assert!(parsed("").molecule.is_empty());
    }

    #[test]
    fn rejects_unknown_characters() {
        assert!(matches!(
            parse("invalid_smiles"),
            Err(Error::UnexpectedCharacter { position: 0, .. })
        ));
        assert!(matches!(
            parse("CCX"),
            Err(Error::UnexpectedCharacter { position: 2, .. })
        ));
    }

    #[test]
    fn rejects_structural_errors() {
        assert!(matches!(parse("C1CC"), Err(Error::UnclosedRing(1))));
        assert!(matches!(parse("CC(C"), Err(Error::UnbalancedBranch(2))));
        assert!(matches!(parse("CC)C"), Err(Error::UnbalancedBranch(2))));
        assert!(matches!(parse("CC="), Err(Error::DanglingBond(2))));
        assert!(matches!(parse("(C)C"), Err(Error::BranchWithoutAtom(0))));
        assert!(matches!(parse("C11"), Err(Error::RingSelfBond { .. })));
        assert!(matches!(parse("C12CC12"), Err(Error::DuplicateBond { .. })));
        assert!(matches!(
            parse("C=1CC#1"),
            Err(Error::ConflictingRingBond { digit: 1 })
        ));
    }

    #[test]
    fn rejects_malformed_brackets() {
        assert!(matches!(parse("[CH4"), Err(Error::UnterminatedBracket(0))));
        assert!(matches!(parse("[Xx]"), Err(Error::UnknownElement { .. })));
        assert!(matches!(parse("[*]"), Err(Error::Unsupported { .. })));
        assert!(matches!(parse("[C@TH1](F)(Cl)Br"), Err(Error::Unsupported { .. })));
    }
}
