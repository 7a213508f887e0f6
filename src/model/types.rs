//! Chemical elements and bond orders as they appear in SMILES strings.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid or unsupported element symbol: '{0}'")]
pub struct ParseElementError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Element {
    H = 1,
    He,
    Li,
    Be,
    B,
    C,
    N,
    O,
    F,
    Ne,
    Na,
    Mg,
    Al,
    Si,
    P,
    S,
    Cl,
    Ar,
    K,
    Ca,
    Sc,
    Ti,
    V,
    Cr,
    Mn,
    Fe,
    Co,
    Ni,
    Cu,
    Zn,
    Ga,
    Ge,
    As,
    Se,
    Br,
    Kr,
    Rb,
    Sr,
    Y,
    Zr,
    Nb,
    Mo,
    Tc,
    Ru,
    Rh,
    Pd,
    Ag,
    Cd,
    In,
    Sn,
    Sb,
    Te,
    I,
    Xe,
    Cs,
    Ba,
    La,
    Ce,
    Pr,
    Nd,
    Pm,
    Sm,
    Eu,
    Gd,
    Tb,
    Dy,
    Ho,
    Er,
    Tm,
    Yb,
    Lu,
    Hf,
    Ta,
    W,
    Re,
    Os,
    Ir,
    Pt,
    Au,
    Hg,
    Tl,
    Pb,
    Bi,
    Po,
    At,
    Rn,
    Fr,
    Ra,
    Ac,
    Th,
    Pa,
    U,
    Np,
    Pu,
    Am,
    Cm,
    Bk,
    Cf,
    Es,
    Fm,
    Md,
    No,
    Lr,
    Rf,
    Db,
    Sg,
    Bh,
    Hs,
    Mt,
    Ds,
    Rg,
    Cn,
    Nh,
    Fl,
    Mc,
    Lv,
    Ts,
    Og = 118,
}

impl Element {
    #[inline]
    pub fn atomic_number(&self) -> u8 {
        *self as u8
    }

    pub fn symbol(&self) -> &'static str {
        SYMBOLS[usize::from(self.atomic_number()) - 1]
    }

    /// Element with atomic number `z`, if `1 <= z <= 118`.
    pub fn from_atomic_number(z: u8) -> Option<Self> {
        ELEMENTS.get(usize::from(z).checked_sub(1)?).copied()
    }

    /// Default valences used to infer implicit hydrogens on unbracketed atoms.
    ///
    /// Empty for elements outside the SMILES organic subset.
    pub fn default_valences(&self) -> &'static [u8] {
        match self {
            Element::B => &[3],
            Element::C => &[4],
            Element::N => &[3, 5],
            Element::O => &[2],
            Element::P => &[3, 5],
            Element::S => &[2, 4, 6],
            Element::F | Element::Cl | Element::Br | Element::I => &[1],
            _ => &[],
        }
    }

    #[inline]
    pub fn is_organic_subset(&self) -> bool {
        !self.default_valences().is_empty()
    }

    /// Whether the element may be written with a lowercase aromatic symbol.
    pub fn can_be_aromatic(&self) -> bool {
        matches!(
            self,
            Element::B
                | Element::C
                | Element::N
                | Element::O
                | Element::P
                | Element::S
                | Element::As
                | Element::Se
                | Element::Te
        )
    }

    /// Valences permitted for this element carrying `charge`.
    ///
    /// A charged main-group atom is treated like its isoelectronic neighbor
    /// (N+ like C, O- like F, ...). Returns `None` for elements whose valence
    /// is not checked, which covers metals and anything outside the table.
    pub fn allowed_valences(&self, charge: i8) -> Option<&'static [u8]> {
        if !CHECKED_VALENCE.contains(self) {
            return None;
        }
        let shifted = i16::from(self.atomic_number()) - i16::from(charge);
        if !(1..=54).contains(&shifted) {
            return None;
        }
        valence_table(shifted as u8)
    }
}

const CHECKED_VALENCE: [Element; 15] = [
    Element::H,
    Element::B,
    Element::C,
    Element::N,
    Element::O,
    Element::F,
    Element::Si,
    Element::P,
    Element::S,
    Element::Cl,
    Element::As,
    Element::Se,
    Element::Br,
    Element::Te,
    Element::I,
];

fn valence_table(atomic_number: u8) -> Option<&'static [u8]> {
    match atomic_number {
        1 | 3 | 11 | 19 => Some(&[1]),
        2 | 10 | 18 | 36 | 54 => Some(&[0]),
        4 | 12 => Some(&[2]),
        5 | 13 => Some(&[3]),
        6 | 14 | 32 => Some(&[4]),
        7 => Some(&[3]),
        8 => Some(&[2]),
        9 => Some(&[1]),
        15 | 33 => Some(&[3, 5]),
        16 | 34 | 52 => Some(&[2, 4, 6]),
        17 | 35 | 53 => Some(&[1, 3, 5, 7]),
        51 => Some(&[3, 5]),
        _ => None,
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Element {
    type Err = ParseElementError;

    /// Case-sensitive symbol lookup, `"Cl"` but not `"cl"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SYMBOLS
            .iter()
            .position(|&symbol| symbol == s)
            .map(|idx| ELEMENTS[idx])
            .ok_or_else(|| ParseElementError(s.to_string()))
    }
}

#[rustfmt::skip]
const SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne",
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca",
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr",
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn",
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd",
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th",
    "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm",
    "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds",
    "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

#[rustfmt::skip]
const ELEMENTS: [Element; 118] = {
    use Element::*;
    [
        H, He, Li, Be, B, C, N, O, F, Ne,
        Na, Mg, Al, Si, P, S, Cl, Ar, K, Ca,
        Sc, Ti, V, Cr, Mn, Fe, Co, Ni, Cu, Zn,
        Ga, Ge, As, Se, Br, Kr, Rb, Sr, Y, Zr,
        Nb, Mo, Tc, Ru, Rh, Pd, Ag, Cd, In, Sn,
        Sb, Te, I, Xe, Cs, Ba, La, Ce, Pr, Nd,
        Pm, Sm, Eu, Gd, Tb, Dy, Ho, Er, Tm, Yb,
        Lu, Hf, Ta, W, Re, Os, Ir, Pt, Au, Hg,
        Tl, Pb, Bi, Po, At, Rn, Fr, Ra, Ac, Th,
        Pa, U, Np, Pu, Am, Cm, Bk, Cf, Es, Fm,
        Md, No, Lr, Rf, Db, Sg, Bh, Hs, Mt, Ds,
        Rg, Cn, Nh, Fl, Mc, Lv, Ts, Og,
    ]
};

/// Bond multiplicity between two atoms.
///
/// `Aromatic` only exists between parsing and kekulization, and again on
/// bonds perceived as aromatic before writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
}

impl BondOrder {
    /// Parses an explicit SMILES bond symbol.
    ///
    /// Directional bonds (`/`, `\`) read as plain single bonds.
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '-' | '/' | '\\' => Some(BondOrder::Single),
            '=' => Some(BondOrder::Double),
            '#' => Some(BondOrder::Triple),
            '$' => Some(BondOrder::Quadruple),
            ':' => Some(BondOrder::Aromatic),
            _ => None,
        }
    }

    /// Contribution to an atom's valence, counting aromatic bonds as one.
    pub fn valence(&self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
        }
    }

    /// Small integer distinguishing bond orders in hashes and sort keys.
    pub fn code(&self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
            BondOrder::Aromatic => 5,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BondOrder::Single => "-",
            BondOrder::Double => "=",
            BondOrder::Triple => "#",
            BondOrder::Quadruple => "$",
            BondOrder::Aromatic => ":",
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BondOrder::Single => write!(f, "Single"),
            BondOrder::Double => write!(f, "Double"),
            BondOrder::Triple => write!(f, "Triple"),
            BondOrder::Quadruple => write!(f, "Quadruple"),
            BondOrder::Aromatic => write!(f, "Aromatic"),
        }
    }
}
