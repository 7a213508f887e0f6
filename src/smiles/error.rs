use thiserror::Error;

/// Reasons a SMILES string is rejected.
///
/// Positions are byte offsets into the input string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("unexpected character '{found}' at position {position}")]
    UnexpectedCharacter { position: usize, found: char },

    #[error("unexpected end of input inside a bracket atom starting at position {0}")]
    UnterminatedBracket(usize),

    #[error("unknown element symbol '{symbol}' at position {position}")]
    UnknownElement { position: usize, symbol: String },

    #[error("element '{0}' cannot be aromatic")]
    InvalidAromaticElement(String),

    #[error("bond symbol at position {0} is not followed by an atom")]
    DanglingBond(usize),

    #[error("branch at position {0} has no preceding atom")]
    BranchWithoutAtom(usize),

    #[error("unbalanced parentheses at position {0}")]
    UnbalancedBranch(usize),

    #[error("ring bond {0} was opened but never closed")]
    UnclosedRing(u16),

    #[error("ring bond {digit} at position {position} closes onto its own atom")]
    RingSelfBond { position: usize, digit: u16 },

    #[error("ring bond {digit} at position {position} duplicates an existing bond")]
    DuplicateBond { position: usize, digit: u16 },

    #[error("ring bond {digit} has conflicting bond symbols")]
    ConflictingRingBond { digit: u16 },

    #[error("unsupported SMILES feature at position {position}: {feature}")]
    Unsupported { position: usize, feature: &'static str },

    #[error("explicit valence {valence} is not allowed for {element} (atom {atom})")]
    Valence {
        atom: usize,
        element: String,
        valence: u8,
    },

    #[error("aromatic atom {0} is not in a ring")]
    AromaticOutsideRing(usize),

    #[error("aromatic bond between atoms {0} and {1} joins a non-aromatic atom")]
    AromaticBondMismatch(usize, usize),

    #[error("cannot kekulize aromatic system containing atom {0}")]
    Kekulize(usize),
}

impl Error {
    pub(crate) fn unexpected(position: usize, found: char) -> Self {
        Self::UnexpectedCharacter { position, found }
    }

    pub(crate) fn valence(atom: usize, element: impl Into<String>, valence: u8) -> Self {
        Self::Valence {
            atom,
            element: element.into(),
            valence,
        }
    }
}
