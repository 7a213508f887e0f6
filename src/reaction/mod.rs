//! Top-1 accuracy of predicted reactant sets.
//!
//! Each row pairs one predicted `.`-joined reactant string with the true
//! one. A row matches when both sides canonicalize to the same set of
//! molecules; order and repetition of components do not matter.

use std::collections::BTreeSet;
use std::path::Path;

pub mod error;

pub use error::Error;

use crate::io;
use crate::smiles::{Canonicalizer, SmilesCanonicalizer};

/// Canonical components of one reactant string.
///
/// Components the canonicalizer rejects are left out, so a string made only
/// of invalid components becomes the empty set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReactantSet(BTreeSet<String>);

impl ReactantSet {
    pub fn new<C: Canonicalizer + ?Sized>(reactants: &str, canonicalizer: &C) -> Self {
        Self(
            reactants
                .trim()
                .split('.')
                .filter_map(|component| canonicalizer.canonicalize(component))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopOneReport {
    pub correct: usize,
    /// Rows with a non-blank target.
    pub scored: usize,
    /// Rows skipped because their target was blank.
    pub dropped: usize,
    pub accuracy: f64,
}

/// Scores `predictions[i]` against `targets[i]` for every row.
///
/// Two sets that are both empty count as a match.
pub fn top_one_accuracy<C: Canonicalizer + ?Sized>(
    predictions: &[String],
    targets: &[String],
    canonicalizer: &C,
) -> Result<TopOneReport, Error> {
    if predictions.len() != targets.len() {
        return Err(Error::LengthMismatch {
            predictions: predictions.len(),
            targets: targets.len(),
        });
    }

    let mut correct = 0;
    let mut scored = 0;
    for (row, (predicted, target)) in predictions.iter().zip(targets).enumerate() {
        if target.trim().is_empty() {
            tracing::trace!(row, "dropping row with blank target");
            continue;
        }
        scored += 1;
        if ReactantSet::new(predicted, canonicalizer) == ReactantSet::new(target, canonicalizer) {
            correct += 1;
        }
    }

    if scored == 0 {
        return Err(Error::NoScoredRows);
    }

    let report = TopOneReport {
        correct,
        scored,
        dropped: targets.len() - scored,
        accuracy: correct as f64 / scored as f64,
    };
    tracing::debug!(
        correct = report.correct,
        scored = report.scored,
        dropped = report.dropped,
        "scored reactant predictions"
    );
    Ok(report)
}

/// Reads both files line by line and scores them with the built-in
/// canonicalizer.
pub fn top_one_accuracy_from_files(
    predictions_path: impl AsRef<Path>,
    targets_path: impl AsRef<Path>,
) -> Result<TopOneReport, Error> {
    let predictions = io::read_raw_lines(predictions_path)?;
    let targets = io::read_raw_lines(targets_path)?;
    top_one_accuracy(&predictions, &targets, &SmilesCanonicalizer)
}
