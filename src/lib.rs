//! A pure Rust scoring harness for generative chemistry benchmarks.
//! It canonicalizes submitted SMILES strings and reduces them to the numbers
//! a leaderboard reports: how many parse, how many are distinct, how many are
//! new, how far their distribution sits from a reference set, and how often a
//! retrosynthesis model names exactly the right reactants.
//!
//! # Features
//!
//! - **Rate metrics** — Validity, uniqueness and novelty over a capped
//!   submission, all normalized by the same submission size
//! - **Fréchet distance** — Closed-form distance between two Gaussians,
//!   robust to singular covariances
//! - **Top-1 accuracy** — Exact-match scoring of predicted reactant sets
//! - **Canonical SMILES** — Built-in reader, aromaticity perception and
//!   canonical writer, so equivalent spellings compare equal
//!
//! # Quick Start
//!
//! ```
//! use std::collections::HashSet;
//! use molscore::{MetricCalculator, SmilesCanonicalizer, top_one_accuracy};
//!
//! let training: HashSet<String> = ["CCO".to_string()].into();
//! let submission: Vec<String> = ["CCO", "CCO", "invalid_smiles", "CCN"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//!
//! let calc = MetricCalculator::new(training, &submission, &SmilesCanonicalizer)?;
//! let report = calc.report();
//! assert_eq!(report.validity(), 0.75);
//! assert_eq!(report.uniqueness(), 0.50);
//! assert_eq!(report.novelty(), 0.25);
//!
//! let predictions = vec!["CCO.CCN".to_string(), "CCBr".to_string()];
//! let targets = vec!["CCN.CCO".to_string(), String::new()];
//! let top1 = top_one_accuracy(&predictions, &targets, &SmilesCanonicalizer)?;
//! assert_eq!(top1.accuracy, 1.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module Organization
//!
//! - [`evaluate`] — [`MetricCalculator`], statistics loading, embeddings and
//!   the Fréchet distance
//! - [`reaction`] — [`top_one_accuracy`] over reactant sets
//! - [`smiles`] — SMILES parsing and canonicalization
//! - [`io`] — Line-oriented readers for submission and training files
//!
//! # Collaborators
//!
//! - [`Canonicalizer`] — Maps a SMILES string to its canonical form, or
//!   rejects it; closures implement it too
//! - [`EmbeddingStatEstimator`] — Maps molecules to embedding statistics for
//!   the Fréchet metric; [`FingerprintEstimator`] is the built-in one

mod model;

pub mod evaluate;
pub mod io;
pub mod reaction;
pub mod smiles;

pub use model::molecule::{Atom, Bond, Chirality, Molecule, Neighbor};
pub use model::types::{BondOrder, Element, ParseElementError};

pub use evaluate::{
    DEFAULT_MAX_MOLECULES, Device, DistributionStats, EmbeddingConfig, EmbeddingError,
    EmbeddingStatEstimator, EvaluationConfig, FingerprintEstimator, FrechetError, FrechetOptions,
    Metric, MetricCalculator, ParseMetricError, StatsError, SubmissionReport, frechet_distance,
    frechet_distance_with,
};
pub use reaction::{ReactantSet, TopOneReport, top_one_accuracy, top_one_accuracy_from_files};
pub use smiles::{Canonicalizer, SmilesCanonicalizer, canonical_smiles, parse_smiles};

pub use evaluate::Error as EvaluateError;
pub use reaction::Error as ReactionError;
pub use smiles::Error as ParseSmilesError;
