//! Submission scoring: validity, uniqueness, novelty and Fréchet distance.
//!
//! All three rates share the denominator `N`, the number of submission
//! lines read after the cap and before any filtering. Invalid molecules
//! stay in `N`; they only shrink the numerators.

mod config;
mod embedding;
mod error;
mod frechet;
mod stats;

pub use config::{DEFAULT_MAX_MOLECULES, EvaluationConfig};
pub use embedding::{
    Device, EmbeddingConfig, EmbeddingError, EmbeddingStatEstimator, FingerprintEstimator,
    sample_statistics,
};
pub use error::Error;
pub use frechet::{FrechetError, FrechetOptions, frechet_distance, frechet_distance_with};
pub use stats::{DistributionStats, StatsError};

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error as ThisError;

use crate::io;
use crate::smiles::{Canonicalizer, SmilesCanonicalizer};

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("unsupported metric: '{0}' (expected validity, uniqueness, novelty or fcd)")]
pub struct ParseMetricError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Validity,
    Uniqueness,
    Novelty,
    Fcd,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Validity,
        Metric::Uniqueness,
        Metric::Novelty,
        Metric::Fcd,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Validity => "validity",
            Metric::Uniqueness => "uniqueness",
            Metric::Novelty => "novelty",
            Metric::Fcd => "fcd",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = ParseMetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| ParseMetricError(s.to_string()))
    }
}

/// Counts behind the three rate metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionReport {
    /// Submission lines considered, `N`.
    pub total: usize,
    pub valid: usize,
    pub unique: usize,
    /// Unique valid molecules absent from the training set.
    pub novel: usize,
}

impl SubmissionReport {
    fn rate(&self, count: usize) -> f64 {
        count as f64 / self.total as f64
    }

    pub fn validity(&self) -> f64 {
        self.rate(self.valid)
    }

    pub fn uniqueness(&self) -> f64 {
        self.rate(self.unique)
    }

    pub fn novelty(&self) -> f64 {
        self.rate(self.novel)
    }
}

/// Scores one submission against a training set.
///
/// Canonicalization happens once, at construction.
#[derive(Debug, Clone)]
pub struct MetricCalculator {
    training: HashSet<String>,
    total: usize,
    valid: Vec<String>,
    frechet: FrechetOptions,
}

impl MetricCalculator {
    /// Reads both files and canonicalizes the submission with the built-in
    /// canonicalizer.
    pub fn from_files(
        training_path: impl AsRef<Path>,
        submission_path: impl AsRef<Path>,
        config: &EvaluationConfig,
    ) -> Result<Self, Error> {
        let training = io::read_training_set(training_path)?;
        let submission = io::read_submission(submission_path, config.max_molecules)?;
        Ok(Self::new(training, &submission, &SmilesCanonicalizer)?
            .with_frechet_options(config.frechet))
    }

    /// Canonicalizes `submission` with `canonicalizer`.
    ///
    /// Entries the canonicalizer rejects are counted in `N` but nowhere
    /// else.
    pub fn new<C: Canonicalizer + ?Sized>(
        training: HashSet<String>,
        submission: &[String],
        canonicalizer: &C,
    ) -> Result<Self, Error> {
        if submission.is_empty() {
            return Err(Error::EmptySubmission);
        }
        let valid: Vec<String> = submission
            .iter()
            .filter_map(|smiles| canonicalizer.canonicalize(smiles))
            .collect();

        tracing::debug!(
            total = submission.len(),
            valid = valid.len(),
            training = training.len(),
            "canonicalized submission"
        );

        Ok(Self {
            training,
            total: submission.len(),
            valid,
            frechet: FrechetOptions::default(),
        })
    }

    pub fn with_frechet_options(mut self, options: FrechetOptions) -> Self {
        self.frechet = options;
        self
    }

    /// Canonical forms of the valid entries, in submission order.
    pub fn valid_molecules(&self) -> &[String] {
        &self.valid
    }

    pub fn report(&self) -> SubmissionReport {
        let unique: HashSet<&str> = self.valid.iter().map(String::as_str).collect();
        let novel = unique
            .iter()
            .filter(|smiles| !self.training.contains(**smiles))
            .count();
        SubmissionReport {
            total: self.total,
            valid: self.valid.len(),
            unique: unique.len(),
            novel,
        }
    }

    /// Fréchet distance between the embedding statistics of the valid
    /// molecules and `reference`.
    pub fn fcd<E: EmbeddingStatEstimator + ?Sized>(
        &self,
        reference: &DistributionStats,
        estimator: &E,
    ) -> Result<f64, Error> {
        let generated = estimator.estimate(&self.valid)?;
        Ok(frechet_distance_with(
            &generated.mean,
            &generated.covariance,
            &reference.mean,
            &reference.covariance,
            &self.frechet,
        )?)
    }

    /// Value of a single metric.
    ///
    /// `reference_stats` is only opened for [`Metric::Fcd`].
    pub fn compute<E: EmbeddingStatEstimator + ?Sized>(
        &self,
        metric: Metric,
        reference_stats: impl AsRef<Path>,
        estimator: &E,
    ) -> Result<f64, Error> {
        let reference = match metric {
            Metric::Fcd => Some(DistributionStats::load(reference_stats)?),
            _ => None,
        };
        self.compute_with(metric, reference.as_ref(), estimator)
    }

    /// Value of a single metric against statistics the caller already
    /// loaded. Only [`Metric::Fcd`] needs `reference`.
    pub fn compute_with<E: EmbeddingStatEstimator + ?Sized>(
        &self,
        metric: Metric,
        reference: Option<&DistributionStats>,
        estimator: &E,
    ) -> Result<f64, Error> {
        let report = self.report();
        let value = match metric {
            Metric::Validity => report.validity(),
            Metric::Uniqueness => report.uniqueness(),
            Metric::Novelty => report.novelty(),
            Metric::Fcd => {
                let reference = reference.ok_or(Error::MissingReference)?;
                self.fcd(reference, estimator)?
            }
        };
        tracing::debug!(%metric, value, "computed metric");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{DMatrix, DVector};
    use proptest::prelude::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn training(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Accepts anything without a `!`, unchanged.
    fn stub(smiles: &str) -> Option<String> {
        (!smiles.contains('!')).then(|| smiles.to_string())
    }

    struct FixedEstimator(DistributionStats);

    impl EmbeddingStatEstimator for FixedEstimator {
        fn estimate(&self, molecules: &[String]) -> Result<DistributionStats, EmbeddingError> {
            if molecules.len() < 2 {
                return Err(EmbeddingError::InsufficientSamples(molecules.len()));
            }
            Ok(self.0.clone())
        }
    }

    #[test]
    fn metric_names_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(metric.name().parse::<Metric>().unwrap(), metric);
        }
        let err = "accuracy".parse::<Metric>().unwrap_err();
        assert!(err.to_string().contains("unsupported metric"));
        assert!("Validity".parse::<Metric>().is_err());
    }

    #[test]
    fn worked_example_with_builtin_canonicalizer() {
        let calc = MetricCalculator::new(
            training(&["CCO"]),
            &strings(&["CCO", "CCO", "invalid_smiles", "CCN"]),
            &SmilesCanonicalizer,
        )
        .unwrap();
        let report = calc.report();
        assert_eq!(report.total, 4);
        assert_eq!(report.validity(), 0.75);
        assert_eq!(report.uniqueness(), 0.5);
        assert_eq!(report.novelty(), 0.25);
    }

    #[test]
    fn duplicates_are_detected_on_canonical_forms() {
        let calc = MetricCalculator::new(
            training(&[]),
            &strings(&["CCO", "OCC", "C(O)C"]),
            &SmilesCanonicalizer,
        )
        .unwrap();
        let report = calc.report();
        assert_eq!(report.valid, 3);
        assert_eq!(report.unique, 1);
    }

    #[test]
    fn empty_submission_is_an_error() {
        assert!(matches!(
            MetricCalculator::new(training(&["CCO"]), &[], &stub),
            Err(Error::EmptySubmission)
        ));
    }

    #[test]
    fn all_invalid_gives_zero_rates() {
        let calc =
            MetricCalculator::new(training(&[]), &strings(&["a!", "b!"]), &stub).unwrap();
        let report = calc.report();
        assert_eq!(report.validity(), 0.0);
        assert_eq!(report.uniqueness(), 0.0);
        assert_eq!(report.novelty(), 0.0);
    }

    #[test]
    fn rate_metrics_never_touch_the_stats_file() {
        let calc = MetricCalculator::new(training(&[]), &strings(&["A", "B"]), &stub).unwrap();
        let estimator = FingerprintEstimator::new(EmbeddingConfig::default()).unwrap();
        let missing = Path::new("/nonexistent/stats.npz");
        for metric in [Metric::Validity, Metric::Uniqueness, Metric::Novelty] {
            assert_eq!(calc.compute(metric, missing, &estimator).unwrap(), 1.0);
        }
        assert!(matches!(
            calc.compute(Metric::Fcd, missing, &estimator),
            Err(Error::Stats(StatsError::Io(_)))
        ));
    }

    #[test]
    fn compute_with_preloaded_statistics() {
        let stats = DistributionStats::new(
            DVector::from_vec(vec![0.0, 0.0]),
            DMatrix::identity(2, 2),
        )
        .unwrap();
        let calc =
            MetricCalculator::new(training(&["A"]), &strings(&["A", "B", "B", "!"]), &stub)
                .unwrap();
        let estimator = FixedEstimator(stats.clone());

        assert_eq!(
            calc.compute_with(Metric::Validity, None, &estimator).unwrap(),
            0.75
        );
        assert_eq!(
            calc.compute_with(Metric::Novelty, None, &estimator).unwrap(),
            0.25
        );
        assert!(matches!(
            calc.compute_with(Metric::Fcd, None, &estimator),
            Err(Error::MissingReference)
        ));
        let d = calc
            .compute_with(Metric::Fcd, Some(&stats), &estimator)
            .unwrap();
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn fcd_against_matching_reference_is_zero() {
        let stats = DistributionStats::new(
            DVector::from_vec(vec![1.0, 2.0]),
            DMatrix::from_row_slice(2, 2, &[1.0, 0.2, 0.2, 1.0]),
        )
        .unwrap();
        let calc = MetricCalculator::new(training(&[]), &strings(&["A", "B"]), &stub).unwrap();
        let d = calc.fcd(&stats, &FixedEstimator(stats.clone())).unwrap();
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn fcd_needs_two_valid_molecules() {
        let stats =
            DistributionStats::new(DVector::from_vec(vec![0.0]), DMatrix::identity(1, 1)).unwrap();
        let calc =
            MetricCalculator::new(training(&[]), &strings(&["A", "b!", "c!"]), &stub).unwrap();
        assert!(matches!(
            calc.fcd(&stats, &FixedEstimator(stats.clone())),
            Err(Error::Embedding(EmbeddingError::InsufficientSamples(1)))
        ));
    }

    #[test]
    fn fcd_dimension_mismatch_is_numerical_error() {
        let generated =
            DistributionStats::new(DVector::from_vec(vec![0.0]), DMatrix::identity(1, 1)).unwrap();
        let reference = DistributionStats::new(
            DVector::from_vec(vec![0.0, 0.0]),
            DMatrix::identity(2, 2),
        )
        .unwrap();
        let calc = MetricCalculator::new(training(&[]), &strings(&["A", "B"]), &stub).unwrap();
        assert!(matches!(
            calc.fcd(&reference, &FixedEstimator(generated)),
            Err(Error::Frechet(FrechetError::DimensionMismatch { .. }))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn rates_are_ordered(
            submission in prop::collection::vec("[a-e!]{1,2}", 1..40),
            train in prop::collection::hash_set("[a-e]{1,2}", 0..10),
        ) {
            let calc = MetricCalculator::new(train, &submission, &stub).unwrap();
            let report = calc.report();
            let invalid = submission.iter().filter(|s| s.contains('!')).count();

            prop_assert_eq!(report.valid + invalid, report.total);
            prop_assert!(report.novelty() <= report.uniqueness());
            prop_assert!(report.uniqueness() <= report.validity());
            prop_assert!(report.validity() <= 1.0);
        }
    }
}
