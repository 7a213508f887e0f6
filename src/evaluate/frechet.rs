//! Fréchet distance between two multivariate Gaussians.
//!
//! ```text
//! d² = ‖μ₁ − μ₂‖² + tr(Σ₁) + tr(Σ₂) − 2·tr(√(Σ₁Σ₂))
//! ```
//!
//! `Σ₁Σ₂` is not symmetric, so its square root is never formed. The trace
//! term equals the sum of square roots of the eigenvalues of the symmetric
//! matrix `Σ₁^½ Σ₂ Σ₁^½`, which is similar to `Σ₁Σ₂` and can go through a
//! symmetric eigendecomposition.

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use thiserror::Error;

/// Tolerances for eigenvalues that should be non-negative.
///
/// An eigenvalue `λ` with `λ ≥ −(rel_tol · max|λ| + abs_tol)` is treated as
/// rounding noise and clamped to zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrechetOptions {
    pub rel_tol: f64,
    pub abs_tol: f64,
}

impl Default for FrechetOptions {
    fn default() -> Self {
        Self {
            rel_tol: 1e-9,
            abs_tol: 1e-10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrechetError {
    #[error("distribution statistics are empty")]
    Empty,

    #[error("{what} has shape {found}, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: String,
        found: String,
    },

    #[error("{0} contains non-finite values")]
    NonFinite(&'static str),

    #[error("{what} is not positive semi-definite (eigenvalue {eigenvalue:e})")]
    NotPositiveSemiDefinite { what: &'static str, eigenvalue: f64 },
}

/// Fréchet distance with default tolerances.
pub fn frechet_distance(
    mu1: &DVector<f64>,
    sigma1: &DMatrix<f64>,
    mu2: &DVector<f64>,
    sigma2: &DMatrix<f64>,
) -> Result<f64, FrechetError> {
    frechet_distance_with(mu1, sigma1, mu2, sigma2, &FrechetOptions::default())
}

/// Fréchet distance between `N(mu1, sigma1)` and `N(mu2, sigma2)`.
///
/// Covariances are symmetrized before use. The result is clamped at zero so
/// rounding never yields a negative distance.
pub fn frechet_distance_with(
    mu1: &DVector<f64>,
    sigma1: &DMatrix<f64>,
    mu2: &DVector<f64>,
    sigma2: &DMatrix<f64>,
    options: &FrechetOptions,
) -> Result<f64, FrechetError> {
    let n = mu1.len();
    if n == 0 {
        return Err(FrechetError::Empty);
    }
    check_shapes(n, sigma1, mu2, sigma2)?;
    check_finite("first mean", mu1.iter())?;
    check_finite("second mean", mu2.iter())?;
    check_finite("first covariance", sigma1.iter())?;
    check_finite("second covariance", sigma2.iter())?;

    let s1 = symmetrize(sigma1);
    let s2 = symmetrize(sigma2);

    let root1 = psd_sqrt(&s1, "first covariance", options)?;
    let inner = symmetrize(&(&root1 * &s2 * &root1));
    let trace_covmean: f64 = clamped_eigenvalues(inner, "covariance product", options)?
        .iter()
        .map(|&l| l.sqrt())
        .sum();

    let diff = mu1 - mu2;
    let distance = diff.dot(&diff) + s1.trace() + s2.trace() - 2.0 * trace_covmean;

    tracing::debug!(dimension = n, distance, "computed Fréchet distance");
    Ok(distance.max(0.0))
}

fn check_shapes(
    n: usize,
    sigma1: &DMatrix<f64>,
    mu2: &DVector<f64>,
    sigma2: &DMatrix<f64>,
) -> Result<(), FrechetError> {
    let square = |what: &'static str, m: &DMatrix<f64>| {
        if m.shape() == (n, n) {
            Ok(())
        } else {
            Err(FrechetError::DimensionMismatch {
                what,
                expected: format!("{n}x{n}"),
                found: format!("{}x{}", m.nrows(), m.ncols()),
            })
        }
    };
    square("first covariance", sigma1)?;
    if mu2.len() != n {
        return Err(FrechetError::DimensionMismatch {
            what: "second mean",
            expected: n.to_string(),
            found: mu2.len().to_string(),
        });
    }
    square("second covariance", sigma2)
}

fn check_finite<'a>(
    what: &'static str,
    mut values: impl Iterator<Item = &'a f64>,
) -> Result<(), FrechetError> {
    if values.all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(FrechetError::NonFinite(what))
    }
}

fn symmetrize(m: &DMatrix<f64>) -> DMatrix<f64> {
    (m + m.transpose()) * 0.5
}

/// Eigenvalues of a symmetric matrix with rounding noise clamped to zero.
fn clamped_eigenvalues(
    m: DMatrix<f64>,
    what: &'static str,
    options: &FrechetOptions,
) -> Result<DVector<f64>, FrechetError> {
    let eigenvalues = SymmetricEigen::new(m).eigenvalues;
    clamp(eigenvalues, what, options)
}

fn clamp(
    mut eigenvalues: DVector<f64>,
    what: &'static str,
    options: &FrechetOptions,
) -> Result<DVector<f64>, FrechetError> {
    let scale = eigenvalues.iter().fold(0.0f64, |acc, l| acc.max(l.abs()));
    let tolerance = options.rel_tol * scale + options.abs_tol;
    for l in eigenvalues.iter_mut() {
        if *l < -tolerance {
            return Err(FrechetError::NotPositiveSemiDefinite {
                what,
                eigenvalue: *l,
            });
        }
        *l = l.max(0.0);
    }
    Ok(eigenvalues)
}

/// Principal square root of a symmetric positive semi-definite matrix.
fn psd_sqrt(
    m: &DMatrix<f64>,
    what: &'static str,
    options: &FrechetOptions,
) -> Result<DMatrix<f64>, FrechetError> {
    let eigen = SymmetricEigen::new(m.clone());
    let roots = clamp(eigen.eigenvalues, what, options)?.map(f64::sqrt);
    let vectors = eigen.eigenvectors;
    Ok(&vectors * DMatrix::from_diagonal(&roots) * vectors.transpose())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "{a} vs {b} (tol {tol})");
    }

    #[test]
    fn one_dimensional_closed_form() {
        let mu1 = DVector::from_vec(vec![1.0]);
        let mu2 = DVector::from_vec(vec![3.0]);
        let s1 = DMatrix::from_element(1, 1, 4.0);
        let s2 = DMatrix::from_element(1, 1, 9.0);
        // (1 - 3)² + 4 + 9 - 2·√36
        let d = frechet_distance(&mu1, &s1, &mu2, &s2).unwrap();
        assert_close(d, 5.0, 1e-12);
    }

    #[test]
    fn diagonal_covariances_decompose_per_axis() {
        let mu1 = DVector::from_vec(vec![0.0, 0.0]);
        let mu2 = DVector::from_vec(vec![1.0, 2.0]);
        let s1 = DMatrix::from_diagonal(&DVector::from_vec(vec![1.0, 4.0]));
        let s2 = DMatrix::from_diagonal(&DVector::from_vec(vec![4.0, 1.0]));
        // means: 1 + 4; axis 0: 1 + 4 - 4; axis 1: 4 + 1 - 4
        let d = frechet_distance(&mu1, &s1, &mu2, &s2).unwrap();
        assert_close(d, 7.0, 1e-10);
    }

    #[test]
    fn identical_gaussians_are_at_distance_zero() {
        let mu = DVector::from_vec(vec![0.5, -1.0, 2.0]);
        let sigma = DMatrix::from_row_slice(3, 3, &[2.0, 0.3, 0.1, 0.3, 1.0, 0.2, 0.1, 0.2, 0.5]);
        let d = frechet_distance(&mu, &sigma, &mu, &sigma).unwrap();
        assert_close(d, 0.0, 1e-9);
    }

    #[test]
    fn singular_covariances_are_accepted() {
        let mu = DVector::from_vec(vec![0.0, 0.0]);
        let zero = DMatrix::zeros(2, 2);
        let d = frechet_distance(&mu, &zero, &mu, &zero).unwrap();
        assert_close(d, 0.0, 1e-12);
    }

    #[test]
    fn rejects_bad_shapes_and_values() {
        let mu2 = DVector::from_vec(vec![0.0, 0.0]);
        let s2 = DMatrix::identity(2, 2);

        let empty = DVector::<f64>::zeros(0);
        assert_eq!(
            frechet_distance(&empty, &DMatrix::zeros(0, 0), &mu2, &s2),
            Err(FrechetError::Empty)
        );

        let mu3 = DVector::from_vec(vec![0.0, 0.0, 0.0]);
        assert!(matches!(
            frechet_distance(&mu3, &DMatrix::identity(3, 3), &mu2, &s2),
            Err(FrechetError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            frechet_distance(&mu2, &DMatrix::identity(3, 3), &mu2, &s2),
            Err(FrechetError::DimensionMismatch { .. })
        ));

        let nan = DVector::from_vec(vec![f64::NAN, 0.0]);
        assert_eq!(
            frechet_distance(&nan, &s2, &mu2, &s2),
            Err(FrechetError::NonFinite("first mean"))
        );
    }

    #[test]
    fn rejects_indefinite_covariance() {
        let mu = DVector::from_vec(vec![0.0, 0.0]);
        let indefinite = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, -1.0]);
        let identity = DMatrix::identity(2, 2);
        assert!(matches!(
            frechet_distance(&mu, &indefinite, &mu, &identity),
            Err(FrechetError::NotPositiveSemiDefinite { .. })
        ));
    }

    #[test]
    fn asymmetric_input_is_symmetrized() {
        let mu = DVector::from_vec(vec![0.0, 0.0]);
        let skewed = DMatrix::from_row_slice(2, 2, &[1.0, 0.4, 0.0, 1.0]);
        let symmetric = DMatrix::from_row_slice(2, 2, &[1.0, 0.2, 0.2, 1.0]);
        let a = frechet_distance(&mu, &skewed, &mu, &DMatrix::identity(2, 2)).unwrap();
        let b = frechet_distance(&mu, &symmetric, &mu, &DMatrix::identity(2, 2)).unwrap();
        assert_close(a, b, 1e-12);
    }

    fn gaussian(n: usize) -> impl Strategy<Value = (DVector<f64>, DMatrix<f64>)> {
        (
            prop::collection::vec(-5.0f64..5.0, n),
            prop::collection::vec(-2.0f64..2.0, n * n),
        )
            .prop_map(move |(mean, factor)| {
                let a = DMatrix::from_row_slice(n, n, &factor);
                let sigma = &a * a.transpose() + DMatrix::identity(n, n) * 0.1;
                (DVector::from_vec(mean), sigma)
            })
    }

    fn pair() -> impl Strategy<
        Value = (
            (DVector<f64>, DMatrix<f64>),
            (DVector<f64>, DMatrix<f64>),
        ),
    > {
        (1usize..6).prop_flat_map(|n| (gaussian(n), gaussian(n)))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn distance_is_symmetric(((mu1, s1), (mu2, s2)) in pair()) {
            let ab = frechet_distance(&mu1, &s1, &mu2, &s2).unwrap();
            let ba = frechet_distance(&mu2, &s2, &mu1, &s1).unwrap();
            prop_assert!((ab - ba).abs() <= 1e-6 * (1.0 + ab.abs()));
        }

        #[test]
        fn distance_is_non_negative(((mu1, s1), (mu2, s2)) in pair()) {
            let d = frechet_distance(&mu1, &s1, &mu2, &s2).unwrap();
            prop_assert!(d >= 0.0);
        }

        #[test]
        fn self_distance_vanishes(((mu, sigma), _) in pair()) {
            let d = frechet_distance(&mu, &sigma, &mu, &sigma).unwrap();
            prop_assert!(d <= 1e-6 * (1.0 + sigma.trace()));
        }
    }
}
