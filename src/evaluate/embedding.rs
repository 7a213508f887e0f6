//! Molecule embeddings reduced to distribution statistics.
//!
//! The Fréchet metric only needs the mean and covariance of some embedding
//! of the generated molecules. [`EmbeddingStatEstimator`] is the seam for
//! plugging in a learned network; [`FingerprintEstimator`] is the built-in
//! estimator based on hashed circular atom environments.

use std::fmt;

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use super::stats::{DistributionStats, StatsError};
use crate::model::molecule::Molecule;
use crate::smiles::{self, parse_smiles};

/// Where embedding work runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Cpu,
    Accelerator,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Accelerator => write!(f, "accelerator"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddingConfig {
    pub device: Device,
    /// Length of each embedding vector.
    pub dimension: usize,
    /// Number of neighborhood expansion rounds per atom.
    pub radius: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            device: Device::Cpu,
            dimension: 512,
            radius: 2,
        }
    }
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding device '{0}' is not available for this estimator")]
    UnsupportedDevice(Device),

    #[error("embedding dimension must be positive")]
    ZeroDimension,

    #[error("at least 2 molecules are needed to estimate a covariance, got {0}")]
    InsufficientSamples(usize),

    #[error("cannot embed '{smiles}': {source}")]
    Molecule {
        smiles: String,
        #[source]
        source: smiles::Error,
    },

    #[error(transparent)]
    Stats(#[from] StatsError),
}

/// Maps a batch of molecules to the mean and covariance of their embeddings.
pub trait EmbeddingStatEstimator {
    fn estimate(&self, molecules: &[String]) -> Result<DistributionStats, EmbeddingError>;
}

/// Count vectors of hashed circular atom environments.
///
/// Every atom contributes one identifier per radius `0..=radius`; each
/// identifier increments the bin `id % dimension`.
#[derive(Debug, Clone)]
pub struct FingerprintEstimator {
    config: EmbeddingConfig,
}

impl FingerprintEstimator {
    pub fn new(config: EmbeddingConfig) -> Result<Self, EmbeddingError> {
        if config.device != Device::Cpu {
            return Err(EmbeddingError::UnsupportedDevice(config.device));
        }
        if config.dimension == 0 {
            return Err(EmbeddingError::ZeroDimension);
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// Embedding of a single SMILES string.
    pub fn embed(&self, smiles: &str) -> Result<DVector<f64>, EmbeddingError> {
        let molecule = parse_smiles(smiles).map_err(|source| EmbeddingError::Molecule {
            smiles: smiles.to_string(),
            source,
        })?;
        Ok(self.embed_molecule(&molecule))
    }

    fn embed_molecule(&self, mol: &Molecule) -> DVector<f64> {
        let dimension = self.config.dimension;
        let mut counts = DVector::zeros(dimension);

        let mut identifiers: Vec<u64> = mol
            .atoms
            .iter()
            .enumerate()
            .map(|(idx, atom)| {
                let mut h = FNV_OFFSET;
                h = fnv1a_update(h, u64::from(atom.element.atomic_number()));
                h = fnv1a_update(h, mol.degree(idx) as u64);
                h = fnv1a_update(h, u64::from(atom.hydrogens));
                h = fnv1a_update(h, atom.charge as u64);
                h = fnv1a_update(h, u64::from(atom.isotope.unwrap_or(0)));
                fnv1a_update(h, u64::from(atom.aromatic))
            })
            .collect();
        for &id in &identifiers {
            counts[fold(id, dimension)] += 1.0;
        }

        for _ in 0..self.config.radius {
            identifiers = (0..mol.atom_count())
                .map(|idx| {
                    let mut around: Vec<(u64, u8)> = mol
                        .neighbors(idx)
                        .iter()
                        .map(|nb| (identifiers[nb.atom], mol.bonds[nb.bond].order.code()))
                        .collect();
                    around.sort_unstable();

                    let mut h = fnv1a_update(FNV_OFFSET, identifiers[idx]);
                    for (id, order) in around {
                        h = fnv1a_update(h, id);
                        h = fnv1a_update(h, u64::from(order));
                    }
                    h
                })
                .collect();
            for &id in &identifiers {
                counts[fold(id, dimension)] += 1.0;
            }
        }

        counts
    }
}

impl EmbeddingStatEstimator for FingerprintEstimator {
    fn estimate(&self, molecules: &[String]) -> Result<DistributionStats, EmbeddingError> {
        let n = molecules.len();
        if n < 2 {
            return Err(EmbeddingError::InsufficientSamples(n));
        }

        let dimension = self.config.dimension;
        let mut rows = DMatrix::zeros(n, dimension);
        for (i, smiles) in molecules.iter().enumerate() {
            let embedding = self.embed(smiles)?;
            rows.set_row(i, &embedding.transpose());
        }

        let stats = sample_statistics(&rows)?;
        tracing::debug!(molecules = n, dimension, "estimated embedding statistics");
        Ok(stats)
    }
}

/// Column mean and unbiased (`n − 1`) covariance of the rows of `samples`.
pub fn sample_statistics(samples: &DMatrix<f64>) -> Result<DistributionStats, EmbeddingError> {
    let n = samples.nrows();
    if n < 2 {
        return Err(EmbeddingError::InsufficientSamples(n));
    }
    let mean_row = samples.row_mean();
    let mut centered = samples.clone();
    for mut row in centered.row_iter_mut() {
        row -= &mean_row;
    }
    let mean: DVector<f64> = mean_row.transpose();
    let covariance = centered.transpose() * &centered / (n as f64 - 1.0);
    Ok(DistributionStats::new(mean, covariance)?)
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a_update(hash: u64, value: u64) -> u64 {
    value.to_le_bytes().iter().fold(hash, |h, &b| {
        (h ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

#[inline]
fn fold(hash: u64, dimension: usize) -> usize {
    (hash % dimension as u64) as usize
}
