use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use nalgebra::{DMatrix, DVector};
use ndarray::{Array, Array1, Array2, Dimension, OwnedRepr};
use ndarray_npy::{NpzReader, ReadNpyError, ReadNpzError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean and covariance of a batch of embeddings.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionStats {
    pub mean: DVector<f64>,
    pub covariance: DMatrix<f64>,
}

#[derive(Debug, Error)]
pub enum StatsError {
    #[error(transparent)]
    Io(#[from] crate::io::Error),

    #[error("invalid JSON statistics: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid NPZ statistics: {0}")]
    Npz(#[from] ReadNpzError),

    #[error("array '{0}' is missing from the archive")]
    MissingArray(&'static str),

    #[error("statistics are empty")]
    Empty,

    #[error("covariance has shape {rows}x{cols}, expected {n}x{n}")]
    Shape { rows: usize, cols: usize, n: usize },
}

/// On-disk JSON layout, `{"mu": [...], "sigma": [[...], ...]}`.
#[derive(Debug, Serialize, Deserialize)]
struct StatsFile {
    mu: Vec<f64>,
    sigma: Vec<Vec<f64>>,
}

impl DistributionStats {
    /// Builds statistics after checking that `covariance` is `n×n` for a
    /// mean of length `n > 0`.
    pub fn new(mean: DVector<f64>, covariance: DMatrix<f64>) -> Result<Self, StatsError> {
        let n = mean.len();
        if n == 0 {
            return Err(StatsError::Empty);
        }
        if covariance.shape() != (n, n) {
            return Err(StatsError::Shape {
                rows: covariance.nrows(),
                cols: covariance.ncols(),
                n,
            });
        }
        Ok(Self { mean, covariance })
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.mean.len()
    }

    /// Loads reference statistics, picking the format from the extension.
    ///
    /// `.npz` archives must hold arrays `mu` and `sigma`, as written by
    /// `numpy.savez`. Anything else is read as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StatsError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| crate::io::Error::read(path, e))?;

        let is_npz = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("npz"));

        let stats = if is_npz {
            Self::from_npz_reader(BufReader::new(file))?
        } else {
            Self::from_json_reader(BufReader::new(file))?
        };
        tracing::debug!(
            path = %path.display(),
            dimension = stats.dimension(),
            "loaded reference statistics"
        );
        Ok(stats)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, StatsError> {
        let file: StatsFile = serde_json::from_reader(reader)?;
        let n = file.mu.len();
        let rows = file.sigma.len();
        if let Some(row) = file.sigma.iter().find(|row| row.len() != n) {
            return Err(StatsError::Shape {
                rows,
                cols: row.len(),
                n,
            });
        }
        let covariance = if rows == 0 {
            DMatrix::zeros(0, n)
        } else {
            DMatrix::from_row_iterator(rows, n, file.sigma.into_iter().flatten())
        };
        Self::new(DVector::from_vec(file.mu), covariance)
    }

    pub fn from_npz_reader<R: Read + Seek>(reader: R) -> Result<Self, StatsError> {
        let mut npz = NpzReader::new(reader)?;
        let names = npz.names()?;
        let find = |wanted: &'static str| {
            names
                .iter()
                .find(|name| {
                    name.as_str() == wanted || name.strip_suffix(".npy") == Some(wanted)
                })
                .cloned()
                .ok_or(StatsError::MissingArray(wanted))
        };
        let mu_name = find("mu")?;
        let sigma_name = find("sigma")?;

        let mu: Array1<f64> = read_float_array(&mut npz, &mu_name)?;
        let sigma: Array2<f64> = read_float_array(&mut npz, &sigma_name)?;

        let (rows, cols) = sigma.dim();
        let covariance = DMatrix::from_row_iterator(rows, cols, sigma.iter().copied());
        Self::new(DVector::from_iterator(mu.len(), mu.iter().copied()), covariance)
    }

    /// Serializes to the JSON layout accepted by [`DistributionStats::load`].
    pub fn to_json(&self) -> Result<String, StatsError> {
        let file = StatsFile {
            mu: self.mean.iter().copied().collect(),
            sigma: self
                .covariance
                .row_iter()
                .map(|row| row.iter().copied().collect())
                .collect(),
        };
        Ok(serde_json::to_string(&file)?)
    }
}

/// Reads a `float64` array from the archive, widening `float32` data.
fn read_float_array<R, D>(npz: &mut NpzReader<R>, name: &str) -> Result<Array<f64, D>, StatsError>
where
    R: Read + Seek,
    D: Dimension,
{
    match npz.by_name::<OwnedRepr<f64>, D>(name) {
        Err(ReadNpzError::Npy(ReadNpyError::WrongDescriptor(_))) => {
            let narrow: Array<f32, D> = npz.by_name(name)?;
            Ok(narrow.mapv(f64::from))
        }
        other => Ok(other?),
    }
}
