//! Error type for submission scoring.

use thiserror::Error;

use super::embedding::EmbeddingError;
use super::frechet::FrechetError;
use super::stats::StatsError;

/// Errors raised while scoring a submission.
///
/// Invalid molecules are not errors; they only lower the rates.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] crate::io::Error),

    /// The submission had no non-blank line, so every rate would be `0/0`.
    #[error("submission contains no molecules")]
    EmptySubmission,

    #[error("FCD requires reference statistics")]
    MissingReference,

    #[error("failed to load reference statistics: {0}")]
    Stats(#[from] StatsError),

    #[error("failed to estimate embedding statistics: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Fréchet distance computation failed: {0}")]
    Frechet(#[from] FrechetError),
}
