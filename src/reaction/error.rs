use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] crate::io::Error),

    #[error(
        "prediction and target files differ in length: {predictions} predictions, {targets} targets"
    )]
    LengthMismatch { predictions: usize, targets: usize },

    /// Every target row was blank, so accuracy is undefined.
    #[error("no rows left to score after dropping blank targets")]
    NoScoredRows,
}
