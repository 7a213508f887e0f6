use super::frechet::FrechetOptions;

/// Submission lines considered by default; later lines are ignored.
pub const DEFAULT_MAX_MOLECULES: usize = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationConfig {
    /// Cap on non-blank submission lines read, counted before validation.
    pub max_molecules: usize,
    pub frechet: FrechetOptions,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            max_molecules: DEFAULT_MAX_MOLECULES,
            frechet: FrechetOptions::default(),
        }
    }
}
