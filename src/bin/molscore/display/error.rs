use std::io::{self, Write};

use anyhow::Error;

use crate::util::text::wrap;

#[rustfmt::skip]
pub fn print_error(err: &Error) {
    let mut stderr = io::stderr().lock();

    let _ = writeln!(stderr);
    let _ = writeln!(stderr, "   ╔══════════════════════════════════════════════════════════════╗");
    let _ = writeln!(stderr, "   ║  ✗ Error                                                     ║");
    let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");

    for line in wrap(&err.to_string(), 59) {
        let _ = writeln!(stderr, "   ║  {:<59} ║", line);
    }

    for cause in err.chain().skip(1) {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Caused by:                                                  ║");
        for line in wrap(&cause.to_string(), 57) {
            let _ = writeln!(stderr, "   ║    {:<57} ║", line);
        }
    }

    if let Some(hints) = HintCollector::collect(err) {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Hints:                                                      ║");
        for hint in hints {
            let wrapped = wrap(&hint, 55);
            if let Some((first, rest)) = wrapped.split_first() {
                let _ = writeln!(stderr, "   ║    • {:<55} ║", first);
                for line in rest {
                    let _ = writeln!(stderr, "   ║      {:<55} ║", line);
                }
            }
        }
    }

    let _ = writeln!(stderr, "   ╚══════════════════════════════════════════════════════════════╝");
    let _ = writeln!(stderr);
}

struct HintCollector {
    hints: Vec<String>,
    has_typed_hints: bool,
}

impl HintCollector {
    fn new() -> Self {
        Self {
            hints: Vec::new(),
            has_typed_hints: false,
        }
    }

    fn collect(err: &Error) -> Option<Vec<String>> {
        let mut collector = Self::new();

        for cause in err.chain() {
            collector.collect_typed(cause);
            if collector.has_typed_hints {
                break;
            }
        }

        if !collector.has_typed_hints {
            collector.collect_fallback_hints(err);
        }

        if collector.hints.is_empty() {
            None
        } else {
            Some(collector.hints)
        }
    }

    fn add(&mut self, hint: impl Into<String>) {
        self.hints.push(hint.into());
    }

    fn mark_typed(&mut self) {
        self.has_typed_hints = true;
    }

    fn collect_typed(&mut self, cause: &(dyn std::error::Error + 'static)) {
        use molscore::{EvaluateError, ReactionError, StatsError};

        if let Some(e) = cause.downcast_ref::<EvaluateError>() {
            self.collect_evaluate_hints(e);
        } else if let Some(e) = cause.downcast_ref::<ReactionError>() {
            self.collect_reaction_hints(e);
        } else if let Some(e) = cause.downcast_ref::<StatsError>() {
            self.collect_stats_hints(e);
        } else if let Some(e) = cause.downcast_ref::<molscore::io::Error>() {
            self.collect_io_hints(e);
        }
    }

    fn collect_io_hints(&mut self, err: &molscore::io::Error) {
        use molscore::io::Error as IoError;

        self.mark_typed();

        match err {
            IoError::Read { path, source } => {
                self.add(format!("Could not read '{}'", path.display()));
                self.collect_std_io_hints(source);
            }
            IoError::Io { source } => self.collect_std_io_hints(source),
        }
    }

    fn collect_std_io_hints(&mut self, source: &std::io::Error) {
        use std::io::ErrorKind;

        match source.kind() {
            ErrorKind::NotFound => {
                self.add("File or directory not found");
                self.add("Check the path spelling and ensure the file exists");
            }

            ErrorKind::PermissionDenied => {
                self.add("Permission denied accessing the file");
                self.add("Check file permissions with `ls -la`");
            }

            ErrorKind::InvalidData => {
                self.add("File is not valid UTF-8 text");
                self.add("Input files must hold one SMILES string per line");
            }

            ErrorKind::IsADirectory => {
                self.add("The path points to a directory, not a file");
            }

            _ => {
                self.add("I/O operation failed");
                self.add("Check file path and permissions");
            }
        }
    }

    fn collect_evaluate_hints(&mut self, err: &molscore::EvaluateError) {
        use molscore::{EmbeddingError, EvaluateError, FrechetError};

        match err {
            EvaluateError::Io(e) => self.collect_io_hints(e),

            EvaluateError::EmptySubmission => {
                self.mark_typed();
                self.add("The submission file has no non-blank lines");
                self.add("Check that --submission points at the generated molecules");
                self.add("A --max-molecules of 0 also leaves nothing to score");
            }

            EvaluateError::MissingReference => {
                self.mark_typed();
                self.add("Pass the reference statistics with --teststats <FILE>");
            }

            EvaluateError::Stats(e) => self.collect_stats_hints(e),

            EvaluateError::Embedding(e) => {
                self.mark_typed();
                match e {
                    EmbeddingError::UnsupportedDevice(device) => {
                        self.add(format!("The built-in embedder cannot run on '{device}'"));
                        self.add("Use --device cpu");
                    }
                    EmbeddingError::ZeroDimension => {
                        self.add("Pass a positive --embedding-dim");
                    }
                    EmbeddingError::InsufficientSamples(n) => {
                        self.add(format!("Only {n} valid molecule(s) in the submission"));
                        self.add("FCD needs at least 2 valid molecules to estimate a covariance");
                    }
                    EmbeddingError::Molecule { smiles, .. } => {
                        self.add(format!("Molecule '{smiles}' could not be embedded"));
                        self.add("This may indicate a bug; please report if reproducible");
                    }
                    EmbeddingError::Stats(e) => self.collect_stats_hints(e),
                }
            }

            EvaluateError::Frechet(e) => {
                self.mark_typed();
                match e {
                    FrechetError::DimensionMismatch { .. } => {
                        self.add("Reference statistics and embeddings differ in dimension");
                        self.add("Set --embedding-dim to the length of the reference mean");
                    }
                    FrechetError::NotPositiveSemiDefinite { .. } => {
                        self.add("A covariance matrix has a clearly negative eigenvalue");
                        self.add("Regenerate the reference statistics or loosen --frechet-rel-tol");
                    }
                    FrechetError::NonFinite(_) => {
                        self.add("Statistics contain NaN or infinite values");
                    }
                    FrechetError::Empty => {
                        self.add("Statistics have zero dimensions");
                    }
                }
            }
        }
    }

    fn collect_stats_hints(&mut self, err: &molscore::StatsError) {
        use molscore::StatsError;

        if let StatsError::Io(e) = err {
            self.collect_io_hints(e);
            return;
        }

        self.mark_typed();
        self.add("Reference statistics could not be loaded");
        match err {
            StatsError::Npz(_) | StatsError::MissingArray(_) => {
                self.add("NPZ archives must contain float arrays 'mu' and 'sigma'");
                self.add("Create one with numpy.savez(path, mu=mu, sigma=sigma)");
            }
            StatsError::Json(_) => {
                self.add(r#"JSON statistics must look like {"mu": [...], "sigma": [[...]]}"#);
                self.add("Use a .npz extension for NumPy archives");
            }
            StatsError::Shape { .. } | StatsError::Empty => {
                self.add("'sigma' must be a square matrix matching the length of 'mu'");
            }
            StatsError::Io(_) => {}
        }
    }

    fn collect_reaction_hints(&mut self, err: &molscore::ReactionError) {
        use molscore::ReactionError;

        match err {
            ReactionError::Io(e) => self.collect_io_hints(e),

            ReactionError::LengthMismatch { .. } => {
                self.mark_typed();
                self.add("Predictions and targets must be line-aligned");
                self.add("Check for a missing trailing row or an extra header line");
            }

            ReactionError::NoScoredRows => {
                self.mark_typed();
                self.add("Every target line is blank");
                self.add("Check that --target points at the true reactants");
            }
        }
    }

    fn collect_fallback_hints(&mut self, err: &Error) {
        let msg = error_chain_text(err);

        if msg.contains("--target") {
            self.add("Pass the true reactants with --target <FILE>");
            return;
        }

        if msg.contains("no such file") || msg.contains("not found") {
            self.add("Check that the file path is correct");
            self.add("Verify the file exists and is readable");
            return;
        }

        if msg.contains("permission denied") {
            self.add("Check file permissions with `ls -la`");
        }
    }
}

fn error_chain_text(err: &Error) -> String {
    err.chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase()
}
