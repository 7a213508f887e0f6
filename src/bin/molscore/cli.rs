use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use molscore::DEFAULT_MAX_MOLECULES;

#[derive(Parser)]
#[command(
    name = "molscore",
    about = "Scoring for generated molecules and predicted reactants",
    version,
    author,
    before_help = crate::display::banner_for_help(),
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Score a generated molecule set (validity, uniqueness, novelty, FCD)
    #[command(visible_alias = "m")]
    Metric(MetricArgs),

    /// Top-1 exact-match accuracy of predicted reactant sets
    #[command(visible_alias = "t")]
    Top1(Top1Args),
}

/// Output options shared by all commands.
#[derive(Args)]
pub struct OutputOptions {
    /// Suppress progress output (for scripting)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Embedding options used by the FCD metric.
#[derive(Args)]
#[command(next_help_heading = "Embedding Options")]
pub struct EmbeddingOptions {
    /// Device the embedding estimator runs on
    #[arg(long, value_name = "DEVICE", default_value = "cpu")]
    pub device: DeviceArg,

    /// Length of each molecule embedding
    #[arg(long = "embedding-dim", value_name = "N", default_value = "512")]
    pub dimension: usize,

    /// Neighborhood expansion rounds per atom
    #[arg(long = "embedding-radius", value_name = "R", default_value = "2")]
    pub radius: usize,
}

/// Fréchet distance tolerances (advanced tuning).
#[derive(Args)]
#[command(next_help_heading = "Fréchet Options")]
pub struct FrechetArgs {
    /// Relative eigenvalue tolerance, scaled by the largest eigenvalue
    #[arg(long = "frechet-rel-tol", value_name = "TOL", default_value = "1e-9")]
    pub rel_tol: f64,

    /// Absolute eigenvalue tolerance
    #[arg(long = "frechet-abs-tol", value_name = "TOL", default_value = "1e-10")]
    pub abs_tol: f64,
}

#[derive(Args)]
pub struct MetricArgs {
    /// Training set, one SMILES per line
    #[arg(long, value_name = "FILE")]
    pub trainset: PathBuf,

    /// Generated molecules, one SMILES per line
    #[arg(long, value_name = "FILE")]
    pub submission: PathBuf,

    /// Reference embedding statistics (.npz with mu/sigma, or JSON)
    #[arg(long, value_name = "FILE")]
    pub teststats: PathBuf,

    /// Metric to report
    #[arg(long, value_name = "METRIC")]
    pub metric: MetricArg,

    /// Submission lines considered; later lines are ignored
    #[arg(long = "max-molecules", value_name = "N", default_value_t = DEFAULT_MAX_MOLECULES)]
    pub max_molecules: usize,

    #[command(flatten)]
    pub embedding: EmbeddingOptions,

    #[command(flatten)]
    pub frechet: FrechetArgs,

    #[command(flatten)]
    pub output: OutputOptions,
}

#[derive(Args)]
pub struct Top1Args {
    /// Predicted reactants, one `.`-joined set per line
    #[arg(long, value_name = "FILE")]
    pub submission: PathBuf,

    /// True reactants, line-aligned with the predictions
    #[arg(long, value_name = "FILE")]
    pub target: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputOptions,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum MetricArg {
    /// Fraction of lines that parse as molecules
    Validity,
    /// Fraction of lines that are distinct valid molecules
    Uniqueness,
    /// Fraction of lines that are distinct valid molecules absent from training
    Novelty,
    /// Fréchet distance to the reference statistics
    Fcd,
}

#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum DeviceArg {
    #[default]
    Cpu,
    Accelerator,
}

pub fn parse() -> Cli {
    Cli::parse()
}
