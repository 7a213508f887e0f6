use anyhow::{Context, Result};

use molscore::io::{read_submission, read_training_set};
use molscore::{
    DistributionStats, FingerprintEstimator, Metric, MetricCalculator, SmilesCanonicalizer,
};

use crate::cli::MetricArgs;
use crate::config::{build_embedding_config, build_evaluation_config};
use crate::display::{Context as DisplayContext, Progress, print_inputs, print_rate_breakdown};

pub fn run_metric(args: MetricArgs, ctx: DisplayContext) -> Result<()> {
    let metric = Metric::from(args.metric);
    let config = build_evaluation_config(&args);
    let embedding = build_embedding_config(&args.embedding);

    let total_steps = if metric == Metric::Fcd { 3 } else { 2 };
    let mut progress = Progress::new(ctx.interactive, total_steps);

    progress.step("Reading inputs");
    let training = read_training_set(&args.trainset).context("Failed to read training set")?;
    let submission = read_submission(&args.submission, config.max_molecules)
        .context("Failed to read submission")?;
    progress.complete_step(
        "Reading inputs",
        &[
            format!("{} training molecules", training.len()),
            format!(
                "{} submission lines (cap {})",
                submission.len(),
                config.max_molecules
            ),
        ],
    );

    if ctx.interactive {
        print_inputs(
            "Inputs",
            &[
                ("Training Set", args.trainset.display().to_string()),
                ("Submission", args.submission.display().to_string()),
                ("Metric", metric.to_string()),
            ],
        );
    }

    progress.step("Canonicalizing submission");
    let calc = MetricCalculator::new(training, &submission, &SmilesCanonicalizer)
        .context("Failed to score submission")?
        .with_frechet_options(config.frechet);
    let report = calc.report();
    progress.complete_step(
        "Canonicalizing submission",
        &[format!("{} of {} molecules valid", report.valid, report.total)],
    );

    if ctx.interactive {
        print_rate_breakdown(&report);
    }

    let estimator = FingerprintEstimator::new(embedding).context("Invalid embedding settings")?;
    let reference = if metric == Metric::Fcd {
        progress.step("Computing Fréchet distance");
        let stats = DistributionStats::load(&args.teststats).with_context(|| {
            format!(
                "Failed to load reference statistics from '{}'",
                args.teststats.display()
            )
        })?;
        Some(stats)
    } else {
        None
    };

    let value = calc
        .compute_with(metric, reference.as_ref(), &estimator)
        .with_context(|| format!("Failed to compute {metric}"))?;
    if let Some(reference) = &reference {
        progress.complete_step(
            "Computing Fréchet distance",
            &[
                format!("{}-dimensional embeddings", reference.dimension()),
                format!("{} molecules embedded", report.valid),
            ],
        );
    }

    progress.finish();

    println!("{}", metric_line(metric, value));
    Ok(())
}

/// The single line written to stdout.
fn metric_line(metric: Metric, value: f64) -> String {
    format!("The {metric} is: {value:.4}")
}
