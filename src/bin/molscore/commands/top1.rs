use std::path::Path;

use anyhow::{Context, Result, anyhow};

use molscore::io::read_raw_lines;
use molscore::{SmilesCanonicalizer, top_one_accuracy};

use crate::cli::Top1Args;
use crate::display::{Context as DisplayContext, Progress, print_inputs, print_top1_summary};
use crate::util::text::float_repr;

const TOTAL_STEPS: u8 = 2;

pub fn run_top1(args: Top1Args, ctx: DisplayContext) -> Result<()> {
    let target = require_target(&args)?;

    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.step("Reading predictions and targets");
    let predictions = read_raw_lines(&args.submission).context("Failed to read predictions")?;
    let targets = read_raw_lines(target).context("Failed to read targets")?;
    progress.complete_step(
        "Reading predictions and targets",
        &[
            format!("{} prediction lines", predictions.len()),
            format!("{} target lines", targets.len()),
        ],
    );

    if ctx.interactive {
        print_inputs(
            "Inputs",
            &[
                ("Predictions", args.submission.display().to_string()),
                ("Targets", target.display().to_string()),
            ],
        );
    }

    progress.step("Comparing canonical reactant sets");
    let report = top_one_accuracy(&predictions, &targets, &SmilesCanonicalizer)
        .context("Failed to score predictions")?;
    progress.complete_step(
        "Comparing canonical reactant sets",
        &[format!(
            "{} of {} rows matched",
            report.correct, report.scored
        )],
    );

    if ctx.interactive {
        print_top1_summary(&report);
    }

    progress.finish();

    println!("{}", accuracy_line(report.accuracy));
    Ok(())
}

fn require_target(args: &Top1Args) -> Result<&Path> {
    args.target.as_deref().ok_or_else(|| {
        anyhow!("No target file specified.\n\nUsage: molscore top1 --submission <FILE> --target <FILE>")
    })
}

/// The single line written to stdout: the bare accuracy.
fn accuracy_line(accuracy: f64) -> String {
    float_repr(accuracy)
}
