use std::io::Write;
use std::path::PathBuf;

use molscore::{
    DistributionStats, EmbeddingConfig, EvaluateError, EvaluationConfig, FingerprintEstimator,
    Metric, MetricCalculator, ReactionError, top_one_accuracy_from_files,
};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn rate_metrics_from_files() {
    let dir = TempDir::new().unwrap();
    let train = write(&dir, "train.txt", "CCO\n");
    let submission = write(&dir, "submission.txt", "CCO\nCCO\ninvalid_smiles\nCCN\n");
    let stats = dir.path().join("never_opened.npz");

    let calc = MetricCalculator::from_files(&train, &submission, &EvaluationConfig::default())
        .unwrap();
    let estimator = FingerprintEstimator::new(EmbeddingConfig::default()).unwrap();

    let value = |metric| calc.compute(metric, &stats, &estimator).unwrap();
    assert_eq!(value(Metric::Validity), 0.75);
    assert_eq!(value(Metric::Uniqueness), 0.50);
    assert_eq!(value(Metric::Novelty), 0.25);
}

#[test]
fn submission_cap_counts_invalid_lines() {
    let dir = TempDir::new().unwrap();
    let train = write(&dir, "train.txt", "");
    let submission = write(&dir, "submission.txt", "xx\n\nCCO\nCCN\nCCC\n");
    let config = EvaluationConfig {
        max_molecules: 2,
        ..EvaluationConfig::default()
    };

    let report = MetricCalculator::from_files(&train, &submission, &config)
        .unwrap()
        .report();
    assert_eq!(report.total, 2);
    assert_eq!(report.valid, 1);
    assert_eq!(report.validity(), 0.5);
}

#[test]
fn fcd_against_own_statistics_is_near_zero() {
    let dir = TempDir::new().unwrap();
    let molecules = ["CCO", "CCN", "c1ccccc1", "CC(=O)O", "CCCl", "OC1CCCCC1"];
    let train = write(&dir, "train.txt", "C\n");
    let submission = write(&dir, "submission.txt", &molecules.join("\n"));

    let estimator = FingerprintEstimator::new(EmbeddingConfig {
        dimension: 32,
        ..EmbeddingConfig::default()
    })
    .unwrap();
    let calc = MetricCalculator::from_files(&train, &submission, &EvaluationConfig::default())
        .unwrap();

    let reference = molscore::EmbeddingStatEstimator::estimate(&estimator, calc.valid_molecules())
        .unwrap();
    let stats = write(&dir, "stats.json", &reference.to_json().unwrap());
    assert_eq!(DistributionStats::load(&stats).unwrap().dimension(), 32);

    let fcd = calc.compute(Metric::Fcd, &stats, &estimator).unwrap();
    assert!(fcd.abs() < 1e-4, "fcd = {fcd}");
}

#[test]
fn empty_submission_is_rejected() {
    let dir = TempDir::new().unwrap();
    let train = write(&dir, "train.txt", "CCO\n");
    let submission = write(&dir, "submission.txt", "\n   \n");
    assert!(matches!(
        MetricCalculator::from_files(&train, &submission, &EvaluationConfig::default()),
        Err(EvaluateError::EmptySubmission)
    ));
}

#[test]
fn top_one_accuracy_from_files_drops_blank_targets() {
    let dir = TempDir::new().unwrap();
    let predictions = write(&dir, "pred.txt", "CCO.CCN\nCCBr\n");
    let targets = write(&dir, "truth.txt", "CCN.CCO\n\n");

    let report = top_one_accuracy_from_files(&predictions, &targets).unwrap();
    assert_eq!(report.accuracy, 1.0);
    assert_eq!(report.scored, 1);
    assert_eq!(report.dropped, 1);
}

#[test]
fn top_one_length_mismatch() {
    let dir = TempDir::new().unwrap();
    let predictions = write(&dir, "pred.txt", "CCO\nCCN\nCCC\n");
    let targets = write(&dir, "truth.txt", "CCO\nCCN\n");

    assert!(matches!(
        top_one_accuracy_from_files(&predictions, &targets),
        Err(ReactionError::LengthMismatch {
            predictions: 3,
            targets: 2
        })
    ));
}

#[test]
fn missing_file_reports_its_path() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.txt");
    let targets = write(&dir, "truth.txt", "CCO\n");

    let err = top_one_accuracy_from_files(&missing, &targets).unwrap_err();
    assert!(err.to_string().contains("absent.txt"), "{err}");
}
