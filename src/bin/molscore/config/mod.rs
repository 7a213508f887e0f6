use molscore::{Device, EmbeddingConfig, EvaluationConfig, FrechetOptions, Metric};

use crate::cli::{DeviceArg, EmbeddingOptions, FrechetArgs, MetricArg, MetricArgs};

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Validity => Metric::Validity,
            MetricArg::Uniqueness => Metric::Uniqueness,
            MetricArg::Novelty => Metric::Novelty,
            MetricArg::Fcd => Metric::Fcd,
        }
    }
}

impl From<DeviceArg> for Device {
    fn from(arg: DeviceArg) -> Self {
        match arg {
            DeviceArg::Cpu => Device::Cpu,
            DeviceArg::Accelerator => Device::Accelerator,
        }
    }
}

pub fn build_evaluation_config(args: &MetricArgs) -> EvaluationConfig {
    EvaluationConfig {
        max_molecules: args.max_molecules,
        frechet: build_frechet_options(&args.frechet),
    }
}

pub fn build_frechet_options(opts: &FrechetArgs) -> FrechetOptions {
    FrechetOptions {
        rel_tol: opts.rel_tol,
        abs_tol: opts.abs_tol,
    }
}

pub fn build_embedding_config(opts: &EmbeddingOptions) -> EmbeddingConfig {
    EmbeddingConfig {
        device: opts.device.into(),
        dimension: opts.dimension,
        radius: opts.radius,
    }
}
