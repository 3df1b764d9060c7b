use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, LogNormal, Normal};

use exprset::{io, MetadataRecord, MetadataValue};

/// Write a synthetic expression set: log-normal counts for a few tissues,
/// with a handful of values dropped as missing.
#[derive(Parser, Debug)]
#[command(name = "generate_sample", about)]
struct Cli {
    #[arg(long, default_value_t = 200)]
    features: usize,
    #[arg(long, default_value_t = 12)]
    samples: usize,
    /// Fraction of values left missing.
    #[arg(long, default_value_t = 0.01)]
    missing: f64,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Output path; the extension picks the format.
    #[arg(long, default_value = "sample_data.parquet")]
    output: PathBuf,
}

const TISSUES: [&str; 3] = ["liver", "brain", "heart"];
const OPERATORS: [&str; 2] = ["Alice", "Bob"];

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let mut rng = StdRng::seed_from_u64(cli.seed);

    // Per-feature baseline and per-tissue shift on the log scale.
    let baseline = Normal::new(5.0, 1.5).context("baseline distribution")?;
    let shift = Normal::new(0.0, 0.8).context("tissue shift distribution")?;
    let base: Vec<f64> = (0..cli.features).map(|_| baseline.sample(&mut rng)).collect();
    let shifts: Vec<Vec<f64>> = TISSUES
        .iter()
        .map(|_| (0..cli.features).map(|_| shift.sample(&mut rng)).collect())
        .collect();

    let tissue_of = |j: usize| j % TISSUES.len();
    let mut values = Array2::from_elem((cli.features, cli.samples), None);
    for ((i, j), cell) in values.indexed_iter_mut() {
        if rng.gen::<f64>() < cli.missing {
            continue;
        }
        let noise = LogNormal::new(base[i] + shifts[tissue_of(j)][i], 0.3)
            .context("expression distribution")?;
        *cell = Some(noise.sample(&mut rng).round());
    }

    let sample_names: Vec<String> = (1..=cli.samples).map(|j| format!("S{j}")).collect();
    let feature_names: Vec<String> = (1..=cli.features).map(|i| format!("GENE{i:05}")).collect();

    let experiment = MetadataRecord::builder()
        .name("Synthetic")
        .lab("exprset")
        .title("Synthetic tissue panel")
        .samples(sample_names.iter().map(|s| format!("{s}: synthetic sample")))
        .preprocessing(["rounded log-normal counts"])
        .other([("seed", cli.seed.to_string())])
        .build();

    // RNA integrity number, one decimal.
    let rin: Vec<MetadataValue> = (0..cli.samples)
        .map(|_| MetadataValue::Float((rng.gen_range(6.0..10.0f64) * 10.0).round() / 10.0))
        .collect();

    let set = exprset::ExpressionSet::builder(values, sample_names, feature_names)
        .sample_column("tissue", (0..cli.samples).map(|j| TISSUES[tissue_of(j)]))
        .sample_column("operator", (0..cli.samples).map(|j| OPERATORS[j % OPERATORS.len()]))
        .sample_column("rin", rin)
        .feature_column("length", (0..cli.features).map(|_| rng.gen_range(300..12_000i64)))
        .experiment_data(experiment)
        .annotation("synthetic")
        .build()
        .context("building expression set")?;

    io::save(&set, &cli.output).with_context(|| format!("writing {}", cli.output.display()))?;

    println!(
        "Wrote {} features x {} samples to {}",
        set.num_features(),
        set.num_samples(),
        cli.output.display()
    );
    Ok(())
}
