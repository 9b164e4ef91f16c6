use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use digit_network::{
    Cost, CrossEntropyCost, Network, QuadraticCost, Sigmoid,
    config::{CostKind, TrainingConfig},
    mnist::{self, MnistData},
};
use log::{debug, info};
use ndarray_rand::rand::{SeedableRng, rngs::StdRng};
use std::path::PathBuf;

/// Trains a feed-forward network to recognise MNIST handwritten digits.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON training configuration. Flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the MNIST IDX files (gzipped or raw).
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    #[arg(short, long)]
    epochs: Option<usize>,

    #[arg(short, long)]
    batch_size: Option<usize>,

    #[arg(short, long)]
    learning_rate: Option<f64>,

    #[arg(long)]
    cost: Option<CostArg>,

    /// Seed for initialisation and shuffling.
    #[arg(long)]
    seed: Option<u64>,

    /// Print this many training examples as ASCII art before training.
    #[arg(long, default_value_t = 0)]
    show: usize,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CostArg {
    Quadratic,
    CrossEntropy,
}

impl From<CostArg> for CostKind {
    fn from(value: CostArg) -> Self {
        match value {
            CostArg::Quadratic => CostKind::Quadratic,
            CostArg::CrossEntropy => CostKind::CrossEntropy,
        }
    }
}

fn load_config(args: &Args) -> Result<TrainingConfig> {
    let mut config = match &args.config {
        Some(path) => TrainingConfig::from_file(path)?,
        None => TrainingConfig::default(),
    };

    if let Some(data_dir) = &args.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(epochs) = args.epochs {
        config.epochs = epochs;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(learning_rate) = args.learning_rate {
        config.learning_rate = learning_rate;
    }
    if let Some(cost) = args.cost {
        config.cost = cost.into();
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    config.validate()?;
    Ok(config)
}

// Runs every epoch and reports accuracy on the test set (and validation set, if any) after each.
fn train<C: Cost>(
    config: &TrainingConfig,
    cost: C,
    mut data: MnistData,
    rng: &mut StdRng,
) -> Result<()> {
    let mut network =
        Network::with_functions(config.topology.clone(), config.init, Sigmoid, cost, rng)?;
    let batch_size = config.batch_size()?;

    for epoch in 1..=config.epochs {
        network.train(&mut data.training, batch_size, config.learning_rate, rng)?;

        let correct = network.evaluate(&data.test)?;
        info!("Epoch {epoch}: {correct} / {}", data.test.len());

        if !data.validation.is_empty() {
            let correct = network.evaluate(&data.validation)?;
            info!(
                "Epoch {epoch}: {correct} / {} on validation data",
                data.validation.len()
            );
        }
        debug!(
            "Epoch {epoch}: mean training cost {:.5}",
            network.total_cost(&data.training)?
        );
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;
    debug!("{config:?}");

    let data = MnistData::load(&config.data_dir, config.validation_size).with_context(|| {
        format!("could not load MNIST data from {}", config.data_dir.display())
    })?;

    let input_size = config.topology[0];
    if let Some(example) = data.training.first() {
        if example.input.len() != input_size {
            anyhow::bail!(
                "images have {} pixels but the input layer has {input_size} neurons",
                example.input.len()
            );
        }
    }

    for example in data.training.iter().take(args.show) {
        println!("{}\n", mnist::render_ascii(example, data.columns));
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!(
        "training {:?} for {} epochs, batch size {}, learning rate {}, {:?} cost",
        config.topology, config.epochs, config.batch_size, config.learning_rate, config.cost
    );
    match config.cost {
        CostKind::Quadratic => train(&config, QuadraticCost, data, &mut rng),
        CostKind::CrossEntropy => train(&config, CrossEntropyCost, data, &mut rng),
    }
}
