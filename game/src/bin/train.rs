use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use q_tictactoe::{Trainer, TrainingConfig};

/// Train the shared Q-table by self-play and write it to disk.
#[derive(Parser)]
#[command(name = "train", about = "Train a tic-tac-toe Q-table by self-play")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "train.toml")]
    config: PathBuf,

    /// Override number of training episodes
    #[arg(long)]
    episodes: Option<usize>,

    /// Override learning rate
    #[arg(long)]
    alpha: Option<f32>,

    /// Override discount
    #[arg(long)]
    gamma: Option<f32>,

    /// Override exploration rate
    #[arg(long)]
    epsilon: Option<f32>,

    /// Directory the pickle and JSON tables are written to
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Seed both players' random generators
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = TrainingConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(episodes) = cli.episodes {
        config.episodes = episodes;
    }
    if let Some(alpha) = cli.alpha {
        config.alpha = alpha;
    }
    if let Some(gamma) = cli.gamma {
        config.gamma = gamma;
    }
    if let Some(epsilon) = cli.epsilon {
        config.epsilon = epsilon;
    }
    if let Some(out_dir) = cli.out_dir {
        config.out_dir = out_dir;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let trainer = Trainer::new(config).context("invalid training configuration")?;
    let (_q, stats, paths) = trainer.train_and_save().context("training failed")?;
    println!("{stats}");
    for path in paths {
        info!("wrote {}", path.display());
    }
    Ok(())
}
