use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use q_tictactoe::board::DEFAULT_PARTITIONS;
use q_tictactoe::ui::TerminalFrontend;

/// Play tic-tac-toe at the terminal.
#[derive(Parser)]
#[command(name = "play", about = "Play tic-tac-toe: two humans, or a human against a trained table")]
struct Cli {
    /// Saved Q-table (.pickle or .json); nought is then played by the table
    #[arg(long)]
    q_table: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.q_table {
        Some(path) => {
            q_tictactoe::play_human_vs_agent_stdio(&path)
                .with_context(|| format!("playing against {}", path.display()))?;
        }
        None => {
            let mut frontend = TerminalFrontend::stdio(DEFAULT_PARTITIONS);
            let outcome = q_tictactoe::play_two_humans(&mut frontend, DEFAULT_PARTITIONS)
                .context("interactive game failed")?;
            info!("session over: {outcome:?}");
        }
    }
    Ok(())
}
