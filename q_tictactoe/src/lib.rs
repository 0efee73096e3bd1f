//! Tic-tac-toe with a tabular Q-learning self-play trainer.
//!
//! Two epsilon-greedy [`QPolicy`] players share one [`QTable`] and update it
//! with a one-step temporal-difference rule before every move. Cross
//! maximises the table's values and nought minimises them. The table can be
//! written to disk and loaded back to play against a human.

use crate::board::{Board, Outcome};
use crate::players::{ExternalPolicy, Mark, Player};
use crate::ui::{Frontend, TerminalMoves};
use log::info;
use std::path::Path;

pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod players;
pub mod q_table;
pub mod training;
pub mod ui;

pub use board::{Position, StateKey};
pub use config::TrainingConfig;
pub use error::{Error, Result};
pub use game::{Game, GameStatus};
pub use players::{MoveSource, Policy, QPolicy};
pub use q_table::{LearningRates, QTable};
pub use training::{Trainer, TrainingStats};

/// Two humans sharing one front-end. Returns `None` if they quit early.
pub fn play_two_humans<F: Frontend>(frontend: &mut F, partitions: usize) -> Result<Option<Outcome>> {
    config::check_partitions(partitions)?;
    // moves arrive through the front-end's pointer events, never through these
    let pointer_only = |_: &Board, _: Mark| -> Result<Position> {
        unreachable!("two-human games take their moves from pointer events")
    };
    let cross = Player::new(Mark::Cross, Box::new(ExternalPolicy::new("X", pointer_only)));
    let nought = Player::new(Mark::Nought, Box::new(ExternalPolicy::new("O", pointer_only)));
    let mut game = Game::with_board(cross, nought, Board::with_partitions(partitions))?;
    ui::run_interactive(frontend, &mut game, &mut QTable::new())
}

/// A human at the terminal (cross) against a greedy policy (nought) playing
/// from a saved table.
pub fn play_human_vs_agent<S: MoveSource + 'static>(human: S, q_table: &Path) -> Result<Outcome> {
    let mut q = q_table::q_table_from_disk(q_table)?;
    let cross = Player::new(Mark::Cross, Box::new(ExternalPolicy::new("human", human)));
    let nought = Player::new(Mark::Nought, Box::new(QPolicy::new("RLmin", 0.0)?));
    let mut game = Game::new(cross, nought)?;
    let outcome = game.play_episode(&mut q)?;
    println!("{}", game.board());
    match outcome {
        Outcome::Winner(Mark::Cross) => println!("Congratulations, you have won!"),
        Outcome::Winner(Mark::Nought) => println!("Really sorry, you have lost."),
        Outcome::Draw => println!("The game ended in a draw."),
    }
    info!("human vs agent: {outcome:?}");
    Ok(outcome)
}

/// [`play_human_vs_agent`] reading moves from stdin.
pub fn play_human_vs_agent_stdio(q_table: &Path) -> Result<Outcome> {
    play_human_vs_agent(TerminalMoves::stdio(), q_table)
}
