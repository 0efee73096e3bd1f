use crate::board::{Board, Outcome};
use crate::config::TrainingConfig;
use crate::error::Result;
use crate::game::Game;
use crate::players::{Mark, Player, QPolicy};
use crate::q_table::{self, QTable};
use chrono::{DateTime, Local};
use log::info;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct TrainingStats {
    pub episodes: usize,
    pub cross_wins: usize,
    pub nought_wins: usize,
    pub draws: usize,
    pub states: usize,
    pub final_epsilon: f32,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl TrainingStats {
    fn start(epsilon: f32) -> Self {
        let now = Local::now();
        TrainingStats {
            episodes: 0,
            cross_wins: 0,
            nought_wins: 0,
            draws: 0,
            states: 0,
            final_epsilon: epsilon,
            started_at: now,
            finished_at: now,
        }
    }

    fn record(&mut self, outcome: Outcome) {
        self.episodes += 1;
        match outcome {
            Outcome::Winner(Mark::Cross) => self.cross_wins += 1,
            Outcome::Winner(Mark::Nought) => self.nought_wins += 1,
            Outcome::Draw => self.draws += 1,
        }
    }
}

impl fmt::Display for TrainingStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let elapsed = self.finished_at - self.started_at;
        write!(
            f,
            "{} episodes in {} ms: X won {}, O won {}, {} draws; {} states, epsilon {:.2}",
            self.episodes,
            elapsed.num_milliseconds(),
            self.cross_wins,
            self.nought_wins,
            self.draws,
            self.states,
            self.final_epsilon
        )
    }
}

/// Self-play between two epsilon-greedy policies sharing one table.
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Trainer { config })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    fn policy(&self, name: &str, seed_offset: u64) -> Result<QPolicy> {
        match self.config.seed {
            Some(seed) => QPolicy::with_seed(name, self.config.epsilon, seed.wrapping_add(seed_offset)),
            None => QPolicy::new(name, self.config.epsilon),
        }
    }

    /// Runs every configured episode, accumulating into `q`.
    pub fn train(&self, q: &mut QTable) -> Result<TrainingStats> {
        let config = &self.config;
        let cross = Player::new(Mark::Cross, Box::new(self.policy("RLmax", 0)?));
        let nought = Player::new(Mark::Nought, Box::new(self.policy("RLmin", 1)?));
        let mut game = Game::with_board(cross, nought, Board::with_partitions(config.partitions))?
            .with_learning(config.rates());

        let mut epsilon = config.epsilon;
        let mut stats = TrainingStats::start(epsilon);
        info!(
            "training {} episodes: alpha {}, gamma {}, epsilon {}",
            config.episodes, config.alpha, config.gamma, config.epsilon
        );
        for episode in 0..config.episodes {
            if config.decay_every > 0
                && episode > 0
                && episode % config.decay_every == 0
                && epsilon > config.min_epsilon
            {
                epsilon = (epsilon - config.epsilon_decay).max(config.min_epsilon);
                for player in game.players_mut() {
                    player.set_exploration(epsilon);
                }
                info!("exploration rate is {epsilon:.2} after episode {episode}");
            }
            let outcome = game.play_episode(q)?;
            stats.record(outcome);
            game.reset();
            if config.log_every > 0 && (episode + 1) % config.log_every == 0 {
                info!(
                    "episode {}: X {} / O {} / draws {}, {} states, epsilon {:.2}",
                    episode + 1,
                    stats.cross_wins,
                    stats.nought_wins,
                    stats.draws,
                    q.len(),
                    epsilon
                );
            }
        }
        stats.states = q.len();
        stats.final_epsilon = epsilon;
        stats.finished_at = Local::now();
        info!("training finished: {stats}");
        Ok(stats)
    }

    /// Trains into a fresh table and writes it to the configured directory.
    pub fn train_and_save(&self) -> Result<(QTable, TrainingStats, Vec<PathBuf>)> {
        let mut q = QTable::new();
        let stats = self.train(&mut q)?;
        let paths = q_table::q_table_to_disk(&self.config.out_dir, self.config.episodes, &q)?;
        Ok((q, stats, paths))
    }
}
