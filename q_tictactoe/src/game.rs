use crate::board::{Board, Outcome, Position};
use crate::error::{Error, Result};
use crate::players::{Mark, Player};
use crate::q_table::{LearningRates, QTable};
use log::{debug, warn};
use std::mem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Ended(Outcome),
}

/// Turn order and end detection for one board. Cross always opens; with
/// learning switched on every move updates the table before it is placed.
#[derive(Debug)]
pub struct Game {
    board: Board,
    current_player: Player,
    other_player: Player,
    status: GameStatus,
    learning: Option<LearningRates>,
}

impl Game {
    pub fn new(player1: Player, player2: Player) -> Result<Self> {
        Self::with_board(player1, player2, Board::new())
    }

    pub fn with_board(player1: Player, player2: Player, board: Board) -> Result<Self> {
        if player1.mark() == player2.mark() {
            return Err(Error::MarksNotComplementary);
        }
        let mut game = Game {
            board,
            current_player: player1,
            other_player: player2,
            status: GameStatus::InProgress,
            learning: None,
        };
        game.reset();
        Ok(game)
    }

    pub fn with_learning(mut self, rates: LearningRates) -> Self {
        self.learning = Some(rates);
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn current_player(&self) -> &Player {
        &self.current_player
    }

    pub fn is_learning(&self) -> bool {
        self.learning.is_some()
    }

    pub fn players_mut(&mut self) -> [&mut Player; 2] {
        [&mut self.current_player, &mut self.other_player]
    }

    pub fn swap_players(&mut self) {
        mem::swap(&mut self.current_player, &mut self.other_player);
    }

    /// Empty board, game back in progress, cross to move.
    pub fn reset(&mut self) {
        self.board.reset();
        self.status = GameStatus::InProgress;
        if self.current_player.mark() != Mark::Cross {
            self.swap_players();
        }
    }

    /// Plays `mv` for the player to move. Occupied or off-board cells give
    /// [`Error::IllegalMove`] and a finished game gives [`Error::GameOver`];
    /// neither changes any state.
    pub fn play_move(&mut self, mv: Position, q: &mut QTable) -> Result<GameStatus> {
        if let GameStatus::Ended(_) = self.status {
            return Err(Error::GameOver);
        }
        let (row, col) = mv;
        let n = self.board.partitions();
        if row >= n || col >= n || self.board.get(mv).is_some() {
            warn!("{} tried cell ({row}, {col}), ignoring", self.current_player.name());
            return Err(Error::IllegalMove { row, col });
        }
        let mark = self.current_player.mark();
        if let Some(rates) = self.learning {
            q.update_q_table(&self.board, mark, mv, rates)?;
        }
        self.board.apply_move(mv, mark)?;
        match self.board.outcome() {
            Some(outcome) => {
                debug!("game over: {outcome:?}");
                self.status = GameStatus::Ended(outcome);
            }
            None => self.swap_players(),
        }
        Ok(self.status)
    }

    /// Asks the player to move for a move and plays it.
    ///
    /// # Panics
    /// If the game has already ended.
    pub fn step(&mut self, q: &mut QTable) -> Result<GameStatus> {
        assert_eq!(
            self.status,
            GameStatus::InProgress,
            "step called on a finished game"
        );
        let mv = self.current_player.choose_move(&self.board, q)?;
        debug!(
            "{} ({}) plays {:?}",
            self.current_player.name(),
            self.current_player.mark(),
            mv
        );
        self.play_move(mv, q)
    }

    /// Steps until the game ends.
    pub fn play_episode(&mut self, q: &mut QTable) -> Result<Outcome> {
        loop {
            if let GameStatus::Ended(outcome) = self.step(q)? {
                return Ok(outcome);
            }
        }
    }
}
