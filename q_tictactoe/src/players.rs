use crate::board::{Board, Position};
use crate::error::{Error, Result};
use crate::q_table::QTable;
use log::warn;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

const MAX_ATTEMPTS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    Cross,
    Nought,
}

impl Mark {
    pub fn other(self) -> Self {
        match self {
            Self::Cross => Mark::Nought,
            Self::Nought => Mark::Cross,
        }
    }
    pub fn as_char(self) -> char {
        match self {
            Self::Cross => 'X',
            Self::Nought => 'O',
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl TryFrom<char> for Mark {
    type Error = Error;
    fn try_from(value: char) -> Result<Self> {
        match value {
            'X' => Ok(Mark::Cross),
            'O' => Ok(Mark::Nought),
            other => Err(Error::InvalidMark(other.to_string())),
        }
    }
}

impl FromStr for Mark {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Mark::try_from(c),
            _ => Err(Error::InvalidMark(s.to_owned())),
        }
    }
}

/// Chooses a move for `mark` on a board that still has empty cells.
pub trait Policy {
    fn name(&self) -> &str;
    fn decide(&mut self, board: &Board, mark: Mark, q: &mut QTable) -> Result<Position>;
    /// Exploration rate for the next decisions. Ignored by policies that
    /// never explore.
    fn set_exploration(&mut self, _epsilon: f32) {}
}

/// Where a human (or anything outside the core) supplies its moves.
pub trait MoveSource {
    fn next_move(&mut self, board: &Board, mark: Mark) -> Result<Position>;
}

impl<F> MoveSource for F
where
    F: FnMut(&Board, Mark) -> Result<Position>,
{
    fn next_move(&mut self, board: &Board, mark: Mark) -> Result<Position> {
        self(board, mark)
    }
}

/// Moves come from a [`MoveSource`]; anything that is not an available move
/// is refused and asked for again, up to three times.
pub struct ExternalPolicy<S> {
    name: String,
    source: S,
}

impl<S: MoveSource> ExternalPolicy<S> {
    pub fn new(name: impl Into<String>, source: S) -> Self {
        ExternalPolicy {
            name: name.into(),
            source,
        }
    }
}

impl<S> fmt::Debug for ExternalPolicy<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ExternalPolicy").field("name", &self.name).finish()
    }
}

impl<S: MoveSource> Policy for ExternalPolicy<S> {
    fn name(&self) -> &str {
        &self.name
    }
    fn decide(&mut self, board: &Board, mark: Mark, _q: &mut QTable) -> Result<Position> {
        let available = board.available_moves();
        assert!(!available.is_empty(), "asked for a move on a full board");
        let mut last = None;
        for _ in 0..MAX_ATTEMPTS {
            let mv = self.source.next_move(board, mark)?;
            if available.contains(&mv) {
                return Ok(mv);
            }
            warn!("{}: cell {:?} is taken or off the board", self.name, mv);
            last = Some(mv);
        }
        let (row, col) = last.unwrap_or_default();
        Err(Error::IllegalMove { row, col })
    }
}

/// Epsilon-greedy over the shared table: explores uniformly with probability
/// `epsilon`, otherwise maximises the stored value as cross and minimises it
/// as nought.
#[derive(Debug)]
pub struct QPolicy {
    name: String,
    epsilon: f32,
    rng: StdRng,
}

impl QPolicy {
    pub fn new(name: impl Into<String>, epsilon: f32) -> Result<Self> {
        Self::with_rng(name, epsilon, StdRng::from_entropy())
    }

    pub fn with_seed(name: impl Into<String>, epsilon: f32, seed: u64) -> Result<Self> {
        Self::with_rng(name, epsilon, StdRng::seed_from_u64(seed))
    }

    fn with_rng(name: impl Into<String>, epsilon: f32, rng: StdRng) -> Result<Self> {
        check_epsilon(epsilon)?;
        Ok(QPolicy {
            name: name.into(),
            epsilon,
            rng,
        })
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    fn random_move(&mut self, available: &[Position]) -> Position {
        available[self.rng.gen_range(0..available.len())]
    }
}

impl Policy for QPolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&mut self, board: &Board, mark: Mark, q: &mut QTable) -> Result<Position> {
        let available = board.available_moves();
        assert!(!available.is_empty(), "asked for a move on a full board");
        if self.rng.gen::<f32>() < self.epsilon {
            return Ok(self.random_move(&available));
        }
        let state_key = q.seed(board, mark);
        let greedy = q.get(&state_key).and_then(|moves| match mark {
            Mark::Cross => moves.select_max_move(&mut self.rng),
            Mark::Nought => moves.select_min_move(&mut self.rng),
        });
        match greedy {
            Some(mv) if available.contains(&mv) => Ok(mv),
            _ => {
                warn!("{}: no usable entry for {state_key}, moving at random", self.name);
                Ok(self.random_move(&available))
            }
        }
    }

    fn set_exploration(&mut self, epsilon: f32) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }
}

pub(crate) fn check_epsilon(epsilon: f32) -> Result<()> {
    if (0.0..=1.0).contains(&epsilon) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "epsilon must be in [0, 1], got {epsilon}"
        )))
    }
}

/// A mark together with the policy that plays it.
pub struct Player {
    mark: Mark,
    policy: Box<dyn Policy>,
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Player")
            .field("name", &self.policy.name())
            .field("mark", &self.mark)
            .finish()
    }
}

impl Player {
    pub fn new(mark: Mark, policy: Box<dyn Policy>) -> Self {
        Player { mark, policy }
    }

    /// Fails with [`Error::InvalidMark`] unless `symbol` is `X` or `O`.
    pub fn with_symbol(symbol: &str, policy: Box<dyn Policy>) -> Result<Self> {
        Ok(Player::new(symbol.parse()?, policy))
    }

    pub fn mark(&self) -> Mark {
        self.mark
    }

    pub fn name(&self) -> &str {
        self.policy.name()
    }

    pub fn choose_move(&mut self, board: &Board, q: &mut QTable) -> Result<Position> {
        self.policy.decide(board, self.mark, q)
    }

    pub fn set_exploration(&mut self, epsilon: f32) {
        self.policy.set_exploration(epsilon);
    }
}
