use crate::board::{Board, Position, StateKey};
use crate::error::Result;
use crate::players::Mark;
use itertools::Itertools;
use log::{debug, info};
use rand::{prelude::SliceRandom, Rng};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::{fmt, marker::PhantomData};

/// Value given to every move of a state on its first visit. Optimistic, so
/// unexplored moves look attractive to the greedy policy.
pub const DEFAULT_Q_VALUE: f32 = 1.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Moves {
    moves: HashMap<Position, f32>,
}

/// StateKey -> move -> estimated value. Entries are only ever added or
/// updated in place, never removed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QTable {
    qtable: HashMap<StateKey, Moves>,
}

/// Step size and discount of the temporal-difference update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LearningRates {
    pub alpha: f32,
    pub gamma: f32,
}

impl Deref for Moves {
    type Target = HashMap<Position, f32>;
    fn deref(&self) -> &Self::Target {
        &self.moves
    }
}

impl Deref for QTable {
    type Target = HashMap<StateKey, Moves>;
    fn deref(&self) -> &Self::Target {
        &self.qtable
    }
}

impl Moves {
    pub fn seeded(available: Vec<Position>) -> Moves {
        let moves = available
            .into_iter()
            .map(|mv| (mv, DEFAULT_Q_VALUE))
            .collect();
        Moves { moves }
    }

    pub fn max_value(&self) -> Option<f32> {
        self.values().copied().max_by(f32::total_cmp)
    }

    pub fn min_value(&self) -> Option<f32> {
        self.values().copied().min_by(f32::total_cmp)
    }

    /// A move with the highest value, ties broken uniformly at random.
    pub fn select_max_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        let mut best = self
            .iter()
            .max_set_by(|(_, value1), (_, value2)| value1.total_cmp(value2))
            .into_iter()
            .map(|(mv, _)| *mv)
            .collect::<Vec<Position>>();
        best.sort_unstable();
        best.choose(rng).copied()
    }

    /// A move with the lowest value, ties broken uniformly at random.
    pub fn select_min_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        let mut best = self
            .iter()
            .min_set_by(|(_, value1), (_, value2)| value1.total_cmp(value2))
            .into_iter()
            .map(|(mv, _)| *mv)
            .collect::<Vec<Position>>();
        best.sort_unstable();
        best.choose(rng).copied()
    }
}

impl QTable {
    pub fn new() -> Self {
        QTable {
            qtable: HashMap::with_capacity(11000),
        }
    }

    /// Adds an entry for `(board, mark)` with every available move at
    /// [`DEFAULT_Q_VALUE`] unless one already exists. Returns the key.
    pub fn seed(&mut self, board: &Board, mark: Mark) -> StateKey {
        let key = board.state_key(mark);
        self.qtable
            .entry(key.clone())
            .or_insert_with(|| Moves::seeded(board.available_moves()));
        key
    }

    pub fn value(&self, key: &StateKey, mv: Position) -> Option<f32> {
        self.get(key).and_then(|moves| moves.get(&mv).copied())
    }

    /// One-step temporal-difference update for `mover` playing `mv` on
    /// `board`, called before the move reaches the live board. The target
    /// bootstraps off the opponent's entry: its minimum when cross moved, its
    /// maximum when nought moved. Returns the change applied.
    pub fn update_q_table(
        &mut self,
        board: &Board,
        mover: Mark,
        mv: Position,
        rates: LearningRates,
    ) -> Result<f32> {
        let state_key = self.seed(board, mover);
        let next_board = board.clone_with_move(mv, mover)?;
        let reward = next_board.reward();
        let expected = if next_board.is_terminal() {
            reward
        } else {
            let next_key = self.seed(&next_board, mover.other());
            let next_moves = &self.qtable[&next_key];
            let bootstrap = match mover {
                Mark::Cross => next_moves.min_value(),
                Mark::Nought => next_moves.max_value(),
            }
            .unwrap_or(0.0);
            reward + rates.gamma * bootstrap
        };
        let value = self
            .qtable
            .entry(state_key.clone())
            .or_insert_with(|| Moves::seeded(board.available_moves()))
            .moves
            .entry(mv)
            .or_insert(DEFAULT_Q_VALUE);
        let delta = rates.alpha * (expected - *value);
        *value += delta;
        debug!("update {state_key} {mv:?}: expected {expected:.4}, delta {delta:.4}");
        Ok(delta)
    }
}

impl Serialize for Moves {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.moves.len()))?;
        for (k, v) in self.moves.iter().sorted_by_key(|(k, _)| **k) {
            let key_str = format!("({}, {})", k.0, k.1);
            map.serialize_entry(&key_str, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Moves {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Moves, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MovesVisitor {
            marker: PhantomData<fn() -> Moves>,
        }
        impl<'de> Visitor<'de> for MovesVisitor {
            type Value = Moves;
            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map from \"(row, col)\" to a move value")
            }
            fn visit_map<M>(self, mut access: M) -> std::result::Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut moves = HashMap::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, f32>()? {
                    let mv = parse_position(&key)
                        .ok_or_else(|| {
                            <M::Error as de::Error>::custom(format!("malformed move key {key:?}"))
                        })?;
                    moves.insert(mv, value);
                }
                Ok(Moves { moves })
            }
        }
        deserializer.deserialize_map(MovesVisitor {
            marker: PhantomData,
        })
    }
}

fn parse_position(key: &str) -> Option<Position> {
    key.trim()
        .strip_prefix('(')?
        .strip_suffix(')')?
        .split(',')
        .map(|part| part.trim().parse::<usize>().ok())
        .collect_tuple()
        .and_then(|(row, col)| Some((row?, col?)))
}

/// File stem of the artifacts written after `episodes` training episodes.
pub fn artifact_stem(episodes: usize) -> String {
    format!("q_training_{episodes}_episodes")
}

/// Writes the table as pickle and JSON into `dir`, named after the episode
/// count. Returns the written paths, pickle first.
pub fn q_table_to_disk(dir: &Path, episodes: usize, q: &QTable) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let stem = artifact_stem(episodes);
    let q_pickle = dir.join(format!("{stem}.pickle"));
    let q_json = dir.join(format!("{stem}.json"));

    let mut file = BufWriter::new(File::create(&q_pickle)?);
    serde_pickle::to_writer(&mut file, q, serde_pickle::SerOptions::new())?;
    file.flush()?;

    let mut file_json = BufWriter::new(File::create(&q_json)?);
    serde_json::to_writer(&mut file_json, q)?;
    file_json.flush()?;

    info!(
        "saved q-table with {} states to {} and {}",
        q.len(),
        q_pickle.display(),
        q_json.display()
    );
    Ok(vec![q_pickle, q_json])
}

/// Loads an artifact, choosing the format from the file extension
/// (`.json` is JSON, anything else is pickle).
pub fn q_table_from_disk(file: &Path) -> Result<QTable> {
    let q = match file.extension().and_then(|ext| ext.to_str()) {
        Some("json") => q_table_from_disk_json(file)?,
        _ => q_table_from_disk_pickle(file)?,
    };
    info!("loaded q-table with {} states from {}", q.len(), file.display());
    Ok(q)
}

pub fn q_table_from_disk_pickle(file: &Path) -> Result<QTable> {
    let reader = BufReader::new(File::open(file)?);
    let decoded: QTable = serde_pickle::from_reader(reader, serde_pickle::DeOptions::new())?;
    Ok(decoded)
}

pub fn q_table_from_disk_json(file: &Path) -> Result<QTable> {
    let reader = BufReader::new(File::open(file)?);
    let decoded: QTable = serde_json::from_reader(reader)?;
    Ok(decoded)
}
