use crate::error::{Error, Result};
use crate::players::Mark;
use itertools::Itertools;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, iter, ops::Deref};

/// Zero-based `(row, column)` of a cell.
pub type Position = (usize, usize);

pub const DEFAULT_PARTITIONS: usize = 3;

const EMPTY_KEY_CHAR: char = 'N';
const EMPTY_DRAW_CHAR: char = '-';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Winner(Mark),
    Draw,
}

/// Canonical encoding of a board plus the mark to move: every cell in
/// row-major order (`X`, `O`, `N` for empty) followed by the mark.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateKey(String);

impl StateKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: Array2<Option<Mark>>,
}

impl Deref for Board {
    type Target = Array2<Option<Mark>>;
    fn deref(&self) -> &Self::Target {
        &self.cells
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in self.cells.rows() {
            let line = row
                .iter()
                .map(|cell| cell.map_or(EMPTY_DRAW_CHAR, Mark::as_char))
                .join(" ");
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Board::with_partitions(DEFAULT_PARTITIONS)
    }

    pub fn with_partitions(partitions: usize) -> Self {
        Board {
            cells: Array::from_elem((partitions, partitions), None),
        }
    }

    pub fn partitions(&self) -> usize {
        self.cells.nrows()
    }

    pub fn get(&self, (row, col): Position) -> Option<Mark> {
        self.cells.get([row, col]).copied().flatten()
    }

    pub fn reset(&mut self) {
        self.cells.fill(None);
    }

    /// Empty cells in row-major order.
    pub fn available_moves(&self) -> Vec<Position> {
        self.cells
            .indexed_iter()
            .filter(|(_index, value)| value.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn apply_move(&mut self, (row, col): Position, mark: Mark) -> Result<()> {
        match self.cells.get_mut([row, col]) {
            Some(cell) if cell.is_none() => {
                *cell = Some(mark);
                Ok(())
            }
            _ => Err(Error::IllegalMove { row, col }),
        }
    }

    /// Copy of the board with one more placement. The receiver is untouched.
    pub fn clone_with_move(&self, position: Position, mark: Mark) -> Result<Board> {
        let mut next = self.clone();
        next.apply_move(position, mark)?;
        Ok(next)
    }

    /// Scans rows, then columns, then the main diagonal, then the anti-diagonal.
    pub fn winner(&self) -> Option<Mark> {
        let n = self.partitions();
        let anti_diagonal: Vec<Option<Mark>> = (0..n).map(|i| self.cells[[i, n - 1 - i]]).collect();
        self.cells
            .rows()
            .into_iter()
            .chain(self.cells.columns())
            .chain(iter::once(self.cells.diag()))
            .find_map(|line| uniform_mark(line.iter()))
            .or_else(|| uniform_mark(anti_diagonal.iter()))
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub fn is_terminal(&self) -> bool {
        self.winner().is_some() || self.is_full()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.winner() {
            Some(mark) => Some(Outcome::Winner(mark)),
            None if self.is_full() => Some(Outcome::Draw),
            None => None,
        }
    }

    pub fn state_key(&self, mark_to_move: Mark) -> StateKey {
        let key = self
            .cells
            .iter()
            .map(|cell| cell.map_or(EMPTY_KEY_CHAR, Mark::as_char))
            .chain(iter::once(mark_to_move.as_char()))
            .collect::<String>();
        StateKey(key)
    }

    /// Terminal value, always from the cross perspective: a cross win is 1.0,
    /// a nought win -1.0, a draw 0.5 and anything still in play 0.0.
    pub fn reward(&self) -> f32 {
        match self.outcome() {
            Some(Outcome::Winner(Mark::Cross)) => 1.0,
            Some(Outcome::Winner(Mark::Nought)) => -1.0,
            Some(Outcome::Draw) => 0.5,
            None => 0.0,
        }
    }
}

fn uniform_mark<'a>(mut line: impl Iterator<Item = &'a Option<Mark>>) -> Option<Mark> {
    let first = (*line.next()?)?;
    line.all(|cell| *cell == Some(first)).then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_from(moves: &[(Position, Mark)]) -> Board {
        let mut board = Board::new();
        for &(position, mark) in moves {
            board.apply_move(position, mark).unwrap();
        }
        board
    }

    #[test]
    fn available_moves_shrink_with_each_placement() {
        let mut board = Board::new();
        assert_eq!(board.available_moves().len(), 9);
        board.apply_move((0, 0), Mark::Cross).unwrap();
        board.apply_move((2, 1), Mark::Nought).unwrap();
        let moves = board.available_moves();
        assert_eq!(moves.len(), 7);
        assert_eq!(moves[0], (0, 1));
        assert!(!moves.contains(&(2, 1)));
    }

    #[test]
    fn available_moves_are_row_major() {
        let board = Board::with_partitions(4);
        let moves = board.available_moves();
        assert_eq!(moves.len(), 16);
        assert_eq!(&moves[..5], &[(0, 0), (0, 1), (0, 2), (0, 3), (1, 0)]);
    }

    #[test]
    fn apply_move_rejects_occupied_and_out_of_range() {
        let mut board = Board::new();
        board.apply_move((1, 1), Mark::Cross).unwrap();
        assert!(matches!(
            board.apply_move((1, 1), Mark::Nought),
            Err(Error::IllegalMove { row: 1, col: 1 })
        ));
        assert!(matches!(
            board.apply_move((3, 0), Mark::Nought),
            Err(Error::IllegalMove { row: 3, col: 0 })
        ));
        assert_eq!(board.get((1, 1)), Some(Mark::Cross));
    }

    #[test]
    fn top_row_win_for_cross() {
        let board = board_from(&[
            ((0, 0), Mark::Cross),
            ((1, 1), Mark::Nought),
            ((0, 1), Mark::Cross),
            ((2, 2), Mark::Nought),
            ((0, 2), Mark::Cross),
        ]);
        assert_eq!(board.winner(), Some(Mark::Cross));
        assert!(!board.is_full());
        assert!(board.is_terminal());
        assert_eq!(board.reward(), 1.0);
    }

    #[test]
    fn column_and_diagonal_wins() {
        let column = board_from(&[
            ((0, 2), Mark::Nought),
            ((1, 2), Mark::Nought),
            ((2, 2), Mark::Nought),
        ]);
        assert_eq!(column.winner(), Some(Mark::Nought));
        assert_eq!(column.reward(), -1.0);

        let anti = board_from(&[
            ((0, 2), Mark::Cross),
            ((1, 1), Mark::Cross),
            ((2, 0), Mark::Cross),
        ]);
        assert_eq!(anti.winner(), Some(Mark::Cross));

        let diag = board_from(&[
            ((0, 0), Mark::Nought),
            ((1, 1), Mark::Nought),
            ((2, 2), Mark::Nought),
        ]);
        assert_eq!(diag.outcome(), Some(Outcome::Winner(Mark::Nought)));
    }

    #[test]
    fn full_board_without_line_is_a_draw() {
        // X O X
        // X O O
        // O X X
        let board = board_from(&[
            ((0, 0), Mark::Cross),
            ((0, 1), Mark::Nought),
            ((0, 2), Mark::Cross),
            ((1, 0), Mark::Cross),
            ((1, 1), Mark::Nought),
            ((1, 2), Mark::Nought),
            ((2, 0), Mark::Nought),
            ((2, 1), Mark::Cross),
            ((2, 2), Mark::Cross),
        ]);
        assert_eq!(board.winner(), None);
        assert!(board.is_full());
        assert_eq!(board.outcome(), Some(Outcome::Draw));
        assert_eq!(board.reward(), 0.5);
        assert!(board.available_moves().is_empty());
    }

    #[test]
    fn reward_is_zero_while_in_play() {
        let board = board_from(&[((0, 0), Mark::Cross), ((0, 1), Mark::Cross)]);
        assert_eq!(board.reward(), 0.0);
        assert!(!board.is_terminal());
    }

    #[test]
    fn clone_with_move_leaves_receiver_untouched() {
        let board = board_from(&[((0, 0), Mark::Cross), ((1, 1), Mark::Nought)]);
        let before = board.clone();
        let next = board.clone_with_move((0, 1), Mark::Cross).unwrap();
        let _ = next.winner();
        let _ = next.is_full();
        assert_eq!(board, before);
        assert_eq!(next.get((0, 1)), Some(Mark::Cross));
        assert!(board.clone_with_move((1, 1), Mark::Cross).is_err());
    }

    #[test]
    fn state_key_encodes_cells_and_mark_to_move() {
        let board = board_from(&[((0, 0), Mark::Cross), ((1, 1), Mark::Nought)]);
        assert_eq!(board.state_key(Mark::Cross).as_str(), "XNNNONNNNX");
        assert_eq!(board.state_key(Mark::Nought).as_str(), "XNNNONNNNO");
        assert_eq!(Board::new().state_key(Mark::Cross).as_str(), "NNNNNNNNNX");
    }

    #[test]
    fn state_key_is_injective() {
        let board = board_from(&[((0, 0), Mark::Cross)]);
        let same = board_from(&[((0, 0), Mark::Cross)]);
        assert_eq!(board.state_key(Mark::Nought), same.state_key(Mark::Nought));
        assert_ne!(board.state_key(Mark::Nought), board.state_key(Mark::Cross));

        let other_cell = board_from(&[((0, 1), Mark::Cross)]);
        let other_mark = board_from(&[((0, 0), Mark::Nought)]);
        assert_ne!(board.state_key(Mark::Nought), other_cell.state_key(Mark::Nought));
        assert_ne!(board.state_key(Mark::Nought), other_mark.state_key(Mark::Nought));
    }

    #[test]
    fn reset_clears_every_cell() {
        let mut board = board_from(&[((0, 0), Mark::Cross), ((2, 2), Mark::Nought)]);
        board.reset();
        assert_eq!(board, Board::new());
    }

    #[test]
    fn display_draws_rows() {
        let board = board_from(&[((0, 0), Mark::Cross), ((1, 1), Mark::Nought)]);
        assert_eq!(board.to_string(), "X - -\n- O -\n- - -\n");
    }
}
