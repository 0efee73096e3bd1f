//! The input/drawing side of interactive play. The game core only sees
//! [`Frontend`]: it pulls input events from it and tells it what to draw.

use crate::board::{Board, Outcome, Position};
use crate::error::{Error, Result};
use crate::game::{Game, GameStatus};
use crate::players::{Mark, MoveSource};
use crate::q_table::QTable;
use log::{debug, info};
use std::io::{self, BufRead, Write};

/// Side of the square grid in pixels.
pub const GRID_LENGTH: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Quit,
    Pointer { x: u32, y: u32 },
}

/// Maps pixel coordinates on a `grid_length`-wide square to board cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    pub grid_length: u32,
    pub partitions: usize,
}

impl GridGeometry {
    pub fn new(partitions: usize) -> Self {
        GridGeometry {
            grid_length: GRID_LENGTH,
            partitions,
        }
    }

    fn cell_width(&self) -> u32 {
        (self.grid_length / self.partitions.max(1) as u32).max(1)
    }

    pub fn cell_at(&self, x: u32, y: u32) -> Option<Position> {
        let row = (y / self.cell_width()) as usize;
        let col = (x / self.cell_width()) as usize;
        (row < self.partitions && col < self.partitions).then_some((row, col))
    }

    pub fn cell_center(&self, (row, col): Position) -> (u32, u32) {
        let width = self.cell_width();
        (col as u32 * width + width / 2, row as u32 * width + width / 2)
    }
}

pub trait Frontend {
    /// Next pending event, `None` when there is nothing to handle this frame.
    fn poll_event(&mut self) -> Result<Option<InputEvent>>;
    fn draw_mark(&mut self, position: Position, mark: Mark) -> Result<()>;
    fn show_outcome(&mut self, outcome: Outcome) -> Result<()>;
    /// Releases whatever the front-end holds. Called exactly once.
    fn close(&mut self) -> Result<()>;
}

/// Event loop for two players at the same front-end. Pointer events on
/// occupied cells or outside the grid are ignored. Returns the outcome, or
/// `None` when the player quit first. The front-end is closed on every path.
pub fn run_interactive<F: Frontend>(
    frontend: &mut F,
    game: &mut Game,
    q: &mut QTable,
) -> Result<Option<Outcome>> {
    let outcome = drive(frontend, game, q);
    let closed = frontend.close();
    let outcome = outcome?;
    closed?;
    Ok(outcome)
}

fn drive<F: Frontend>(frontend: &mut F, game: &mut Game, q: &mut QTable) -> Result<Option<Outcome>> {
    let geometry = GridGeometry::new(game.board().partitions());
    loop {
        match frontend.poll_event()? {
            None => {}
            Some(InputEvent::Quit) => {
                info!("quit before the game ended");
                return Ok(None);
            }
            Some(InputEvent::Pointer { x, y }) => {
                let Some(cell) = geometry.cell_at(x, y) else {
                    debug!("pointer at ({x}, {y}) is outside the grid");
                    continue;
                };
                let mark = game.current_player().mark();
                match game.play_move(cell, q) {
                    Ok(status) => {
                        frontend.draw_mark(cell, mark)?;
                        if let GameStatus::Ended(outcome) = status {
                            info!("game over: {outcome:?}");
                            frontend.show_outcome(outcome)?;
                            return Ok(Some(outcome));
                        }
                    }
                    Err(Error::IllegalMove { .. }) | Err(Error::GameOver) => {}
                    Err(e) => return Err(e),
                }
            }
        }
    }
}

/// `row col`, both counted from 1.
fn parse_cell(line: &str) -> Option<Position> {
    let mut parts = line.split_whitespace().map(|part| part.parse::<usize>().ok());
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Some(row)), Some(Some(col)), None) if row > 0 && col > 0 => Some((row - 1, col - 1)),
        _ => None,
    }
}

fn read_trimmed<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_owned()))
}

/// Text front-end: `q` quits, `row col` clicks the centre of that cell.
pub struct TerminalFrontend<R, W> {
    input: R,
    output: W,
    geometry: GridGeometry,
    view: Board,
}

impl<R: BufRead, W: Write> TerminalFrontend<R, W> {
    pub fn new(input: R, output: W, partitions: usize) -> Self {
        TerminalFrontend {
            input,
            output,
            geometry: GridGeometry::new(partitions),
            view: Board::with_partitions(partitions),
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl TerminalFrontend<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio(partitions: usize) -> Self {
        TerminalFrontend::new(io::stdin().lock(), io::stdout(), partitions)
    }
}

impl<R: BufRead, W: Write> Frontend for TerminalFrontend<R, W> {
    fn poll_event(&mut self) -> Result<Option<InputEvent>> {
        write!(
            self.output,
            "enter row and column (1-{}), or q to quit: ",
            self.geometry.partitions
        )?;
        self.output.flush()?;
        let Some(line) = read_trimmed(&mut self.input)? else {
            return Ok(Some(InputEvent::Quit));
        };
        if line.eq_ignore_ascii_case("q") {
            return Ok(Some(InputEvent::Quit));
        }
        match parse_cell(&line) {
            Some(cell) => {
                let (x, y) = self.geometry.cell_center(cell);
                Ok(Some(InputEvent::Pointer { x, y }))
            }
            None => {
                writeln!(self.output, "could not read {line:?}")?;
                Ok(None)
            }
        }
    }

    fn draw_mark(&mut self, position: Position, mark: Mark) -> Result<()> {
        self.view.apply_move(position, mark)?;
        writeln!(self.output, "{}", self.view)?;
        Ok(())
    }

    fn show_outcome(&mut self, outcome: Outcome) -> Result<()> {
        match outcome {
            Outcome::Winner(mark) => writeln!(self.output, "{mark} won!")?,
            Outcome::Draw => writeln!(self.output, "too bad, it's a draw")?,
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }
}

/// Human moves typed at a terminal, for games against a policy.
pub struct TerminalMoves<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalMoves<R, W> {
    pub fn new(input: R, output: W) -> Self {
        TerminalMoves { input, output }
    }
}

impl TerminalMoves<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        TerminalMoves::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> MoveSource for TerminalMoves<R, W> {
    fn next_move(&mut self, board: &Board, mark: Mark) -> Result<Position> {
        writeln!(self.output, "{board}")?;
        loop {
            write!(
                self.output,
                "{mark} to move, enter row and column (1-{}): ",
                board.partitions()
            )?;
            self.output.flush()?;
            let Some(line) = read_trimmed(&mut self.input)? else {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            };
            match parse_cell(&line) {
                Some(cell) => return Ok(cell),
                None => writeln!(self.output, "could not read {line:?}")?,
            }
        }
    }
}
