use crate::gomoku::stone::Stone;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const BOARD_SIZE: usize = 15;
pub const WIN_LENGTH: usize = 5;

// Horizontal, vertical and both diagonals. The opposite half of each line is
// scanned by negating the step.
const DIRECTIONS: [(i32, i32); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coordinate {
    Row,
    Col,
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coordinate::Row => write!(f, "row"),
            Coordinate::Col => write!(f, "column"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardPositionError {
    #[error("{0} {1} is off the board (size {size})", size = BOARD_SIZE)]
    OutOfBounds(Coordinate, usize),
}

#[derive(Deserialize)]
struct RawPosition {
    row: usize,
    col: usize,
}

impl TryFrom<RawPosition> for Position {
    type Error = BoardPositionError;
    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        Position::new(raw.row, raw.col)
    }
}

// Always within bounds once constructed
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(try_from = "RawPosition")]
pub struct Position {
    row: usize,
    col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Result<Self, BoardPositionError> {
        if row >= BOARD_SIZE {
            return Err(BoardPositionError::OutOfBounds(Coordinate::Row, row));
        }
        if col >= BOARD_SIZE {
            return Err(BoardPositionError::OutOfBounds(Coordinate::Col, col));
        }
        Ok(Position { row, col })
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    // Need signed steps because lines run in both directions
    pub fn offset(&self, d_row: i32, d_col: i32) -> Option<Position> {
        let row = usize::try_from(self.row as i32 + d_row).ok()?;
        let col = usize::try_from(self.col as i32 + d_col).ok()?;
        Position::new(row, col).ok()
    }

    pub fn neighbourhood(&self) -> Vec<Position> {
        (-1..=1)
            .flat_map(|d_row| (-1..=1).map(move |d_col| (d_row, d_col)))
            .filter_map(|(d_row, d_col)| self.offset(d_row, d_col))
            .collect()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
pub struct Move {
    pub position: Position,
    #[serde(rename = "color")]
    pub stone: Stone,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{position} is already taken by {occupant}")]
pub struct Occupied {
    pub position: Position,
    pub occupant: Stone,
}

type Grid = [[Option<Stone>; BOARD_SIZE]; BOARD_SIZE];

// Never mutated in place: every change hands back a new grid so earlier
// snapshots keep their own copy.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Board(Grid);

impl Board {
    pub fn new() -> Self {
        Board::default()
    }

    pub fn get(&self, position: Position) -> Option<Stone> {
        self.0[position.row][position.col]
    }

    pub fn place_stone(&self, position: Position, stone: Stone) -> Result<Board, Occupied> {
        if let Some(occupant) = self.get(position) {
            return Err(Occupied { position, occupant });
        }
        let mut grid = self.0;
        grid[position.row][position.col] = Some(stone);
        Ok(Board(grid))
    }

    pub fn with_cleared(&self, positions: &[Position]) -> Board {
        let mut grid = self.0;
        for position in positions {
            grid[position.row][position.col] = None;
        }
        Board(grid)
    }

    pub fn check_win(&self, position: Position, stone: Stone) -> bool {
        if self.get(position) != Some(stone) {
            return false;
        }
        DIRECTIONS.iter().any(|&(d_row, d_col)| {
            let run = 1
                + self.run_length(position, stone, d_row, d_col)
                + self.run_length(position, stone, -d_row, -d_col);
            run >= WIN_LENGTH
        })
    }

    pub fn is_full(&self) -> bool {
        self.0.iter().all(|row| row.iter().all(Option::is_some))
    }

    pub fn stone_count(&self) -> usize {
        self.0
            .iter()
            .map(|row| row.iter().filter(|cell| cell.is_some()).count())
            .sum()
    }

    // Counts same-colored stones beyond `from`, not including it
    fn run_length(&self, from: Position, stone: Stone, d_row: i32, d_col: i32) -> usize {
        let mut count = 0;
        let mut current = from;
        while let Some(next) = current.offset(d_row, d_col) {
            if self.get(next) != Some(stone) {
                break;
            }
            count += 1;
            current = next;
        }
        count
    }
}
