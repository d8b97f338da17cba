//! Square gomoku grid.

use crate::error::BoardError;
use crate::rules;
use crate::types::{Cell, Seat};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Square grid of cells, stored row-major.
///
/// Serializes as an array of rows of cell codes (`0` empty, `1` player1,
/// `2` player2), the same shape used for storage and transmission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<Vec<u8>>", try_from = "Vec<Vec<u8>>")]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Creates an empty `size × size` board.
    #[instrument]
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Cell::Empty; size * size],
        }
    }

    /// Side length of the grid.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Row-major index of `(row, col)` if it lies on the grid.
    fn index(&self, row: i32, col: i32) -> Option<usize> {
        if self.is_in_bounds(row, col) {
            Some(row as usize * self.size + col as usize)
        } else {
            None
        }
    }

    /// True iff `0 <= row, col < size`.
    pub fn is_in_bounds(&self, row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.size && (col as usize) < self.size
    }

    /// Cell at `(row, col)`, or `None` off the grid.
    pub fn get(&self, row: i32, col: i32) -> Option<Cell> {
        self.index(row, col).map(|i| self.cells[i])
    }

    /// True iff `(row, col)` is on the grid and holds no stone.
    pub fn is_empty(&self, row: i32, col: i32) -> bool {
        self.get(row, col) == Some(Cell::Empty)
    }

    /// Places a stone of `seat` at `(row, col)`.
    ///
    /// # Errors
    ///
    /// [`BoardError::OutOfBounds`] off the grid, [`BoardError::CellOccupied`]
    /// when the cell already holds a stone. The board is unchanged on error.
    #[instrument(skip(self), fields(size = self.size))]
    pub fn place(&mut self, row: i32, col: i32, seat: Seat) -> Result<(), BoardError> {
        let index = self
            .index(row, col)
            .ok_or(BoardError::OutOfBounds { row, col })?;
        if self.cells[index] != Cell::Empty {
            return Err(BoardError::CellOccupied { row, col });
        }
        self.cells[index] = Cell::Stone(seat);
        Ok(())
    }

    /// True iff no empty cell remains.
    pub fn is_full(&self) -> bool {
        rules::is_full(self)
    }

    /// True iff a stone of `seat` at `(row, col)` sits on a run of at least
    /// `win_condition` along any axis.
    pub fn check_win(&self, row: i32, col: i32, seat: Seat, win_condition: usize) -> bool {
        rules::completes_run(self, row, col, seat, win_condition)
    }

    /// Number of stones placed by `seat`.
    pub fn count(&self, seat: Seat) -> usize {
        self.cells.iter().filter(|cell| cell.is(seat)).count()
    }

    /// Number of stones on the board.
    pub fn stones(&self) -> usize {
        self.cells.iter().filter(|cell| **cell != Cell::Empty).count()
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cell codes as an array of rows.
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.size.max(1))
            .take(self.size)
            .map(|row| row.iter().map(|cell| cell.code()).collect())
            .collect()
    }

    /// Formats the board as text, one line per row.
    pub fn display(&self) -> String {
        let mut out = String::with_capacity(self.size * (self.size + 1));
        for row in self.cells.chunks(self.size.max(1)).take(self.size) {
            for cell in row {
                out.push(match cell {
                    Cell::Empty => '.',
                    Cell::Stone(Seat::Player1) => 'X',
                    Cell::Stone(Seat::Player2) => 'O',
                });
            }
            out.push('\n');
        }
        out
    }
}

impl From<Board> for Vec<Vec<u8>> {
    fn from(board: Board) -> Self {
        board.to_rows()
    }
}

impl TryFrom<Vec<Vec<u8>>> for Board {
    type Error = BoardError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        let size = rows.len();
        let mut cells = Vec::with_capacity(size * size);
        for row in rows {
            if row.len() != size {
                return Err(BoardError::NotSquare);
            }
            for code in row {
                cells.push(Cell::from_code(code).ok_or(BoardError::InvalidCellCode { code })?);
            }
        }
        Ok(Self { size, cells })
    }
}
