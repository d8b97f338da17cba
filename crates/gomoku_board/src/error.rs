//! Board error types.

use derive_more::{Display, Error};

/// Reasons a board operation can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum BoardError {
    /// Coordinates fall outside the grid.
    #[display("Cell ({row}, {col}) is outside the board")]
    OutOfBounds {
        /// Requested row.
        row: i32,
        /// Requested column.
        col: i32,
    },

    /// The target cell already holds a stone.
    #[display("Cell ({row}, {col}) is already occupied")]
    CellOccupied {
        /// Requested row.
        row: i32,
        /// Requested column.
        col: i32,
    },

    /// A persisted cell code is not 0, 1 or 2.
    #[display("Invalid cell code {code}")]
    InvalidCellCode {
        /// The offending code.
        code: u8,
    },

    /// Persisted rows do not form a square grid.
    #[display("Board rows do not form a square grid")]
    NotSquare,
}
