//! Pure gomoku board rules.
//!
//! This crate owns the grid, the two seats that place stones on it, and the
//! run-scanning algorithm used to detect a win. It performs no I/O and holds
//! no session or account state; the session engine builds on top of it.
//!
//! # Example
//!
//! ```
//! use gomoku_board::{Board, Seat};
//!
//! let mut board = Board::new(15);
//! for col in 3..8 {
//!     board.place(7, col, Seat::Player1).unwrap();
//! }
//! assert!(board.check_win(7, 7, Seat::Player1, 5));
//! ```

#![warn(missing_docs)]

mod board;
mod error;
mod types;

pub mod invariants;
pub mod rules;

pub use board::Board;
pub use error::BoardError;
pub use invariants::{Invariant, InvariantSet, InvariantViolation, StoneBalanceInvariant};
pub use rules::Axis;
pub use types::{Cell, Seat};
