//! Rules for gomoku boards.
//!
//! Pure functions over a [`Board`](crate::Board), kept apart from board
//! storage so the session engine can evaluate them without mutating state.

pub mod draw;
pub mod win;

pub use draw::is_full;
pub use win::{Axis, completes_run, run_length};
