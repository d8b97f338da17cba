//! Draw detection.

use crate::{Board, Cell};
use tracing::instrument;

/// Checks if every cell holds a stone.
///
/// A full board on which the last stone did not complete a run is a draw.
#[instrument(skip(board), fields(size = board.size()))]
pub fn is_full(board: &Board) -> bool {
    board.cells().iter().all(|cell| *cell != Cell::Empty)
}
