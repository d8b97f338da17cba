//! Win detection.
//!
//! A win is decided locally around the stone just placed: for each of the
//! four axes, contiguous same-seat cells are counted in both directions and
//! added to the placed cell itself. A total of at least `win_condition` wins,
//! so an overline (six in a row under a five-in-a-row rule) also counts.

use crate::{Board, Seat};
use tracing::instrument;

/// One of the four line directions on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum Axis {
    /// Along a row.
    Horizontal,
    /// Along a column.
    Vertical,
    /// Top-left to bottom-right.
    Diagonal,
    /// Top-right to bottom-left.
    AntiDiagonal,
}

impl Axis {
    /// `(Δrow, Δcol)` of the positive direction.
    pub fn step(self) -> (i32, i32) {
        match self {
            Axis::Horizontal => (0, 1),
            Axis::Vertical => (1, 0),
            Axis::Diagonal => (1, 1),
            Axis::AntiDiagonal => (1, -1),
        }
    }
}

/// Contiguous cells of `seat` starting next to `(row, col)` and walking by
/// `(d_row, d_col)`.
fn walk(board: &Board, row: i32, col: i32, d_row: i32, d_col: i32, seat: Seat) -> usize {
    let mut count = 0;
    let (mut r, mut c) = (row + d_row, col + d_col);
    while board.get(r, c).is_some_and(|cell| cell.is(seat)) {
        count += 1;
        r += d_row;
        c += d_col;
    }
    count
}

/// Length of the run through `(row, col)` along `axis`, counting the cell
/// itself as one.
pub fn run_length(board: &Board, row: i32, col: i32, seat: Seat, axis: Axis) -> usize {
    let (d_row, d_col) = axis.step();
    1 + walk(board, row, col, d_row, d_col, seat) + walk(board, row, col, -d_row, -d_col, seat)
}

/// True iff any axis through `(row, col)` has a run of at least
/// `win_condition` stones of `seat`.
#[instrument(skip(board), fields(size = board.size()))]
pub fn completes_run(board: &Board, row: i32, col: i32, seat: Seat, win_condition: usize) -> bool {
    <Axis as strum::IntoEnumIterator>::iter()
        .any(|axis| run_length(board, row, col, seat, axis) >= win_condition)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(stones: &[(i32, i32)], seat: Seat) -> Board {
        let mut board = Board::new(15);
        for &(row, col) in stones {
            board.place(row, col, seat).unwrap();
        }
        board
    }

    #[test]
    fn test_horizontal_five_wins() {
        let board = board_with(&[(7, 7), (7, 8), (7, 9), (7, 10), (7, 11)], Seat::Player1);
        assert!(completes_run(&board, 7, 11, Seat::Player1, 5));
        assert!(completes_run(&board, 7, 9, Seat::Player1, 5));
    }

    #[test]
    fn test_four_does_not_win() {
        let board = board_with(&[(7, 7), (7, 8), (7, 9), (7, 10)], Seat::Player1);
        assert!(!completes_run(&board, 7, 10, Seat::Player1, 5));
    }

    #[test]
    fn test_gap_breaks_run() {
        let board = board_with(&[(3, 3), (4, 4), (6, 6), (7, 7), (8, 8)], Seat::Player2);
        assert_eq!(run_length(&board, 6, 6, Seat::Player2, Axis::Diagonal), 3);
        assert!(!completes_run(&board, 6, 6, Seat::Player2, 5));
    }

    #[test]
    fn test_opponent_stones_do_not_count() {
        let mut board = board_with(&[(0, 0), (0, 1), (0, 2), (0, 3)], Seat::Player1);
        board.place(0, 4, Seat::Player2).unwrap();
        assert!(!completes_run(&board, 0, 3, Seat::Player1, 5));
    }

    #[test]
    fn test_overline_counts_as_win() {
        let board = board_with(&[(2, 0), (2, 1), (2, 2), (2, 3), (2, 4), (2, 5)], Seat::Player1);
        assert_eq!(run_length(&board, 2, 5, Seat::Player1, Axis::Horizontal), 6);
        assert!(completes_run(&board, 2, 5, Seat::Player1, 5));
    }

    #[test]
    fn test_anti_diagonal_at_edge() {
        let board = board_with(&[(0, 14), (1, 13), (2, 12), (3, 11), (4, 10)], Seat::Player2);
        assert!(completes_run(&board, 0, 14, Seat::Player2, 5));
        assert_eq!(run_length(&board, 2, 12, Seat::Player2, Axis::AntiDiagonal), 5);
    }
}
