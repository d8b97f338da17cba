//! Tests for win detection across board symmetries and full-board draws.

use gomoku_board::{Board, Cell, Invariant, Seat, StoneBalanceInvariant};

const SIZE: usize = 15;

/// The eight symmetries of a square grid, applied to a coordinate.
fn symmetries(row: i32, col: i32) -> [(i32, i32); 8] {
    let n = SIZE as i32 - 1;
    [
        (row, col),
        (col, n - row),
        (n - row, n - col),
        (n - col, row),
        (row, n - col),
        (n - row, col),
        (col, row),
        (n - col, n - row),
    ]
}

/// Stones of player1 on the board, checking the win only after the last one.
fn last_stone_wins(stones: &[(i32, i32)]) -> bool {
    let mut board = Board::new(SIZE);
    for &(row, col) in stones {
        board.place(row, col, Seat::Player1).expect("placement should succeed");
    }
    let &(row, col) = stones.last().expect("at least one stone");
    board.check_win(row, col, Seat::Player1, 5)
}

#[test]
fn test_win_is_symmetric_under_rotation_and_reflection() {
    let lines: [[(i32, i32); 5]; 3] = [
        [(2, 3), (2, 4), (2, 5), (2, 6), (2, 7)],
        [(1, 1), (2, 2), (3, 3), (4, 4), (5, 5)],
        [(0, 9), (1, 8), (2, 7), (3, 6), (4, 5)],
    ];

    for line in lines {
        for transform in 0..8 {
            let mapped: Vec<_> = line
                .iter()
                .map(|&(row, col)| symmetries(row, col)[transform])
                .collect();
            assert!(last_stone_wins(&mapped), "line {line:?} under symmetry {transform}");

            let four = &mapped[..4];
            assert!(!last_stone_wins(four), "four stones {four:?} should not win");
        }
    }
}

#[test]
fn test_win_detected_from_middle_of_line() {
    let mut board = Board::new(SIZE);
    for col in [5, 6, 8, 9] {
        board.place(10, col, Seat::Player2).unwrap();
    }
    assert!(!board.check_win(10, 9, Seat::Player2, 5));
    board.place(10, 7, Seat::Player2).unwrap();
    assert!(board.check_win(10, 7, Seat::Player2, 5));
}

#[test]
fn test_paired_stripe_pattern_never_forms_three() {
    // Runs of at most two along every axis.
    let mut board = Board::new(SIZE);
    for row in 0..SIZE as i32 {
        for col in 0..SIZE as i32 {
            let seat = if (col + 2 * row) % 4 < 2 {
                Seat::Player1
            } else {
                Seat::Player2
            };
            board.place(row, col, seat).unwrap();
        }
    }

    assert!(board.is_full());
    assert!(StoneBalanceInvariant::holds(&board));
    for row in 0..SIZE as i32 {
        for col in 0..SIZE as i32 {
            let Some(Cell::Stone(seat)) = board.get(row, col) else {
                panic!("full board has an empty cell at ({row}, {col})");
            };
            assert!(!board.check_win(row, col, seat, 3));
        }
    }
}
