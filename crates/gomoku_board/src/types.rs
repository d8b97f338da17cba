//! Core domain types for a gomoku board.

use serde::{Deserialize, Serialize};

/// One of the two match positions.
///
/// `Player1` always places the first stone.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::AsRefStr,
    strum::Display,
    strum::EnumString,
)]
pub enum Seat {
    /// The creator's seat; moves first.
    #[serde(rename = "player1")]
    #[strum(serialize = "player1")]
    Player1,
    /// The joiner's seat.
    #[serde(rename = "player2")]
    #[strum(serialize = "player2")]
    Player2,
}

impl Seat {
    /// Returns the other seat.
    pub fn opponent(self) -> Self {
        match self {
            Seat::Player1 => Seat::Player2,
            Seat::Player2 => Seat::Player1,
        }
    }

    /// Persisted cell code for a stone of this seat.
    pub fn code(self) -> u8 {
        match self {
            Seat::Player1 => 1,
            Seat::Player2 => 2,
        }
    }
}

/// A cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// No stone.
    #[default]
    Empty,
    /// A stone placed by a seat.
    Stone(Seat),
}

impl Cell {
    /// Persisted code: `0` empty, `1` player1, `2` player2.
    pub fn code(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Stone(seat) => seat.code(),
        }
    }

    /// Parses a persisted cell code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Cell::Empty),
            1 => Some(Cell::Stone(Seat::Player1)),
            2 => Some(Cell::Stone(Seat::Player2)),
            _ => None,
        }
    }

    /// Returns true if this cell holds a stone of `seat`.
    pub fn is(self, seat: Seat) -> bool {
        self == Cell::Stone(seat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_opponent_is_involution() {
        assert_eq!(Seat::Player1.opponent(), Seat::Player2);
        assert_eq!(Seat::Player1.opponent().opponent(), Seat::Player1);
    }

    #[test]
    fn test_cell_codes() {
        for code in 0..=2 {
            let cell = Cell::from_code(code).expect("valid code");
            assert_eq!(cell.code(), code);
        }
        assert_eq!(Cell::from_code(3), None);
    }

    #[test]
    fn test_seat_names() {
        assert_eq!(Seat::Player2.to_string(), "player2");
        assert_eq!(Seat::from_str("player1").unwrap(), Seat::Player1);
        assert_eq!(serde_json::to_string(&Seat::Player1).unwrap(), "\"player1\"");
    }
}
