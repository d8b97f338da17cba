//! Match outcome from one account's perspective.

use serde::{Deserialize, Serialize};

/// Game outcome from the account's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GameOutcome {
    /// Account won the match.
    Win,
    /// Account lost the match.
    Loss,
    /// Match ended in a draw.
    Draw,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_name_matches_wire_name() {
        for outcome in [GameOutcome::Win, GameOutcome::Loss, GameOutcome::Draw] {
            let wire = serde_json::to_value(outcome).unwrap();
            assert_eq!(wire.as_str(), Some(outcome.as_ref()));
        }
        assert_eq!(GameOutcome::Loss.as_ref(), "loss");
    }
}
