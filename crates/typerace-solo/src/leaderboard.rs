//! The global leaderboard.
//!
//! Served as a fixed ranking; it isn't computed from stored results.

use serde::{Deserialize, Serialize};

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub wpm: u32,
    pub accuracy: u32,
}

const ENTRIES: [(&str, u32, u32); 5] = [
    ("SpeedTyper1", 85, 98),
    ("FastFingers", 82, 96),
    ("KeyboardMaster", 79, 99),
    ("TypingPro", 76, 94),
    ("QuickType", 73, 97),
];

/// The leaderboard, best first.
pub fn leaderboard() -> Vec<LeaderboardEntry> {
    ENTRIES
        .iter()
        .map(|&(username, wpm, accuracy)| LeaderboardEntry {
            username: username.to_string(),
            wpm,
            accuracy,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaderboard_has_five_entries_best_first() {
        let board = leaderboard();
        assert_eq!(board.len(), 5);
        assert_eq!(board[0].username, "SpeedTyper1");
        assert!(board.windows(2).all(|w| w[0].wpm >= w[1].wpm));
    }

    #[test]
    fn test_leaderboard_json_shape() {
        let json = serde_json::to_value(leaderboard()).unwrap();
        assert_eq!(
            json[2],
            serde_json::json!({ "username": "KeyboardMaster", "wpm": 79, "accuracy": 99 })
        );
    }
}
