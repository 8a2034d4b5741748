//! High score leaderboard
//!
//! One table per game, persisted through `platform::storage`, tracks the top
//! 10 sessions plus the best score ever seen.

use serde::{Deserialize, Serialize};

use crate::platform::storage;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    pub currency: u32,
    /// Level reached
    pub level: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: i64,
}

/// High score leaderboard for one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub game_id: String,
    pub entries: Vec<HighScoreEntry>,
    /// Cached best score; survives entries falling off the table
    best: Option<u64>,
}

impl HighScores {
    const STORAGE_KEY_PREFIX: &'static str = "arcade_highscores";

    /// Create empty leaderboard
    pub fn new(game_id: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            entries: Vec::new(),
            best: None,
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a new score to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_score(&mut self, score: u64, currency: u32, level: u32, timestamp: i64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        self.best = Some(self.best.map_or(score, |best| best.max(score)));

        let entry = HighScoreEntry {
            score,
            currency,
            level,
            timestamp,
        };

        // Find insertion point (sorted descending by score)
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best score ever recorded for this game
    pub fn best_score(&self) -> Option<u64> {
        self.best.or_else(|| self.entries.first().map(|e| e.score))
    }

    fn storage_key(game_id: &str) -> String {
        format!("{}:{}", Self::STORAGE_KEY_PREFIX, game_id)
    }

    /// Load the table for a game, or an empty one
    pub fn load(game_id: &str) -> Self {
        let loaded = storage::get(&Self::storage_key(game_id))
            .and_then(|json| serde_json::from_str::<HighScores>(&json).ok());
        match loaded {
            Some(scores) => {
                log::info!("Loaded {} high scores for {}", scores.entries.len(), game_id);
                scores
            }
            None => {
                log::info!("No high scores found for {}, starting fresh", game_id);
                Self::new(game_id)
            }
        }
    }

    pub fn save(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            if storage::set(&Self::storage_key(&self.game_id), &json) {
                log::info!("High scores saved ({} entries)", self.entries.len());
            }
        }
    }
}
