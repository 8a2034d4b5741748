//! Boundary state kept on the player's device
//!
//! The daily play gate: free-tier players get a fixed number of sessions per
//! calendar day and game, members are unlimited. Persisted as JSON through
//! `platform::storage`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::GateError;
use crate::platform::storage;

/// Sessions per day for free-tier players
pub const DEFAULT_DAILY_LIMIT: u32 = 5;

/// Account access level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccessTier {
    #[default]
    Free,
    Member,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayGate {
    pub tier: AccessTier,
    pub daily_limit: u32,
    /// Day the counter belongs to
    day: Option<NaiveDate>,
    plays: u32,
}

impl Default for PlayGate {
    fn default() -> Self {
        Self::new(AccessTier::Free, DEFAULT_DAILY_LIMIT)
    }
}

impl PlayGate {
    const STORAGE_KEY_PREFIX: &'static str = "arcade_play_gate";

    pub fn new(tier: AccessTier, daily_limit: u32) -> Self {
        Self {
            tier,
            daily_limit,
            day: None,
            plays: 0,
        }
    }

    /// Sessions started on `today`
    pub fn plays_on(&self, today: NaiveDate) -> u32 {
        if self.day == Some(today) { self.plays } else { 0 }
    }

    /// Sessions left today; `None` means unlimited
    pub fn remaining(&self, today: NaiveDate) -> Option<u32> {
        match self.tier {
            AccessTier::Member => None,
            AccessTier::Free => Some(self.daily_limit.saturating_sub(self.plays_on(today))),
        }
    }

    /// Whether another session may start today
    pub fn check(&self, today: NaiveDate) -> Result<(), GateError> {
        match self.remaining(today) {
            Some(0) => Err(GateError::DailyLimitReached {
                limit: self.daily_limit,
            }),
            _ => Ok(()),
        }
    }

    /// Count a started session. Returns today's play count.
    pub fn admit(&mut self, today: NaiveDate) -> Result<u32, GateError> {
        self.check(today)?;
        if self.day != Some(today) {
            self.day = Some(today);
            self.plays = 0;
        }
        self.plays += 1;
        Ok(self.plays)
    }

    fn storage_key(game_id: &str) -> String {
        format!("{}:{}", Self::STORAGE_KEY_PREFIX, game_id)
    }

    /// Load the gate for a game, or a fresh free-tier gate
    pub fn load(game_id: &str) -> Self {
        storage::get(&Self::storage_key(game_id))
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, game_id: &str) {
        match serde_json::to_string(self) {
            Ok(json) => {
                if !storage::set(&Self::storage_key(game_id), &json) {
                    log::warn!("Failed to persist play gate for {}", game_id);
                }
            }
            Err(e) => log::warn!("Failed to serialize play gate: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_free_tier_limit() {
        let mut gate = PlayGate::new(AccessTier::Free, 2);
        assert_eq!(gate.admit(day(1)), Ok(1));
        assert_eq!(gate.admit(day(1)), Ok(2));
        assert_eq!(
            gate.admit(day(1)),
            Err(GateError::DailyLimitReached { limit: 2 })
        );
        assert_eq!(gate.remaining(day(1)), Some(0));
    }

    #[test]
    fn test_counter_resets_next_day() {
        let mut gate = PlayGate::new(AccessTier::Free, 1);
        gate.admit(day(1)).unwrap();
        assert!(gate.check(day(1)).is_err());
        assert_eq!(gate.plays_on(day(2)), 0);
        assert_eq!(gate.admit(day(2)), Ok(1));
    }

    #[test]
    fn test_member_unlimited() {
        let mut gate = PlayGate::new(AccessTier::Member, 1);
        for _ in 0..10 {
            gate.admit(day(1)).unwrap();
        }
        assert_eq!(gate.remaining(day(1)), None);
    }

    #[test]
    fn test_save_and_load() {
        let mut gate = PlayGate::new(AccessTier::Free, 3);
        gate.admit(day(4)).unwrap();
        gate.save("gate-test");
        let loaded = PlayGate::load("gate-test");
        assert_eq!(loaded, gate);
        assert_eq!(PlayGate::load("gate-unknown"), PlayGate::default());
    }
}
