//! Combo streak and difficulty scaling
//!
//! Tier thresholds are edge-triggered: a tier fires once when the streak
//! crosses it upward and cannot fire again until the streak has been reset.
//! Crossing the high tier starts fever, which runs on its own expiry and
//! resets the streak when it ends.

use serde::{Deserialize, Serialize};

use crate::config::{ComboConfig, SpawnConfig};

/// Combo tiers, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComboTier {
    /// Cosmetic acknowledgment
    Low,
    /// Visual/audio escalation
    Mid,
    /// Fever
    High,
}

impl ComboTier {
    const ALL: [ComboTier; 3] = [ComboTier::Low, ComboTier::Mid, ComboTier::High];
}

/// Why a streak went back to zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetReason {
    Miss,
    Idle,
    FeverExpired,
}

/// Combo state changes reported to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboEvent {
    TierReached { tier: ComboTier, streak: u32 },
    FeverStarted { until: u64 },
    FeverEnded,
    Reset { from: u32, reason: ResetReason },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboModel {
    config: ComboConfig,
    streak: u32,
    best_streak: u32,
    /// Active-clock time of the last qualifying hit
    last_hit_at: Option<u64>,
    /// Active-clock fever expiry
    fever_until: Option<u64>,
}

impl ComboModel {
    pub fn new(config: ComboConfig) -> Self {
        Self {
            config,
            streak: 0,
            best_streak: 0,
            last_hit_at: None,
            fever_until: None,
        }
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    pub fn last_hit_at(&self) -> Option<u64> {
        self.last_hit_at
    }

    pub fn fever_until(&self) -> Option<u64> {
        self.fever_until
    }

    pub fn fever_active(&self, now: u64) -> bool {
        self.fever_until.is_some_and(|until| now < until)
    }

    fn threshold(&self, tier: ComboTier) -> u32 {
        match tier {
            ComboTier::Low => self.config.thresholds[0],
            ComboTier::Mid => self.config.thresholds[1],
            ComboTier::High => self.config.thresholds[2],
        }
    }

    /// Register a qualifying hit worth `gain` streak points
    pub fn register_hit(&mut self, gain: u32, now: u64) -> Vec<ComboEvent> {
        let mut events = Vec::new();
        if gain == 0 {
            return events;
        }

        let before = self.streak;
        self.streak = self.streak.saturating_add(gain);
        self.best_streak = self.best_streak.max(self.streak);
        self.last_hit_at = Some(now);

        for tier in ComboTier::ALL {
            let threshold = self.threshold(tier);
            if before < threshold && self.streak >= threshold {
                events.push(ComboEvent::TierReached {
                    tier,
                    streak: self.streak,
                });
                if tier == ComboTier::High {
                    let until = now + self.config.fever_duration_ms;
                    self.fever_until = Some(until);
                    log::info!("Fever! streak {} until {}", self.streak, until);
                    events.push(ComboEvent::FeverStarted { until });
                }
            }
        }

        events
    }

    /// Register a combo-breaking miss
    pub fn register_miss(&mut self) -> Option<ComboEvent> {
        self.reset(ResetReason::Miss)
    }

    fn reset(&mut self, reason: ResetReason) -> Option<ComboEvent> {
        if self.streak == 0 {
            return None;
        }
        let from = self.streak;
        self.streak = 0;
        Some(ComboEvent::Reset { from, reason })
    }

    /// Apply time-based transitions: fever expiry, then idle timeout
    pub fn update(&mut self, now: u64) -> Vec<ComboEvent> {
        let mut events = Vec::new();

        if let Some(until) = self.fever_until {
            if now >= until {
                self.fever_until = None;
                events.push(ComboEvent::FeverEnded);
                events.extend(self.reset(ResetReason::FeverExpired));
            }
        }

        if self.streak > 0 {
            let idle_since = self.last_hit_at.unwrap_or(0);
            if now.saturating_sub(idle_since) >= self.config.idle_window_ms {
                events.extend(self.reset(ResetReason::Idle));
            }
        }

        events
    }

    /// Reward multiplier from fever
    pub fn reward_multiplier(&self, now: u64) -> f32 {
        if self.fever_active(now) {
            self.config.fever_multiplier
        } else {
            1.0
        }
    }

    /// Spawn interval scaling: slower during fever, faster on a hot streak
    pub fn spawn_interval_factor(&self, now: u64, spawn: &SpawnConfig) -> f32 {
        if self.fever_active(now) {
            spawn.fever_interval_factor
        } else if self.streak >= self.threshold(ComboTier::Mid) {
            spawn.high_combo_interval_factor
        } else {
            1.0
        }
    }

    /// Movement scaling from the current streak
    pub fn speed_factor(&self) -> f32 {
        let bonus = (self.streak as f32 * self.config.streak_speed_step)
            .min(self.config.max_streak_speed_bonus);
        1.0 + bonus
    }

    /// Drop fever and streak (session end)
    pub fn clear(&mut self) {
        self.streak = 0;
        self.fever_until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn model() -> ComboModel {
        ComboModel::new(ComboConfig::default())
    }

    #[test]
    fn test_tiers_fire_once_per_crossing() {
        let mut combo = model();
        let mut tiers = Vec::new();
        for i in 0..12 {
            for event in combo.register_hit(1, i * 100) {
                if let ComboEvent::TierReached { tier, .. } = event {
                    tiers.push(tier);
                }
            }
            assert!(combo.update(i * 100 + 50).is_empty());
        }
        assert_eq!(tiers, vec![ComboTier::Low, ComboTier::Mid]);
    }

    #[test]
    fn test_bonus_gain_crosses_multiple_tiers() {
        let mut combo = model();
        combo.register_hit(4, 0);
        let events = combo.register_hit(7, 10);
        // 4 -> 11 crosses low (5) and mid (10)
        assert_eq!(
            events,
            vec![
                ComboEvent::TierReached {
                    tier: ComboTier::Low,
                    streak: 11
                },
                ComboEvent::TierReached {
                    tier: ComboTier::Mid,
                    streak: 11
                },
            ]
        );
    }

    #[test]
    fn test_fever_expiry_resets_streak() {
        let mut combo = model();
        for i in 0..15 {
            combo.register_hit(1, i * 100);
        }
        assert!(combo.fever_active(1_400));
        assert_eq!(combo.reward_multiplier(1_400), 2.0);

        // Keep hitting so idle never triggers; fever still ends on its own clock
        let fever_end = combo.fever_until().unwrap();
        let mut t = 1_500;
        while t < fever_end {
            combo.register_hit(1, t);
            t += 1_000;
        }
        let events = combo.update(fever_end);
        assert_eq!(events[0], ComboEvent::FeverEnded);
        assert!(matches!(
            events[1],
            ComboEvent::Reset {
                reason: ResetReason::FeverExpired,
                ..
            }
        ));
        assert_eq!(combo.streak(), 0);
        assert_eq!(combo.reward_multiplier(fever_end), 1.0);
    }

    #[test]
    fn test_fever_survives_miss() {
        let mut combo = model();
        for i in 0..15 {
            combo.register_hit(1, i * 100);
        }
        combo.register_miss();
        assert_eq!(combo.streak(), 0);
        assert!(combo.fever_active(1_500));
    }

    #[test]
    fn test_idle_window_resets() {
        let mut combo = model();
        combo.register_hit(1, 1_000);
        combo.register_hit(1, 2_000);
        assert!(combo.update(2_000 + COMBO_IDLE - 1).is_empty());
        let events = combo.update(2_000 + COMBO_IDLE);
        assert_eq!(
            events,
            vec![ComboEvent::Reset {
                from: 2,
                reason: ResetReason::Idle
            }]
        );
        assert_eq!(combo.best_streak(), 2);
    }

    const COMBO_IDLE: u64 = crate::consts::COMBO_IDLE_WINDOW_MS;

    #[test]
    fn test_miss_on_zero_streak_is_silent() {
        let mut combo = model();
        assert!(combo.register_miss().is_none());
    }

    #[test]
    fn test_spawn_interval_factor_by_state() {
        let spawn = SpawnConfig::default();
        let mut combo = model();
        assert_eq!(combo.spawn_interval_factor(0, &spawn), 1.0);
        for i in 0..10 {
            combo.register_hit(1, i);
        }
        assert_eq!(combo.spawn_interval_factor(10, &spawn), spawn.high_combo_interval_factor);
        for i in 10..15 {
            combo.register_hit(1, i);
        }
        assert_eq!(combo.spawn_interval_factor(15, &spawn), spawn.fever_interval_factor);
    }

    proptest! {
        #[test]
        fn prop_streak_counts_consecutive_hits(gaps in prop::collection::vec(0u64..2_000, 1..200)) {
            let mut combo = ComboModel::new(ComboConfig {
                fever_duration_ms: u64::MAX / 4,
                ..ComboConfig::default()
            });
            let mut now = 0;
            for gap in &gaps {
                now += gap;
                combo.update(now);
                combo.register_hit(1, now);
            }
            prop_assert_eq!(combo.streak(), gaps.len() as u32);

            combo.register_miss();
            prop_assert_eq!(combo.streak(), 0);
        }
    }
}
