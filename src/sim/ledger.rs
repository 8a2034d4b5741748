//! Score, currency and the depleting resource

use serde::{Deserialize, Serialize};

use super::effects::EffectKind;
use super::entity::{EntityKind, UtilityKind};
use crate::config::{DepletingConfig, GameConfig, KindTable, Rewards};

/// The session-ending counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Depleting {
    Lives { remaining: u32 },
    /// Absolute world-clock deadline
    Clock { deadline_ms: u64 },
}

/// Ledger mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerHit {
    /// Player struck an entity (non-hazard)
    Struck(EntityKind),
    /// Final blow on a boss
    BossDefeated,
    /// Unabsorbed hazard contact
    HazardHit,
    /// Unabsorbed breach of the protected zone
    Breach,
}

/// Outcome of one ledger mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerSignal {
    pub score_delta: i64,
    pub currency_delta: u32,
    /// The depleting resource has reached its terminal value
    pub exhausted: bool,
}

/// What a utility pickup turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtilityGrant {
    TimeAdded(u64),
    LifeAdded,
    /// Caller applies the timed effect
    Effect(EffectKind),
    /// Pickup has no meaning for this session (e.g. extra time with lives)
    Wasted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceLedger {
    score: u64,
    currency: u32,
    currency_cap: Option<u32>,
    depleting: Depleting,
    closed: bool,
}

impl ResourceLedger {
    pub fn new(config: &GameConfig) -> Self {
        let depleting = match config.depleting {
            DepletingConfig::Lives { count } => Depleting::Lives { remaining: count },
            DepletingConfig::Clock { duration_ms } => Depleting::Clock {
                deadline_ms: duration_ms,
            },
        };
        Self {
            score: 0,
            currency: 0,
            currency_cap: config.currency_cap,
            depleting,
            closed: false,
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn currency(&self) -> u32 {
        self.currency
    }

    pub fn depleting(&self) -> Depleting {
        self.depleting
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn lives(&self) -> Option<u32> {
        match self.depleting {
            Depleting::Lives { remaining } => Some(remaining),
            Depleting::Clock { .. } => None,
        }
    }

    pub fn time_remaining_ms(&self, world_ms: u64) -> Option<u64> {
        match self.depleting {
            Depleting::Clock { deadline_ms } => Some(deadline_ms.saturating_sub(world_ms)),
            Depleting::Lives { .. } => None,
        }
    }

    pub fn is_exhausted(&self, world_ms: u64) -> bool {
        match self.depleting {
            Depleting::Lives { remaining } => remaining == 0,
            Depleting::Clock { deadline_ms } => world_ms >= deadline_ms,
        }
    }

    /// Any reward worth submitting
    pub fn has_reward(&self) -> bool {
        self.score > 0 || self.currency > 0
    }

    /// Freeze the ledger; later mutations are ignored
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Single mutation entrypoint for combat outcomes
    pub fn apply_hit(
        &mut self,
        hit: LedgerHit,
        kinds: &KindTable,
        rewards: &Rewards,
        multiplier: f32,
        world_ms: u64,
    ) -> LedgerSignal {
        if self.closed {
            return LedgerSignal {
                exhausted: self.is_exhausted(world_ms),
                ..Default::default()
            };
        }

        let (score_delta, currency_delta) = match hit {
            LedgerHit::Struck(EntityKind::Hazard) | LedgerHit::HazardHit => {
                self.spend_depleting(rewards.hazard_time_penalty_ms);
                (self.penalize(rewards.hazard_penalty), 0)
            }
            LedgerHit::Struck(kind) => {
                let rule = kinds.rule(kind);
                let score = scale(rule.score, multiplier);
                let currency = self.add_currency(scale(rule.currency as u64, multiplier) as u32);
                self.score += score;
                (score as i64, currency)
            }
            LedgerHit::BossDefeated => {
                let score = scale(rewards.boss_defeat_score, multiplier);
                let currency =
                    self.add_currency(scale(rewards.boss_defeat_currency as u64, multiplier) as u32);
                self.score += score;
                (score as i64, currency)
            }
            LedgerHit::Breach => {
                self.spend_depleting(0);
                (self.penalize(rewards.breach_penalty), 0)
            }
        };

        LedgerSignal {
            score_delta,
            currency_delta,
            exhausted: self.is_exhausted(world_ms),
        }
    }

    /// Non-combat pickups. No-op once the ledger is closed.
    pub fn grant_utility(
        &mut self,
        kind: UtilityKind,
        rewards: &Rewards,
    ) -> Option<UtilityGrant> {
        if self.closed {
            return None;
        }

        let grant = match kind {
            UtilityKind::ExtraTime => match &mut self.depleting {
                Depleting::Clock { deadline_ms } => {
                    *deadline_ms += rewards.extra_time_ms;
                    UtilityGrant::TimeAdded(rewards.extra_time_ms)
                }
                Depleting::Lives { .. } => UtilityGrant::Wasted,
            },
            UtilityKind::ExtraLife => match &mut self.depleting {
                Depleting::Lives { remaining } if *remaining < rewards.max_lives => {
                    *remaining += 1;
                    UtilityGrant::LifeAdded
                }
                _ => UtilityGrant::Wasted,
            },
            UtilityKind::Shield => UtilityGrant::Effect(EffectKind::Shield),
            UtilityKind::Freeze => UtilityGrant::Effect(EffectKind::Freeze),
            UtilityKind::Slow => UtilityGrant::Effect(EffectKind::Slow),
            UtilityKind::AutoAction => UtilityGrant::Effect(EffectKind::AutoAction),
            UtilityKind::Multiplier => UtilityGrant::Effect(EffectKind::Multiplier),
        };
        Some(grant)
    }

    /// Remove score, clamped at zero. Returns the signed delta actually applied.
    fn penalize(&mut self, penalty: u64) -> i64 {
        let before = self.score;
        self.score = self.score.saturating_sub(penalty);
        self.score as i64 - before as i64
    }

    fn add_currency(&mut self, amount: u32) -> u32 {
        let before = self.currency;
        let raised = self.currency.saturating_add(amount);
        self.currency = match self.currency_cap {
            Some(cap) => raised.min(cap.max(before)),
            None => raised,
        };
        self.currency - before
    }

    /// Lose a life, or pull the clock deadline in by `time_penalty_ms`
    fn spend_depleting(&mut self, time_penalty_ms: u64) {
        match &mut self.depleting {
            Depleting::Lives { remaining } => *remaining = remaining.saturating_sub(1),
            Depleting::Clock { deadline_ms } => {
                *deadline_ms = deadline_ms.saturating_sub(time_penalty_ms)
            }
        }
    }
}

fn scale(amount: u64, multiplier: f32) -> u64 {
    (amount as f64 * multiplier as f64).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GamePreset;

    fn lives_config() -> GameConfig {
        let mut config = GamePreset::CityDefender.config();
        config.depleting = DepletingConfig::Lives { count: 3 };
        config.rewards.hazard_penalty = 20;
        config
    }

    #[test]
    fn test_hazard_penalty_clamps_at_zero() {
        let config = lives_config();
        let mut ledger = ResourceLedger::new(&config);
        ledger.score = 5;
        let signal = ledger.apply_hit(
            LedgerHit::HazardHit,
            &config.kinds,
            &config.rewards,
            1.0,
            0,
        );
        assert_eq!(ledger.score(), 0);
        assert_eq!(signal.score_delta, -5);
        assert_eq!(ledger.lives(), Some(2));
        assert!(!signal.exhausted);
    }

    #[test]
    fn test_last_life_signals_exhaustion() {
        let config = lives_config();
        let mut ledger = ResourceLedger::new(&config);
        for _ in 0..2 {
            ledger.apply_hit(LedgerHit::Breach, &config.kinds, &config.rewards, 1.0, 0);
        }
        let signal = ledger.apply_hit(LedgerHit::Breach, &config.kinds, &config.rewards, 1.0, 0);
        assert!(signal.exhausted);
        assert_eq!(ledger.lives(), Some(0));
    }

    #[test]
    fn test_reward_scaled_by_multiplier() {
        let config = lives_config();
        let mut ledger = ResourceLedger::new(&config);
        let signal = ledger.apply_hit(
            LedgerHit::Struck(EntityKind::Primary),
            &config.kinds,
            &config.rewards,
            2.0,
            0,
        );
        assert_eq!(signal.score_delta, (config.kinds.primary.score * 2) as i64);
    }

    #[test]
    fn test_currency_respects_cap() {
        let mut config = lives_config();
        config.currency_cap = Some(3);
        config.kinds.currency.currency = 2;
        let mut ledger = ResourceLedger::new(&config);
        let kind = LedgerHit::Struck(EntityKind::Currency);
        ledger.apply_hit(kind, &config.kinds, &config.rewards, 1.0, 0);
        let signal = ledger.apply_hit(kind, &config.kinds, &config.rewards, 1.0, 0);
        assert_eq!(ledger.currency(), 3);
        assert_eq!(signal.currency_delta, 1);
    }

    #[test]
    fn test_extra_time_moves_deadline() {
        let config = GamePreset::WhackAMole.config();
        let mut ledger = ResourceLedger::new(&config);
        assert_eq!(ledger.time_remaining_ms(10_000), Some(50_000));
        let grant = ledger.grant_utility(UtilityKind::ExtraTime, &config.rewards);
        assert_eq!(grant, Some(UtilityGrant::TimeAdded(5_000)));
        assert_eq!(ledger.time_remaining_ms(10_000), Some(55_000));
        assert!(!ledger.is_exhausted(64_999));
        assert!(ledger.is_exhausted(65_000));
    }

    #[test]
    fn test_grant_after_close_is_noop() {
        let config = GamePreset::WhackAMole.config();
        let mut ledger = ResourceLedger::new(&config);
        ledger.close();
        assert_eq!(ledger.grant_utility(UtilityKind::ExtraTime, &config.rewards), None);
        assert_eq!(ledger.grant_utility(UtilityKind::ExtraTime, &config.rewards), None);
        assert_eq!(ledger.time_remaining_ms(0), Some(60_000));

        let signal = ledger.apply_hit(
            LedgerHit::Struck(EntityKind::Primary),
            &config.kinds,
            &config.rewards,
            1.0,
            0,
        );
        assert_eq!(signal.score_delta, 0);
        assert_eq!(ledger.score(), 0);
    }

    #[test]
    fn test_extra_life_capped() {
        let config = lives_config();
        let mut ledger = ResourceLedger::new(&config);
        ledger.grant_utility(UtilityKind::ExtraLife, &config.rewards);
        ledger.grant_utility(UtilityKind::ExtraLife, &config.rewards);
        let grant = ledger.grant_utility(UtilityKind::ExtraLife, &config.rewards);
        assert_eq!(ledger.lives(), Some(config.rewards.max_lives));
        assert_eq!(grant, Some(UtilityGrant::Wasted));
    }
}
