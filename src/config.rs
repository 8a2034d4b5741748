//! Per-game configuration
//!
//! One engine serves every mini-game; what differs between them is data:
//! layout, depleting resource, per-kind rules, spawn curve, combo tiers and
//! effect durations. Presets are plain `GameConfig` values.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{COMBO_IDLE_WINDOW_MS, COMBO_THRESHOLDS, SLOW_FACTOR};
use crate::error::ConfigError;
use crate::sim::{EntityKind, UtilityKind};

/// Built-in game presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GamePreset {
    #[default]
    WhackAMole,
    SpaceInvaders,
    CityDefender,
}

impl GamePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePreset::WhackAMole => "whack-a-mole",
            GamePreset::SpaceInvaders => "space-invaders",
            GamePreset::CityDefender => "city-defender",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "whack-a-mole" | "whack" | "moles" => Some(GamePreset::WhackAMole),
            "space-invaders" | "invaders" => Some(GamePreset::SpaceInvaders),
            "city-defender" | "defender" => Some(GamePreset::CityDefender),
            _ => None,
        }
    }

    /// Full configuration for this preset
    pub fn config(&self) -> GameConfig {
        match self {
            GamePreset::WhackAMole => whack_a_mole(),
            GamePreset::SpaceInvaders => space_invaders(),
            GamePreset::CityDefender => city_defender(),
        }
    }
}

/// Playfield bounds. Y grows toward the protected zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    /// Entities reaching this line are "in the danger zone"
    pub danger_y: Option<f32>,
}

/// Where entities appear
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnLayout {
    /// Fixed grid of holes; at most one entity per slot
    Slots { count: u32, columns: u32, cell: f32 },
    /// Entities enter along the top edge and travel toward the danger zone
    Lane { margin: f32, max_live: usize },
}

/// The resource whose exhaustion ends the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepletingConfig {
    Lives { count: u32 },
    Clock { duration_ms: u64 },
}

/// What touching the player's body does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Contact {
    #[default]
    Ignore,
    Harm,
    Collect,
}

/// What happens when a breaching entity reaches the danger zone unblocked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BreachRule {
    #[default]
    LoseLife,
    EndSession,
}

/// Game-specific completion predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VictoryRule {
    #[default]
    None,
    ReachScore { score: u64 },
    ClearQuota { primaries: u32 },
}

/// Behaviour shared by every entity of one kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KindRule {
    /// Relative spawn weight (0 disables)
    pub weight: f32,
    /// Base speed toward the danger zone (units/s)
    pub speed: f32,
    /// Collision radius
    pub radius: f32,
    /// Score awarded when struck (before multipliers)
    pub score: u64,
    /// Currency awarded when struck
    pub currency: u32,
    /// Streak increment when struck
    pub combo_gain: u32,
    /// Reaching the danger zone damages the ledger
    pub breaches: bool,
    pub contact: Contact,
}

impl Default for KindRule {
    fn default() -> Self {
        Self {
            weight: 0.0,
            speed: 0.0,
            radius: 20.0,
            score: 0,
            currency: 0,
            combo_gain: 0,
            breaches: false,
            contact: Contact::Ignore,
        }
    }
}

/// Spawn weight for one utility flavour
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UtilityWeight {
    pub kind: UtilityKind,
    pub weight: f32,
}

/// Per-kind rule table
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KindTable {
    pub primary: KindRule,
    pub bonus: KindRule,
    pub hazard: KindRule,
    pub currency: KindRule,
    /// Motion/size for every utility; weights come from `utilities`
    pub utility: KindRule,
    pub utilities: Vec<UtilityWeight>,
    pub boss: KindRule,
}

impl KindTable {
    pub fn rule(&self, kind: EntityKind) -> &KindRule {
        match kind {
            EntityKind::Primary => &self.primary,
            EntityKind::Bonus => &self.bonus,
            EntityKind::Hazard => &self.hazard,
            EntityKind::Currency => &self.currency,
            EntityKind::Utility(_) => &self.utility,
            EntityKind::Boss => &self.boss,
        }
    }

    fn total_weight(&self) -> f32 {
        self.primary.weight
            + self.bonus.weight
            + self.hazard.weight
            + self.currency.weight
            + self.boss.weight
            + self.utilities.iter().map(|u| u.weight).sum::<f32>()
    }
}

/// Penalties and one-off rewards not tied to a single kind rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Rewards {
    /// Score removed by an unabsorbed hazard hit (score clamps at 0)
    pub hazard_penalty: u64,
    /// Score removed by an unabsorbed breach
    pub breach_penalty: u64,
    /// Countdown removed by an unabsorbed hazard hit (clock sessions)
    pub hazard_time_penalty_ms: u64,
    pub boss_defeat_score: u64,
    pub boss_defeat_currency: u32,
    /// Countdown added by an extra-time utility
    pub extra_time_ms: u64,
    /// Cap for extra-life utilities
    pub max_lives: u32,
}

impl Default for Rewards {
    fn default() -> Self {
        Self {
            hazard_penalty: 20,
            breach_penalty: 0,
            hazard_time_penalty_ms: 0,
            boss_defeat_score: 500,
            boss_defeat_currency: 5,
            extra_time_ms: 5_000,
            max_lives: 5,
        }
    }
}

/// Spawn cadence, lifetime and difficulty curve
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Delay before the first spawn
    pub initial_delay_ms: u64,
    pub base_interval_ms: u64,
    /// Floor the interval never drops below
    pub min_interval_ms: u64,
    /// Interval multiplier per level above 1
    pub level_interval_factor: f32,
    pub base_lifetime_ms: u64,
    pub min_lifetime_ms: u64,
    /// Lifetime multiplier per level above 1
    pub level_lifetime_factor: f32,
    /// Speed increase per level above 1 (fraction of base)
    pub level_speed_step: f32,
    /// Interval multiplier during fever (> 1 slows spawning)
    pub fever_interval_factor: f32,
    /// Interval multiplier at mid-tier streaks outside fever (< 1 speeds it up)
    pub high_combo_interval_factor: f32,
    /// Weight multiplier for bonus/currency kinds during fever
    pub fever_bias: f32,
    /// Forbid two currency spawns in a row
    pub anti_farming: bool,
    pub boss_min_level: u32,
    pub boss_hit_points: u32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 600,
            base_interval_ms: 1_000,
            min_interval_ms: 350,
            level_interval_factor: 0.9,
            base_lifetime_ms: 1_500,
            min_lifetime_ms: 600,
            level_lifetime_factor: 0.92,
            level_speed_step: 0.1,
            fever_interval_factor: 1.5,
            high_combo_interval_factor: 0.85,
            fever_bias: 4.0,
            anti_farming: true,
            boss_min_level: 3,
            boss_hit_points: 5,
        }
    }
}

/// Combo tiers and fever mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboConfig {
    pub idle_window_ms: u64,
    /// Low, mid and high (fever) thresholds, strictly increasing
    pub thresholds: [u32; 3],
    pub fever_duration_ms: u64,
    pub fever_multiplier: f32,
    /// Speed increase per streak point (fraction of base)
    pub streak_speed_step: f32,
    /// Cap on the streak speed bonus
    pub max_streak_speed_bonus: f32,
}

impl Default for ComboConfig {
    fn default() -> Self {
        Self {
            idle_window_ms: COMBO_IDLE_WINDOW_MS,
            thresholds: COMBO_THRESHOLDS,
            fever_duration_ms: 6_000,
            fever_multiplier: 2.0,
            streak_speed_step: 0.02,
            max_streak_speed_bonus: 0.3,
        }
    }
}

/// Durations of timed effects
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectDurations {
    /// Backstop; shields are normally consumed by a hit
    pub shield_ms: u64,
    pub freeze_ms: u64,
    pub slow_ms: u64,
    pub auto_action_ms: u64,
    pub multiplier_ms: u64,
    pub multiplier_factor: f32,
}

impl Default for EffectDurations {
    fn default() -> Self {
        Self {
            shield_ms: 15_000,
            freeze_ms: 3_000,
            slow_ms: 5_000,
            auto_action_ms: 4_000,
            multiplier_ms: 8_000,
            multiplier_factor: 2.0,
        }
    }
}

/// Optional controllable body (shooters, catchers)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub start: Vec2,
    /// Horizontal speed at full input (units/s)
    pub speed: f32,
    pub radius: f32,
    pub projectile_speed: f32,
    pub projectile_radius: f32,
    pub fire_cooldown_ms: u64,
}

/// Complete configuration for one mini-game
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Identifier sent to the score service
    pub game_id: String,
    pub arena: Arena,
    pub layout: SpawnLayout,
    pub depleting: DepletingConfig,
    pub currency_cap: Option<u32>,
    pub kinds: KindTable,
    pub rewards: Rewards,
    pub spawn: SpawnConfig,
    pub combo: ComboConfig,
    pub effects: EffectDurations,
    pub player: Option<PlayerConfig>,
    pub breach: BreachRule,
    pub victory: VictoryRule,
    /// Tapping a vacant slot/point counts as a combo-breaking miss
    pub empty_tap_resets_combo: bool,
    /// Length of the optional intro phase (0 = straight to ready)
    pub intro_ms: u64,
    pub points_per_level: u64,
    pub max_level: u32,
    /// Pointer hit radius for point taps
    pub tap_radius: f32,
    pub auto_action_interval_ms: u64,
    pub slow_factor: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        whack_a_mole()
    }
}

impl GameConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations the engine cannot run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game_id.trim().is_empty() {
            return Err(ConfigError::invalid("game_id", "must not be empty"));
        }
        if self.arena.width <= 0.0 || self.arena.height <= 0.0 {
            return Err(ConfigError::invalid("arena", "width and height must be positive"));
        }
        match self.layout {
            SpawnLayout::Slots { count, columns, cell } => {
                if count == 0 || columns == 0 || cell <= 0.0 {
                    return Err(ConfigError::invalid(
                        "layout",
                        "slot count, columns and cell size must be positive",
                    ));
                }
            }
            SpawnLayout::Lane { max_live, margin } => {
                if max_live == 0 {
                    return Err(ConfigError::invalid("layout", "max_live must be positive"));
                }
                if margin * 2.0 >= self.arena.width {
                    return Err(ConfigError::invalid("layout", "margin leaves no lane"));
                }
            }
        }
        match self.depleting {
            DepletingConfig::Lives { count: 0 } => {
                return Err(ConfigError::invalid("depleting", "need at least one life"));
            }
            DepletingConfig::Clock { duration_ms: 0 } => {
                return Err(ConfigError::invalid("depleting", "clock duration must be positive"));
            }
            _ => {}
        }
        if self.kinds.total_weight() <= 0.0 {
            return Err(ConfigError::invalid("kinds", "at least one kind needs a positive weight"));
        }
        let [low, mid, high] = self.combo.thresholds;
        if low == 0 || low >= mid || mid >= high {
            return Err(ConfigError::invalid(
                "combo.thresholds",
                format!("must be positive and strictly increasing, got {low}/{mid}/{high}"),
            ));
        }
        if self.spawn.min_interval_ms == 0 || self.spawn.min_interval_ms > self.spawn.base_interval_ms {
            return Err(ConfigError::invalid(
                "spawn.min_interval_ms",
                "must be positive and no larger than base_interval_ms",
            ));
        }
        if self.spawn.min_lifetime_ms > self.spawn.base_lifetime_ms {
            return Err(ConfigError::invalid(
                "spawn.min_lifetime_ms",
                "must be no larger than base_lifetime_ms",
            ));
        }
        if self.spawn.boss_hit_points == 0 {
            return Err(ConfigError::invalid("spawn.boss_hit_points", "must be positive"));
        }
        if self.points_per_level == 0 || self.max_level == 0 {
            return Err(ConfigError::invalid("points_per_level", "levels need a positive step and cap"));
        }
        if !(0.0..=1.0).contains(&self.slow_factor) {
            return Err(ConfigError::invalid("slow_factor", "must be within 0..=1"));
        }
        if self.combo.fever_multiplier <= 0.0 {
            return Err(ConfigError::invalid("combo.fever_multiplier", "must be positive"));
        }
        if self.spawn.fever_interval_factor <= 0.0 || self.spawn.high_combo_interval_factor <= 0.0 {
            return Err(ConfigError::invalid(
                "spawn.fever_interval_factor",
                "interval factors must be positive",
            ));
        }
        if self.victory == (VictoryRule::ClearQuota { primaries: 0 }) {
            return Err(ConfigError::invalid("victory", "quota needs at least one primary"));
        }
        Ok(())
    }

    /// Level for a given score
    pub fn level_for_score(&self, score: u64) -> u32 {
        let level = 1 + score / self.points_per_level;
        level.min(self.max_level as u64) as u32
    }
}

fn whack_a_mole() -> GameConfig {
    GameConfig {
        game_id: "whack-a-mole".to_string(),
        arena: Arena {
            width: 300.0,
            height: 300.0,
            danger_y: None,
        },
        layout: SpawnLayout::Slots {
            count: 9,
            columns: 3,
            cell: 100.0,
        },
        depleting: DepletingConfig::Clock { duration_ms: 60_000 },
        currency_cap: Some(99),
        kinds: KindTable {
            primary: KindRule {
                weight: 70.0,
                radius: 40.0,
                score: 10,
                combo_gain: 1,
                ..Default::default()
            },
            bonus: KindRule {
                weight: 8.0,
                radius: 40.0,
                score: 30,
                combo_gain: 2,
                ..Default::default()
            },
            hazard: KindRule {
                weight: 15.0,
                radius: 40.0,
                ..Default::default()
            },
            currency: KindRule {
                weight: 7.0,
                radius: 40.0,
                currency: 1,
                combo_gain: 1,
                ..Default::default()
            },
            utility: KindRule {
                radius: 40.0,
                ..Default::default()
            },
            utilities: vec![
                UtilityWeight {
                    kind: UtilityKind::ExtraTime,
                    weight: 3.0,
                },
                UtilityWeight {
                    kind: UtilityKind::Freeze,
                    weight: 2.0,
                },
                UtilityWeight {
                    kind: UtilityKind::Shield,
                    weight: 2.0,
                },
            ],
            boss: KindRule {
                weight: 3.0,
                radius: 45.0,
                score: 5,
                combo_gain: 1,
                ..Default::default()
            },
        },
        rewards: Rewards {
            hazard_penalty: 20,
            hazard_time_penalty_ms: 2_000,
            boss_defeat_score: 200,
            boss_defeat_currency: 3,
            ..Default::default()
        },
        spawn: SpawnConfig {
            initial_delay_ms: 500,
            base_interval_ms: 900,
            min_interval_ms: 350,
            base_lifetime_ms: 1_400,
            min_lifetime_ms: 600,
            ..Default::default()
        },
        combo: ComboConfig::default(),
        effects: EffectDurations::default(),
        player: None,
        breach: BreachRule::LoseLife,
        victory: VictoryRule::None,
        empty_tap_resets_combo: false,
        intro_ms: 0,
        points_per_level: 150,
        max_level: 10,
        tap_radius: 45.0,
        auto_action_interval_ms: 400,
        slow_factor: SLOW_FACTOR,
    }
}

fn space_invaders() -> GameConfig {
    GameConfig {
        game_id: "space-invaders".to_string(),
        arena: Arena {
            width: 480.0,
            height: 640.0,
            danger_y: Some(560.0),
        },
        layout: SpawnLayout::Lane {
            margin: 24.0,
            max_live: 24,
        },
        depleting: DepletingConfig::Lives { count: 3 },
        currency_cap: Some(250),
        kinds: KindTable {
            primary: KindRule {
                weight: 70.0,
                speed: 40.0,
                radius: 14.0,
                score: 10,
                combo_gain: 1,
                breaches: true,
                contact: Contact::Harm,
                ..Default::default()
            },
            bonus: KindRule {
                weight: 6.0,
                speed: 90.0,
                radius: 16.0,
                score: 50,
                combo_gain: 2,
                ..Default::default()
            },
            hazard: KindRule {
                weight: 18.0,
                speed: 160.0,
                radius: 6.0,
                contact: Contact::Harm,
                ..Default::default()
            },
            currency: KindRule {
                weight: 6.0,
                speed: 80.0,
                radius: 10.0,
                currency: 1,
                combo_gain: 1,
                contact: Contact::Collect,
                ..Default::default()
            },
            utility: KindRule {
                speed: 70.0,
                radius: 12.0,
                contact: Contact::Collect,
                ..Default::default()
            },
            utilities: vec![
                UtilityWeight {
                    kind: UtilityKind::Shield,
                    weight: 2.0,
                },
                UtilityWeight {
                    kind: UtilityKind::Slow,
                    weight: 2.0,
                },
                UtilityWeight {
                    kind: UtilityKind::AutoAction,
                    weight: 1.0,
                },
                UtilityWeight {
                    kind: UtilityKind::ExtraLife,
                    weight: 0.5,
                },
            ],
            boss: KindRule {
                weight: 2.0,
                speed: 15.0,
                radius: 40.0,
                score: 5,
                combo_gain: 1,
                breaches: true,
                contact: Contact::Harm,
                ..Default::default()
            },
        },
        rewards: Rewards {
            hazard_penalty: 25,
            breach_penalty: 50,
            boss_defeat_score: 500,
            boss_defeat_currency: 5,
            max_lives: 5,
            ..Default::default()
        },
        spawn: SpawnConfig {
            initial_delay_ms: 1_000,
            base_interval_ms: 1_100,
            min_interval_ms: 400,
            base_lifetime_ms: 20_000,
            min_lifetime_ms: 12_000,
            level_speed_step: 0.12,
            boss_min_level: 3,
            boss_hit_points: 8,
            ..Default::default()
        },
        combo: ComboConfig {
            idle_window_ms: 2_500,
            ..Default::default()
        },
        effects: EffectDurations::default(),
        player: Some(PlayerConfig {
            start: Vec2::new(240.0, 600.0),
            speed: 300.0,
            radius: 16.0,
            projectile_speed: 520.0,
            projectile_radius: 4.0,
            fire_cooldown_ms: 280,
        }),
        breach: BreachRule::EndSession,
        victory: VictoryRule::ClearQuota { primaries: 60 },
        empty_tap_resets_combo: false,
        intro_ms: 1_500,
        points_per_level: 200,
        max_level: 8,
        tap_radius: 20.0,
        auto_action_interval_ms: 350,
        slow_factor: SLOW_FACTOR,
    }
}

fn city_defender() -> GameConfig {
    GameConfig {
        game_id: "city-defender".to_string(),
        arena: Arena {
            width: 640.0,
            height: 480.0,
            danger_y: Some(440.0),
        },
        layout: SpawnLayout::Lane {
            margin: 30.0,
            max_live: 16,
        },
        depleting: DepletingConfig::Lives { count: 5 },
        currency_cap: None,
        kinds: KindTable {
            primary: KindRule {
                weight: 75.0,
                speed: 60.0,
                radius: 18.0,
                score: 15,
                combo_gain: 1,
                breaches: true,
                ..Default::default()
            },
            bonus: KindRule {
                weight: 5.0,
                speed: 110.0,
                radius: 16.0,
                score: 40,
                combo_gain: 2,
                ..Default::default()
            },
            hazard: KindRule {
                weight: 12.0,
                speed: 50.0,
                radius: 18.0,
                ..Default::default()
            },
            currency: KindRule {
                weight: 8.0,
                speed: 70.0,
                radius: 14.0,
                currency: 2,
                combo_gain: 1,
                ..Default::default()
            },
            utility: KindRule {
                speed: 55.0,
                radius: 16.0,
                ..Default::default()
            },
            utilities: vec![
                UtilityWeight {
                    kind: UtilityKind::Shield,
                    weight: 2.0,
                },
                UtilityWeight {
                    kind: UtilityKind::Slow,
                    weight: 1.5,
                },
                UtilityWeight {
                    kind: UtilityKind::Freeze,
                    weight: 1.0,
                },
                UtilityWeight {
                    kind: UtilityKind::Multiplier,
                    weight: 1.0,
                },
            ],
            boss: KindRule {
                weight: 1.5,
                speed: 20.0,
                radius: 36.0,
                score: 5,
                combo_gain: 1,
                breaches: true,
                ..Default::default()
            },
        },
        rewards: Rewards {
            hazard_penalty: 30,
            breach_penalty: 10,
            boss_defeat_score: 400,
            boss_defeat_currency: 6,
            ..Default::default()
        },
        spawn: SpawnConfig {
            initial_delay_ms: 800,
            base_interval_ms: 1_200,
            min_interval_ms: 380,
            base_lifetime_ms: 15_000,
            min_lifetime_ms: 9_000,
            boss_min_level: 4,
            boss_hit_points: 6,
            ..Default::default()
        },
        combo: ComboConfig::default(),
        effects: EffectDurations::default(),
        player: None,
        breach: BreachRule::LoseLife,
        victory: VictoryRule::None,
        empty_tap_resets_combo: true,
        intro_ms: 0,
        points_per_level: 250,
        max_level: 10,
        tap_radius: 30.0,
        auto_action_interval_ms: 500,
        slow_factor: SLOW_FACTOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        for preset in [
            GamePreset::WhackAMole,
            GamePreset::SpaceInvaders,
            GamePreset::CityDefender,
        ] {
            let config = preset.config();
            assert!(config.validate().is_ok(), "{} invalid", preset.as_str());
            assert_eq!(GamePreset::from_str(preset.as_str()), Some(preset));
        }
    }

    #[test]
    fn test_json_overrides_merge_with_defaults() {
        let json = r#"{
            "game_id": "moles-lite",
            "depleting": { "clock": { "duration_ms": 30000 } },
            "empty_tap_resets_combo": true
        }"#;
        let config = GameConfig::from_json(json).unwrap();
        assert_eq!(config.game_id, "moles-lite");
        assert_eq!(config.depleting, DepletingConfig::Clock { duration_ms: 30_000 });
        assert!(config.empty_tap_resets_combo);
        // Untouched fields come from the default preset
        assert_eq!(config.combo.thresholds, [5, 10, 15]);
    }

    #[test]
    fn test_rejects_non_increasing_thresholds() {
        let mut config = GamePreset::WhackAMole.config();
        config.combo.thresholds = [5, 5, 15];
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "combo.thresholds",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_floor_above_base() {
        let mut config = GamePreset::CityDefender.config();
        config.spawn.min_interval_ms = config.spawn.base_interval_ms + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_quota_and_non_positive_factors() {
        let mut config = GamePreset::SpaceInvaders.config();
        config.victory = VictoryRule::ClearQuota { primaries: 0 };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "victory", .. })
        ));

        let mut config = GamePreset::WhackAMole.config();
        config.combo.fever_multiplier = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "combo.fever_multiplier",
                ..
            })
        ));

        let mut config = GamePreset::WhackAMole.config();
        config.spawn.fever_interval_factor = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "spawn.fever_interval_factor",
                ..
            })
        ));
    }

    #[test]
    fn test_level_for_score_is_capped() {
        let config = GamePreset::WhackAMole.config();
        assert_eq!(config.level_for_score(0), 1);
        assert_eq!(config.level_for_score(149), 1);
        assert_eq!(config.level_for_score(150), 2);
        assert_eq!(config.level_for_score(1_000_000), config.max_level);
    }

    #[test]
    fn test_round_trips_through_json() {
        let config = GamePreset::SpaceInvaders.config();
        let json = config.to_json().unwrap();
        let parsed = GameConfig::from_json(&json).unwrap();
        assert_eq!(parsed.game_id, "space-invaders");
        assert_eq!(parsed.victory, VictoryRule::ClearQuota { primaries: 60 });
    }
}
