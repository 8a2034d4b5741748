//! Spawn scheduling
//!
//! Decides when something appears and what it is. Cadence runs on the world
//! timeline so freeze and pause suspend it; after a late frame the next
//! deadline is set from "now", never caught up with a burst.

use glam::Vec2;
use rand::Rng;
use rand::distr::weighted::WeightedIndex;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind};
use crate::config::{GameConfig, SpawnLayout, VictoryRule};

/// Session state the scheduler conditions on
#[derive(Debug, Clone, Copy)]
pub struct SpawnContext {
    pub world_ms: u64,
    pub level: u32,
    pub fever: bool,
    /// Combo-driven interval scaling
    pub interval_factor: f32,
    /// Combo-driven speed scaling
    pub speed_factor: f32,
}

/// Everything needed to materialise an entity (id assigned by the session)
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnPlan {
    pub kind: EntityKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub slot: Option<u32>,
    pub expires_at: Option<u64>,
    pub hit_points: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpawnScheduler {
    /// World-clock time of the next attempt; `None` when stopped
    next_spawn_at: Option<u64>,
    last_kind: Option<EntityKind>,
    spawned: u64,
    primaries_spawned: u32,
}

impl SpawnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, world_ms: u64, initial_delay_ms: u64) {
        self.next_spawn_at = Some(world_ms + initial_delay_ms);
    }

    /// Cancel the pending attempt
    pub fn stop(&mut self) {
        self.next_spawn_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_spawn_at.is_some()
    }

    pub fn next_spawn_at(&self) -> Option<u64> {
        self.next_spawn_at
    }

    pub fn last_kind(&self) -> Option<EntityKind> {
        self.last_kind
    }

    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    pub fn primaries_spawned(&self) -> u32 {
        self.primaries_spawned
    }

    /// Interval until the next attempt at this level and combo state
    pub fn interval_ms(config: &GameConfig, level: u32, combo_factor: f32) -> u64 {
        let spawn = &config.spawn;
        let steps = level.saturating_sub(1) as i32;
        let by_level = spawn.base_interval_ms as f32 * spawn.level_interval_factor.powi(steps);
        let scaled = by_level.max(spawn.min_interval_ms as f32) * combo_factor;
        (scaled.round() as u64).max(spawn.min_interval_ms)
    }

    /// Lifetime for a new entity; bosses never time out
    pub fn lifetime_ms(config: &GameConfig, kind: EntityKind, level: u32) -> Option<u64> {
        if kind.is_boss() {
            return None;
        }
        let spawn = &config.spawn;
        let steps = level.saturating_sub(1) as i32;
        let lifetime = spawn.base_lifetime_ms as f32 * spawn.level_lifetime_factor.powi(steps);
        Some((lifetime.round() as u64).max(spawn.min_lifetime_ms))
    }

    /// Attempt a spawn if one is due. Produces zero or one plan.
    pub fn poll(
        &mut self,
        ctx: &SpawnContext,
        config: &GameConfig,
        rng: &mut Pcg32,
        live: &[Entity],
    ) -> Option<SpawnPlan> {
        let due = self.next_spawn_at?;
        if ctx.world_ms < due {
            return None;
        }
        self.next_spawn_at =
            Some(ctx.world_ms + Self::interval_ms(config, ctx.level, ctx.interval_factor));

        let free_slot = match config.layout {
            SpawnLayout::Slots { count, .. } => {
                let free: Vec<u32> = (0..count)
                    .filter(|slot| !live.iter().any(|e| e.active && e.slot == Some(*slot)))
                    .collect();
                if free.is_empty() {
                    log::trace!("No free slot, skipping spawn");
                    return None;
                }
                Some(free[rng.random_range(0..free.len())])
            }
            SpawnLayout::Lane { max_live, .. } => {
                if live.iter().filter(|e| e.active).count() >= max_live {
                    log::trace!("Lane full, skipping spawn");
                    return None;
                }
                None
            }
        };

        let kind = self.choose_kind(ctx, config, rng, live)?;
        let rule = config.kinds.rule(kind);

        let (pos, vel) = match (&config.layout, free_slot) {
            (SpawnLayout::Slots { columns, cell, .. }, Some(slot)) => {
                (slot_center(slot, *columns, *cell), Vec2::ZERO)
            }
            (SpawnLayout::Lane { margin, .. }, _) => {
                let x = rng.random_range(*margin..=(config.arena.width - *margin));
                let level_scale =
                    1.0 + config.spawn.level_speed_step * ctx.level.saturating_sub(1) as f32;
                let speed = rule.speed * level_scale * ctx.speed_factor;
                (Vec2::new(x, 0.0), Vec2::new(0.0, speed))
            }
            (SpawnLayout::Slots { .. }, None) => return None,
        };

        self.last_kind = Some(kind);
        self.spawned += 1;
        if kind == EntityKind::Primary {
            self.primaries_spawned += 1;
        }

        Some(SpawnPlan {
            kind,
            pos,
            vel,
            radius: rule.radius,
            slot: free_slot,
            expires_at: Self::lifetime_ms(config, kind, ctx.level).map(|l| ctx.world_ms + l),
            hit_points: kind.is_boss().then_some(config.spawn.boss_hit_points),
        })
    }

    /// Weighted kind selection conditioned on level, fever and history
    fn choose_kind(
        &self,
        ctx: &SpawnContext,
        config: &GameConfig,
        rng: &mut Pcg32,
        live: &[Entity],
    ) -> Option<EntityKind> {
        let kinds = &config.kinds;
        let spawn = &config.spawn;
        let fever_bias = if ctx.fever { spawn.fever_bias } else { 1.0 };

        let quota_reached = match config.victory {
            VictoryRule::ClearQuota { primaries } => self.primaries_spawned >= primaries,
            _ => false,
        };
        let farming_blocked = spawn.anti_farming && self.last_kind == Some(EntityKind::Currency);
        let boss_allowed = ctx.level >= spawn.boss_min_level
            && !live.iter().any(|e| e.active && e.kind.is_boss());

        let mut candidates: Vec<(EntityKind, f32)> = vec![
            (
                EntityKind::Primary,
                if quota_reached { 0.0 } else { kinds.primary.weight },
            ),
            (EntityKind::Bonus, kinds.bonus.weight * fever_bias),
            (EntityKind::Hazard, kinds.hazard.weight),
            (
                EntityKind::Currency,
                if farming_blocked {
                    0.0
                } else {
                    kinds.currency.weight * fever_bias
                },
            ),
            (
                EntityKind::Boss,
                if boss_allowed { kinds.boss.weight } else { 0.0 },
            ),
        ];
        candidates.extend(
            kinds
                .utilities
                .iter()
                .map(|u| (EntityKind::Utility(u.kind), u.weight)),
        );
        candidates.retain(|(_, w)| *w > 0.0);

        let dist = WeightedIndex::new(candidates.iter().map(|(_, w)| *w)).ok()?;
        Some(candidates[rng.sample(&dist)].0)
    }
}

/// Center of a grid slot
pub fn slot_center(slot: u32, columns: u32, cell: f32) -> Vec2 {
    let col = slot % columns;
    let row = slot / columns;
    Vec2::new((col as f32 + 0.5) * cell, (row as f32 + 0.5) * cell)
}
