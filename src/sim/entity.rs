//! Spawned entities and player-owned objects

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Session-scoped entity identifier (monotonic, never reused within a session)
pub type EntityId = u32;

/// Non-combat pickup flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityKind {
    /// Adds time to a countdown session
    ExtraTime,
    /// Adds a life to a lives session
    ExtraLife,
    Shield,
    Freeze,
    Slow,
    AutoAction,
    Multiplier,
}

/// Entity variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Primary,
    Bonus,
    Hazard,
    Currency,
    Utility(UtilityKind),
    Boss,
}

impl EntityKind {
    pub fn is_boss(&self) -> bool {
        matches!(self, EntityKind::Boss)
    }

    pub fn is_currency(&self) -> bool {
        matches!(self, EntityKind::Currency)
    }

    /// Targets a projectile can hit (shots pass through hazards and pickups)
    pub fn is_shootable(&self) -> bool {
        matches!(self, EntityKind::Primary | EntityKind::Bonus | EntityKind::Boss)
    }

    /// Targets the auto-action effect may strike
    pub fn is_auto_target(&self) -> bool {
        matches!(self, EntityKind::Primary | EntityKind::Boss)
    }
}

/// A spawned, collidable, time-boxed object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    /// Units per second at normal speed
    pub vel: Vec2,
    pub radius: f32,
    /// Slot index for grid layouts
    pub slot: Option<u32>,
    /// Absolute world-clock deadline; `None` never expires (bosses)
    pub expires_at: Option<u64>,
    /// Remaining hits (bosses only)
    pub hit_points: Option<u32>,
    /// Inactive entities are removed before the next frame
    pub active: bool,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind, pos: Vec2, radius: f32) -> Self {
        Self {
            id,
            kind,
            pos,
            vel: Vec2::ZERO,
            radius,
            slot: None,
            expires_at: None,
            hit_points: None,
            active: true,
        }
    }

    /// Time left before forced removal
    pub fn remaining_lifetime_ms(&self, world_ms: u64) -> Option<u64> {
        self.expires_at.map(|at| at.saturating_sub(world_ms))
    }

    pub fn is_expired(&self, world_ms: u64) -> bool {
        // Bosses never time out, even if a deadline was set by hand
        !self.kind.is_boss() && self.expires_at.is_some_and(|at| world_ms >= at)
    }

    /// Advance position by velocity
    pub fn advance(&mut self, dt: f32, speed_scale: f32) {
        self.pos += self.vel * speed_scale * dt;
    }
}

/// A player shot travelling toward the top edge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub active: bool,
}

/// The player's controllable body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub speed: f32,
    pub radius: f32,
    /// Active-clock time the weapon is ready again
    pub fire_ready_at: u64,
}

impl Player {
    /// Move horizontally by input axis, staying inside [min_x, max_x]
    pub fn steer(&mut self, axis: f32, dt: f32, min_x: f32, max_x: f32) {
        let axis = axis.clamp(-1.0, 1.0);
        self.pos.x = (self.pos.x + axis * self.speed * dt).clamp(min_x, max_x);
    }
}
