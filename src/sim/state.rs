//! Session state and lifecycle
//!
//! One `Session` owns everything a single play-through mutates. It is created
//! after the service has issued a participant id and discarded on teardown;
//! nothing carries over between sessions except what the controller keeps.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::clock::SessionClock;
use super::combo::{ComboEvent, ComboModel};
use super::effects::{EffectKind, EffectManager};
use super::entity::{Entity, EntityId, EntityKind, Player, Projectile, UtilityKind};
use super::ledger::{ResourceLedger, UtilityGrant};
use super::spawn::SpawnScheduler;
use crate::config::GameConfig;
use crate::error::PhaseError;
use crate::sync::{ParticipantId, ScoreMetadata, ScorePayload, ScoreSync, SubmissionTicket};

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Created, waiting to be prepared
    Idle,
    /// Optional countdown before ready
    Intro,
    /// Waiting for the player to start
    Ready,
    Playing,
    Paused,
    GameOver,
    Victory,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::GameOver | SessionPhase::Victory)
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalReason {
    /// Lives or countdown ran out
    Exhausted,
    /// A breach ended the session outright
    Breach,
    Victory,
    /// Ended by the host (quit)
    Abandoned,
}

/// Something that happened during a frame, for presentation
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PhaseChanged { from: SessionPhase, to: SessionPhase },
    Spawned { id: EntityId, kind: EntityKind },
    Expired { id: EntityId, kind: EntityKind },
    Struck { id: EntityId, kind: EntityKind, score_delta: i64, currency_delta: u32 },
    BossDamaged { id: EntityId, hit_points: u32 },
    BossDefeated { id: EntityId, score_delta: i64, currency_delta: u32 },
    /// Unabsorbed hazard contact
    Damaged { id: EntityId, score_delta: i64 },
    /// Unabsorbed breach of the danger zone
    Breached { id: EntityId, score_delta: i64 },
    /// A shield took the hit
    Absorbed { id: EntityId },
    EmptyTap { resets_combo: bool },
    UtilityCollected { id: EntityId, kind: UtilityKind, grant: UtilityGrant },
    EffectApplied { kind: EffectKind, expires_at: u64 },
    EffectExpired { kind: EffectKind },
    Combo(ComboEvent),
    LevelUp { level: u32 },
    Ended { reason: TerminalReason },
}

/// Complete per-session state
#[derive(Debug, Clone)]
pub struct Session {
    /// Generation token issued by the controller
    pub generation: u64,
    pub seed: u64,
    pub config: GameConfig,
    pub phase: SessionPhase,
    pub clock: SessionClock,
    pub ledger: ResourceLedger,
    pub combo: ComboModel,
    pub effects: EffectManager,
    pub scheduler: SpawnScheduler,
    /// Live entities (sorted by id)
    pub entities: Vec<Entity>,
    pub projectiles: Vec<Projectile>,
    pub player: Option<Player>,
    pub level: u32,
    pub primaries_defeated: u32,
    pub bosses_defeated: u32,
    /// Frames processed while playing
    pub frames: u64,
    /// Wall time the intro ends
    pub intro_until: Option<u64>,
    /// Active-clock time of the next auto-action strike
    pub next_auto_at: u64,
    pub outcome: Option<TerminalReason>,
    pub sync: ScoreSync,
    pub(crate) rng: Pcg32,
    next_id: EntityId,
}

impl Session {
    pub fn new(config: GameConfig, participant: ParticipantId, seed: u64, generation: u64) -> Self {
        let player = config.player.as_ref().map(|p| Player {
            pos: p.start,
            speed: p.speed,
            radius: p.radius,
            fire_ready_at: 0,
        });
        Self {
            generation,
            seed,
            ledger: ResourceLedger::new(&config),
            combo: ComboModel::new(config.combo.clone()),
            effects: EffectManager::new(),
            scheduler: SpawnScheduler::new(),
            clock: SessionClock::new(),
            phase: SessionPhase::Idle,
            entities: Vec::new(),
            projectiles: Vec::new(),
            player,
            level: 1,
            primaries_defeated: 0,
            bosses_defeated: 0,
            frames: 0,
            intro_until: None,
            next_auto_at: 0,
            outcome: None,
            sync: ScoreSync::new(participant),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
            config,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn transition(&mut self, to: SessionPhase) -> GameEvent {
        let from = self.phase;
        self.phase = to;
        log::debug!("Session {} phase {:?} -> {:?}", self.generation, from, to);
        GameEvent::PhaseChanged { from, to }
    }

    fn invalid(&self, action: &'static str) -> PhaseError {
        PhaseError::InvalidTransition {
            from: self.phase,
            action,
        }
    }

    /// Idle -> Intro (when configured) or Ready
    pub fn prepare(&mut self, wall_ms: u64) -> Result<GameEvent, PhaseError> {
        if self.phase != SessionPhase::Idle {
            return Err(self.invalid("prepare"));
        }
        if self.config.intro_ms > 0 {
            self.intro_until = Some(wall_ms + self.config.intro_ms);
            Ok(self.transition(SessionPhase::Intro))
        } else {
            Ok(self.transition(SessionPhase::Ready))
        }
    }

    /// Intro -> Ready once the intro deadline has passed
    pub fn finish_intro(&mut self, wall_ms: u64) -> Option<GameEvent> {
        match (self.phase, self.intro_until) {
            (SessionPhase::Intro, Some(until)) if wall_ms >= until => {
                self.intro_until = None;
                Some(self.transition(SessionPhase::Ready))
            }
            _ => None,
        }
    }

    /// Ready -> Playing; starts the clocks and the spawn scheduler
    pub fn play(&mut self, wall_ms: u64) -> Result<GameEvent, PhaseError> {
        if self.phase != SessionPhase::Ready {
            return Err(self.invalid("play"));
        }
        self.clock.anchor(wall_ms);
        self.scheduler
            .start(self.clock.world_ms(), self.config.spawn.initial_delay_ms);
        self.next_auto_at = self.clock.active_ms();
        log::info!(
            "Session {} started: game={} seed={}",
            self.generation,
            self.config.game_id,
            self.seed
        );
        Ok(self.transition(SessionPhase::Playing))
    }

    /// Playing -> Paused. Both timelines stop, so every deadline is held.
    pub fn pause(&mut self) -> Result<GameEvent, PhaseError> {
        if self.phase != SessionPhase::Playing {
            return Err(self.invalid("pause"));
        }
        self.clock.suspend();
        Ok(self.transition(SessionPhase::Paused))
    }

    /// Paused -> Playing, counting from `wall_ms`
    pub fn resume(&mut self, wall_ms: u64) -> Result<GameEvent, PhaseError> {
        if self.phase != SessionPhase::Paused {
            return Err(self.invalid("resume"));
        }
        self.clock.anchor(wall_ms);
        Ok(self.transition(SessionPhase::Playing))
    }

    /// Enter a terminal phase.
    ///
    /// Idempotent: only the first call cancels timers, closes the ledger and
    /// hands out a submission ticket (when there is any reward).
    pub fn finish(&mut self, reason: TerminalReason) -> (Vec<GameEvent>, Option<SubmissionTicket>) {
        if self.phase.is_terminal() {
            log::debug!("Session {} already ended, ignoring {:?}", self.generation, reason);
            return (Vec::new(), None);
        }

        let to = match reason {
            TerminalReason::Victory => SessionPhase::Victory,
            _ => SessionPhase::GameOver,
        };
        let events = vec![self.transition(to), GameEvent::Ended { reason }];

        self.outcome = Some(reason);
        self.scheduler.stop();
        self.clock.suspend();
        let cleared = self.effects.clear();
        self.combo.clear();
        self.ledger.close();
        self.projectiles.clear();
        self.intro_until = None;

        log::info!(
            "Session {} ended ({:?}): score={} currency={} level={} cleared_effects={}",
            self.generation,
            reason,
            self.ledger.score(),
            self.ledger.currency(),
            self.level,
            cleared
        );

        if !self.ledger.has_reward() {
            log::debug!("Nothing earned, skipping submission");
        }
        (events, self.begin_submission())
    }

    /// Raise the submission guard for the final reward, if there is one
    pub fn begin_submission(&mut self) -> Option<SubmissionTicket> {
        if !self.phase.is_terminal() || !self.ledger.has_reward() {
            return None;
        }
        let payload = self.payload();
        self.sync.begin(self.generation, payload)
    }

    fn payload(&self) -> ScorePayload {
        ScorePayload {
            score: self.ledger.score(),
            currency: self.ledger.currency(),
            metadata: ScoreMetadata {
                game_id: self.config.game_id.clone(),
                outcome: self.outcome.unwrap_or(TerminalReason::Abandoned),
                level: self.level,
                best_streak: self.combo.best_streak(),
                duration_ms: self.clock.active_ms(),
                primaries_defeated: self.primaries_defeated,
                bosses_defeated: self.bosses_defeated,
            },
        }
    }

    /// Combined reward multiplier at `now` (fever x multiplier effect)
    pub fn reward_multiplier(&self, now: u64) -> f32 {
        let effect = if self.effects.is_active(EffectKind::Multiplier, now) {
            self.config.effects.multiplier_factor
        } else {
            1.0
        };
        self.combo.reward_multiplier(now) * effect
    }

    /// Duration configured for a timed effect
    pub fn effect_duration(&self, kind: EffectKind) -> u64 {
        let durations = &self.config.effects;
        match kind {
            EffectKind::Shield => durations.shield_ms,
            EffectKind::Freeze => durations.freeze_ms,
            EffectKind::Slow => durations.slow_ms,
            EffectKind::AutoAction => durations.auto_action_ms,
            EffectKind::Multiplier => durations.multiplier_ms,
        }
    }

    /// Read-only view for presentation layers
    pub fn snapshot(&self) -> SessionSnapshot {
        let active = self.clock.active_ms();
        let world = self.clock.world_ms();
        SessionSnapshot {
            generation: self.generation,
            game_id: self.config.game_id.clone(),
            phase: self.phase,
            score: self.ledger.score(),
            currency: self.ledger.currency(),
            lives: self.ledger.lives(),
            time_remaining_ms: self.ledger.time_remaining_ms(world),
            level: self.level,
            streak: self.combo.streak(),
            best_streak: self.combo.best_streak(),
            fever_remaining_ms: self
                .combo
                .fever_until()
                .filter(|until| *until > active)
                .map(|until| until - active),
            effects: self
                .effects
                .iter()
                .filter(|e| e.expires_at > active)
                .map(|e| EffectSnapshot {
                    kind: e.kind,
                    remaining_ms: e.expires_at - active,
                })
                .collect(),
            entities: self
                .entities
                .iter()
                .filter(|e| e.active)
                .map(|e| EntitySnapshot {
                    id: e.id,
                    kind: e.kind,
                    pos: e.pos,
                    radius: e.radius,
                    slot: e.slot,
                    hit_points: e.hit_points,
                    remaining_lifetime_ms: e.remaining_lifetime_ms(world),
                })
                .collect(),
            projectiles: self.projectiles.iter().map(|p| p.pos).collect(),
            player: self.player.as_ref().map(|p| p.pos),
            submitted: self.sync.is_submitted(),
            acknowledged: self.sync.is_acknowledged(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectSnapshot {
    pub kind: EffectKind,
    pub remaining_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub radius: f32,
    pub slot: Option<u32>,
    pub hit_points: Option<u32>,
    pub remaining_lifetime_ms: Option<u64>,
}

/// Everything a renderer or HUD needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub generation: u64,
    pub game_id: String,
    pub phase: SessionPhase,
    pub score: u64,
    pub currency: u32,
    pub lives: Option<u32>,
    pub time_remaining_ms: Option<u64>,
    pub level: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub fever_remaining_ms: Option<u64>,
    pub effects: Vec<EffectSnapshot>,
    pub entities: Vec<EntitySnapshot>,
    pub projectiles: Vec<Vec2>,
    pub player: Option<Vec2>,
    pub submitted: bool,
    pub acknowledged: bool,
}
