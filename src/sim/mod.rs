//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Time enters only as host wall-clock timestamps passed to `tick`
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, network or platform dependencies

pub mod clock;
pub mod collision;
pub mod combo;
pub mod effects;
pub mod entity;
pub mod ledger;
pub mod spawn;
pub mod state;
pub mod tick;

pub use clock::{FrameDelta, SessionClock};
pub use collision::{circle_circle, nearest_overlap, swept_circle_hit};
pub use combo::{ComboEvent, ComboModel, ComboTier, ResetReason};
pub use effects::{Effect, EffectKind, EffectManager};
pub use entity::{Entity, EntityId, EntityKind, Player, Projectile, UtilityKind};
pub use ledger::{Depleting, LedgerHit, LedgerSignal, ResourceLedger, UtilityGrant};
pub use spawn::{SpawnContext, SpawnPlan, SpawnScheduler};
pub use state::{
    EffectSnapshot, EntitySnapshot, GameEvent, Session, SessionPhase, SessionSnapshot,
    TerminalReason,
};
pub use tick::{Tap, TickInput, TickReport, tick};
