//! Timed status effects
//!
//! At most one instance per kind. Reapplying a kind moves its expiry instead
//! of stacking duration. Expiry is absolute (active timeline), swept once per
//! frame before collisions are resolved.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Negates exactly one hazard hit or breach, then disappears
    Shield,
    /// Suspends the world timeline (countdown, spawning, motion, lifetimes)
    Freeze,
    /// Scales entity movement down
    Slow,
    /// Engine strikes targets on the player's behalf
    AutoAction,
    /// Scales score and currency rewards
    Multiplier,
}

/// An active effect instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    /// Start of the current uninterrupted activation
    pub applied_at: u64,
    pub expires_at: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectManager {
    active: BTreeMap<EffectKind, Effect>,
}

impl EffectManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate `kind` until `now + duration_ms`, replacing any prior expiry
    pub fn apply(&mut self, kind: EffectKind, now: u64, duration_ms: u64) -> Effect {
        let applied_at = match self.active.get(&kind) {
            Some(existing) if now < existing.expires_at => existing.applied_at,
            _ => now,
        };
        let effect = Effect {
            kind,
            applied_at,
            expires_at: now + duration_ms,
        };
        self.active.insert(kind, effect);
        effect
    }

    pub fn is_active(&self, kind: EffectKind, now: u64) -> bool {
        self.active.get(&kind).is_some_and(|e| now < e.expires_at)
    }

    pub fn get(&self, kind: EffectKind) -> Option<&Effect> {
        self.active.get(&kind)
    }

    pub fn remaining_ms(&self, kind: EffectKind, now: u64) -> Option<u64> {
        self.active
            .get(&kind)
            .filter(|e| now < e.expires_at)
            .map(|e| e.expires_at - now)
    }

    /// Remove every effect whose expiry has passed, returning their kinds
    pub fn sweep(&mut self, now: u64) -> Vec<EffectKind> {
        let expired: Vec<EffectKind> = self
            .active
            .values()
            .filter(|e| now >= e.expires_at)
            .map(|e| e.kind)
            .collect();
        for kind in &expired {
            self.active.remove(kind);
        }
        expired
    }

    /// Spend the shield on one hit. Returns whether a shield absorbed it.
    pub fn consume_shield(&mut self, now: u64) -> bool {
        if self.is_active(EffectKind::Shield, now) {
            self.active.remove(&EffectKind::Shield);
            true
        } else {
            false
        }
    }

    /// Activation window of the current freeze, if any
    pub fn freeze_window(&self) -> Option<(u64, u64)> {
        self.active
            .get(&EffectKind::Freeze)
            .map(|e| (e.applied_at, e.expires_at))
    }

    /// Cancel every pending expiry
    pub fn clear(&mut self) -> usize {
        let count = self.active.len();
        self.active.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Active effects in stable kind order
    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.active.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reapply_replaces_expiry() {
        let mut effects = EffectManager::new();
        effects.apply(EffectKind::Slow, 0, 5_000);
        effects.apply(EffectKind::Slow, 1_000, 5_000);
        assert_eq!(effects.len(), 1);
        // 1_000 + 5_000, not 10_000
        assert_eq!(effects.get(EffectKind::Slow).unwrap().expires_at, 6_000);
        assert_eq!(effects.get(EffectKind::Slow).unwrap().applied_at, 0);
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let mut effects = EffectManager::new();
        effects.apply(EffectKind::Slow, 0, 100);
        effects.apply(EffectKind::Multiplier, 0, 500);
        assert!(effects.sweep(99).is_empty());
        assert_eq!(effects.sweep(100), vec![EffectKind::Slow]);
        assert!(effects.is_active(EffectKind::Multiplier, 100));
        assert!(!effects.is_active(EffectKind::Slow, 100));
    }

    #[test]
    fn test_shield_single_use() {
        let mut effects = EffectManager::new();
        effects.apply(EffectKind::Shield, 0, 10_000);
        assert!(effects.consume_shield(50));
        assert!(!effects.consume_shield(51));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_expired_shield_does_not_absorb() {
        let mut effects = EffectManager::new();
        effects.apply(EffectKind::Shield, 0, 100);
        assert!(!effects.consume_shield(100));
    }

    #[test]
    fn test_reapply_after_expiry_starts_new_window() {
        let mut effects = EffectManager::new();
        effects.apply(EffectKind::Freeze, 0, 100);
        effects.apply(EffectKind::Freeze, 200, 100);
        assert_eq!(effects.freeze_window(), Some((200, 300)));
    }

    #[test]
    fn test_clear_cancels_everything() {
        let mut effects = EffectManager::new();
        effects.apply(EffectKind::Freeze, 0, 100);
        effects.apply(EffectKind::Shield, 0, 100);
        assert_eq!(effects.clear(), 2);
        assert!(effects.freeze_window().is_none());
    }
}
