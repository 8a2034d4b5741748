//! Session timelines
//!
//! Hosts hand the engine raw wall-clock timestamps. The session derives two
//! timelines from them:
//! - `active`: advances only while playing (pause excluded)
//! - `world`: advances only while playing and not frozen
//!
//! All deadlines are absolute points on one of these timelines, so a late or
//! skipped frame simply observes a larger delta instead of accumulating drift.

use serde::{Deserialize, Serialize};

/// Time elapsed on each timeline during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameDelta {
    pub active_ms: u64,
    pub world_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionClock {
    last_wall_ms: Option<u64>,
    active_ms: u64,
    world_ms: u64,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_ms(&self) -> u64 {
        self.active_ms
    }

    pub fn world_ms(&self) -> u64 {
        self.world_ms
    }

    /// Start counting from `wall_ms` (play start / resume)
    pub fn anchor(&mut self, wall_ms: u64) {
        self.last_wall_ms = Some(wall_ms);
    }

    /// Stop counting; wall time until the next `anchor` is never observed
    pub fn suspend(&mut self) {
        self.last_wall_ms = None;
    }

    /// Advance both timelines to `wall_ms`.
    ///
    /// `freeze` is the `[applied_at, expires_at)` window of an active freeze
    /// on the active timeline; the overlapping part of this frame is withheld
    /// from the world timeline.
    pub fn advance(&mut self, wall_ms: u64, freeze: Option<(u64, u64)>) -> FrameDelta {
        let Some(last) = self.last_wall_ms else {
            self.last_wall_ms = Some(wall_ms);
            return FrameDelta::default();
        };

        // Host clocks going backwards count as zero elapsed
        let delta = wall_ms.saturating_sub(last);
        self.last_wall_ms = Some(wall_ms.max(last));

        let start = self.active_ms;
        let end = start + delta;
        let frozen = freeze
            .map(|(from, until)| overlap(start, end, from, until))
            .unwrap_or(0);

        self.active_ms = end;
        self.world_ms += delta - frozen;

        FrameDelta {
            active_ms: delta,
            world_ms: delta - frozen,
        }
    }
}

/// Length of the intersection of [a0, a1) and [b0, b1)
fn overlap(a0: u64, a1: u64, b0: u64, b1: u64) -> u64 {
    a1.min(b1).saturating_sub(a0.max(b0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_advance_only_anchors() {
        let mut clock = SessionClock::new();
        let delta = clock.advance(5_000, None);
        assert_eq!(delta, FrameDelta::default());
        assert_eq!(clock.active_ms(), 0);

        clock.advance(5_016, None);
        assert_eq!(clock.active_ms(), 16);
        assert_eq!(clock.world_ms(), 16);
    }

    #[test]
    fn test_suspend_skips_paused_wall_time() {
        let mut clock = SessionClock::new();
        clock.anchor(0);
        clock.advance(100, None);
        clock.suspend();
        // 10 seconds pass while paused
        clock.anchor(10_100);
        clock.advance(10_150, None);
        assert_eq!(clock.active_ms(), 150);
    }

    #[test]
    fn test_freeze_window_split_across_frame() {
        let mut clock = SessionClock::new();
        clock.anchor(0);
        clock.advance(100, None);
        // Freeze applied at active 100, lasting until 300
        let freeze = Some((100, 300));
        let d = clock.advance(250, freeze);
        assert_eq!(d.active_ms, 150);
        assert_eq!(d.world_ms, 0);
        // Frame spans the freeze end: 250..400, frozen part 250..300
        let d = clock.advance(400, freeze);
        assert_eq!(d.active_ms, 150);
        assert_eq!(d.world_ms, 100);
        assert_eq!(clock.world_ms(), 200);
        assert_eq!(clock.active_ms(), 400);
    }

    #[test]
    fn test_backwards_clock_is_zero_delta() {
        let mut clock = SessionClock::new();
        clock.anchor(1_000);
        let d = clock.advance(900, None);
        assert_eq!(d.active_ms, 0);
        clock.advance(1_050, None);
        assert_eq!(clock.active_ms(), 50);
    }
}
