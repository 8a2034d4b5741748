//! Arcade Engine - A reusable real-time session engine for arcade mini-games
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, movement, collisions, effects, combo, ledger)
//! - `controller`: Session lifecycle and score submission orchestration
//! - `sync`: Score service protocol (join / submit) and its clients
//! - `config`: Data-driven per-game configuration and presets
//! - `platform`: Browser/native platform abstraction (clock, logging, storage)
//! - `persistence`: Local boundary state (daily play gate)
//! - `highscores`: Per-game local leaderboard

pub mod config;
pub mod controller;
pub mod error;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod sim;
pub mod sync;

pub use config::{GameConfig, GamePreset};
pub use controller::{SessionController, SessionToken};
pub use error::{ArcadeError, ConfigError, GateError, PhaseError, SyncError};
pub use highscores::HighScores;

/// Engine-wide constants
pub mod consts {
    /// Host frame interval used by the headless runner (~60 fps)
    pub const FRAME_MS: u64 = 16;

    /// Default combo idle window
    pub const COMBO_IDLE_WINDOW_MS: u64 = 2_250;
    /// Default combo tier thresholds (low, mid, high)
    pub const COMBO_THRESHOLDS: [u32; 3] = [5, 10, 15];

    /// Movement multiplier while the slow effect is active
    pub const SLOW_FACTOR: f32 = 0.2;
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn wasm_start() {
    platform::init_logging();
    log::info!("Arcade engine loaded");
}
