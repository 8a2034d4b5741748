//! Arcade engine headless runner
//!
//! Plays one autopilot session on virtual time, settles the score with the
//! configured service and records it in the local high score table.
//!
//! Environment:
//! - `ARCADE_GAME`: preset name (default `whack-a-mole`)
//! - `ARCADE_SEED`: RNG seed (default: current time)
//! - `ARCADE_SERVER`: score service base URL (default: in-memory service)

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main(flavor = "current_thread")]
async fn main() {
    arcade_engine::platform::init_logging();
    if let Err(e) = demo::run().await {
        log::error!("Session failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_start, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use arcade_engine::consts::FRAME_MS;
    use arcade_engine::controller::SessionController;
    use arcade_engine::persistence::PlayGate;
    use arcade_engine::platform::{self, Clock, ManualClock};
    use arcade_engine::sim::{ComboEvent, GameEvent, TerminalReason, TickInput};
    use arcade_engine::sync::{
        HttpScoreService, MemoryScoreService, ScoreService, SubmissionStatus,
    };
    use arcade_engine::{ArcadeError, GameConfig, GamePreset, HighScores};

    /// Autopilot can outlast a countdown-free game; stop it here
    const MAX_SESSION_MS: u64 = 180_000;

    pub async fn run() -> Result<(), ArcadeError> {
        let preset = match std::env::var("ARCADE_GAME") {
            Ok(name) => GamePreset::from_str(&name).unwrap_or_else(|| {
                log::warn!("Unknown game '{}', using {}", name, GamePreset::default().as_str());
                GamePreset::default()
            }),
            Err(_) => GamePreset::default(),
        };
        let seed = std::env::var("ARCADE_SEED")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or_else(|| platform::unix_ms() as u64);

        log::info!("Arcade engine (native) starting: game={} seed={}", preset.as_str(), seed);

        match std::env::var("ARCADE_SERVER") {
            Ok(url) if !url.trim().is_empty() => {
                log::info!("Using score service at {}", url);
                play(HttpScoreService::new(url), preset.config(), seed).await
            }
            _ => {
                log::warn!("ARCADE_SERVER not set, scores will only be kept in memory");
                play(MemoryScoreService::new(), preset.config(), seed).await
            }
        }
    }

    async fn play<S: ScoreService>(
        service: S,
        config: GameConfig,
        seed: u64,
    ) -> Result<(), ArcadeError> {
        let game_id = config.game_id.clone();
        let intro_ms = config.intro_ms;
        let clock = ManualClock::new(0);
        let mut controller =
            SessionController::new(service, config)?.with_gate(PlayGate::load(&game_id));

        let token = controller.start(seed, clock.now_ms()).await?;
        clock.advance(intro_ms);
        controller.begin_play(token, clock.now_ms())?;

        let started = clock.now_ms();
        loop {
            let now = clock.advance(FRAME_MS);
            let Some(session) = controller.session() else {
                break;
            };
            let input = TickInput::autopilot(session);
            let Some(report) = controller.frame(token, &input, now) else {
                break;
            };
            report.events.iter().for_each(log_event);
            if report.ended.is_some() {
                break;
            }
            if now - started >= MAX_SESSION_MS {
                log::info!("Demo time limit reached");
                controller.finish(token, TerminalReason::Abandoned)?;
                break;
            }
        }

        match controller.settle().await {
            Some(SubmissionStatus::Acknowledged(ack)) => log::info!(
                "Score accepted={} total_currency={:?} trophies={:?}",
                ack.accepted,
                ack.total_currency,
                ack.trophies
            ),
            Some(SubmissionStatus::Failed { error }) => {
                log::warn!("Score not saved: {}", error)
            }
            Some(SubmissionStatus::Stale) => log::warn!("Session replaced before submission"),
            None => log::info!("Nothing to submit"),
        }

        if let Some(snapshot) = controller.snapshot() {
            let mut scores = HighScores::load(&game_id);
            if let Some(rank) =
                scores.add_score(snapshot.score, snapshot.currency, snapshot.level, platform::unix_ms())
            {
                log::info!("New high score, rank #{}", rank);
                scores.save();
            }
            let frames = controller.session().map(|s| s.frames).unwrap_or_default();
            log::info!(
                "Session over ({:?}): score={} currency={} level={} best_streak={} frames={} best={:?}",
                snapshot.phase,
                snapshot.score,
                snapshot.currency,
                snapshot.level,
                snapshot.best_streak,
                frames,
                scores.best_score()
            );
        }
        Ok(())
    }

    fn log_event(event: &GameEvent) {
        match event {
            GameEvent::LevelUp { level } => log::info!("Level {}", level),
            GameEvent::Combo(ComboEvent::TierReached { tier, streak }) => {
                log::info!("Combo {:?} at streak {}", tier, streak)
            }
            GameEvent::BossDefeated { score_delta, .. } => {
                log::info!("Boss defeated (+{})", score_delta)
            }
            GameEvent::Ended { reason } => log::info!("Ended: {:?}", reason),
            other => log::debug!("{:?}", other),
        }
    }
}
