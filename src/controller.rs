//! Session controller
//!
//! Owns the one live `Session` and everything around it: the score service,
//! the play gate, the profile collaborator and the generation counter that
//! invalidates callbacks from torn-down sessions. Hosts drive it with frame
//! timestamps and settle the submission it hands out.

use crate::config::GameConfig;
use crate::error::{ArcadeError, ConfigError, PhaseError, SyncError};
use crate::persistence::PlayGate;
use crate::platform;
use crate::sim::{
    GameEvent, Session, SessionSnapshot, TerminalReason, TickInput, TickReport, tick,
};
use crate::sync::{
    NoopProfile, ProfileService, ScoreService, SubmissionStatus, SubmissionTicket, SubmitAck,
};

/// Handle a host keeps for the session it started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken {
    generation: u64,
}

impl SessionToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

pub struct SessionController<S: ScoreService> {
    service: S,
    config: GameConfig,
    generation: u64,
    gate: Option<PlayGate>,
    profile: Box<dyn ProfileService>,
    session: Option<Session>,
    /// Guarded submission waiting to be sent
    pending: Option<SubmissionTicket>,
    last_status: Option<SubmissionStatus>,
}

impl<S: ScoreService> SessionController<S> {
    pub fn new(service: S, config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            service,
            config,
            generation: 0,
            gate: None,
            profile: Box::new(NoopProfile),
            session: None,
            pending: None,
            last_status: None,
        })
    }

    /// Consult (and count against) a daily play gate before each start
    pub fn with_gate(mut self, gate: PlayGate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_profile(mut self, profile: Box<dyn ProfileService>) -> Self {
        self.profile = profile;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn gate(&self) -> Option<&PlayGate> {
        self.gate.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.session.as_ref().map(Session::snapshot)
    }

    pub fn pending_submission(&self) -> Option<&SubmissionTicket> {
        self.pending.as_ref()
    }

    pub fn last_status(&self) -> Option<&SubmissionStatus> {
        self.last_status.as_ref()
    }

    /// Start a fresh session.
    ///
    /// An unsent submission from the previous session is settled first, then
    /// that session is invalidated. Fails closed: if the gate refuses or the
    /// join call fails, no session exists afterwards.
    pub async fn start(&mut self, seed: u64, now: u64) -> Result<SessionToken, ArcadeError> {
        if self.pending.is_some() {
            self.settle().await;
        }
        self.teardown();
        let token = SessionToken {
            generation: self.generation,
        };

        let today = platform::today();
        if let Some(gate) = &self.gate {
            gate.check(today)?;
        }

        let participant = match self.service.join_session(&self.config.game_id).await {
            Ok(participant) => participant,
            Err(e) => {
                log::warn!("Join failed for {}: {}", self.config.game_id, e);
                return Err(e.into());
            }
        };
        log::info!(
            "Joined {} as {} (generation {})",
            self.config.game_id,
            participant,
            token.generation
        );

        if let Some(gate) = &mut self.gate {
            gate.admit(today)?;
            gate.save(&self.config.game_id);
        }

        let mut session = Session::new(self.config.clone(), participant, seed, token.generation);
        session.prepare(now)?;
        self.session = Some(session);
        Ok(token)
    }

    fn current(&mut self, token: SessionToken) -> Result<&mut Session, PhaseError> {
        if token.generation != self.generation {
            return Err(PhaseError::StaleToken {
                token: token.generation,
                current: self.generation,
            });
        }
        self.session.as_mut().ok_or(PhaseError::NoSession)
    }

    /// Leave the intro (if its deadline passed) and start playing
    pub fn begin_play(
        &mut self,
        token: SessionToken,
        now: u64,
    ) -> Result<Vec<GameEvent>, ArcadeError> {
        let session = self.current(token)?;
        let mut events: Vec<GameEvent> = session.finish_intro(now).into_iter().collect();
        events.push(session.play(now)?);
        Ok(events)
    }

    pub fn pause(&mut self, token: SessionToken) -> Result<GameEvent, ArcadeError> {
        Ok(self.current(token)?.pause()?)
    }

    pub fn resume(&mut self, token: SessionToken, now: u64) -> Result<GameEvent, ArcadeError> {
        Ok(self.current(token)?.resume(now)?)
    }

    /// Advance one animation frame. Stale tokens are dropped.
    pub fn frame(
        &mut self,
        token: SessionToken,
        input: &TickInput,
        now: u64,
    ) -> Option<TickReport> {
        let session = match self.current(token) {
            Ok(session) => session,
            Err(e) => {
                log::debug!("Dropping frame: {}", e);
                return None;
            }
        };
        let report = tick(session, input, now);
        if let Some(ticket) = &report.submission {
            self.pending = Some(ticket.clone());
        }
        Some(report)
    }

    /// End the session from the host side (quit, navigation). Idempotent.
    pub fn finish(
        &mut self,
        token: SessionToken,
        reason: TerminalReason,
    ) -> Result<Vec<GameEvent>, ArcadeError> {
        let (events, ticket) = self.current(token)?.finish(reason);
        if ticket.is_some() {
            self.pending = ticket;
        }
        Ok(events)
    }

    /// Hand the guarded submission to the caller for sending
    pub fn take_submission(&mut self) -> Option<SubmissionTicket> {
        self.pending.take()
    }

    /// Record the outcome of a submit call
    pub fn complete_submission(
        &mut self,
        ticket: &SubmissionTicket,
        result: Result<SubmitAck, SyncError>,
    ) -> SubmissionStatus {
        let status = match self.session.as_mut() {
            Some(session) if ticket.generation == self.generation => {
                if session.sync.complete(&result) {
                    self.profile.refresh_cached_totals();
                }
                match result {
                    Ok(ack) => {
                        log::info!(
                            "Score acknowledged for {}: score={} currency={}",
                            ticket.participant,
                            ticket.payload.score,
                            ticket.payload.currency
                        );
                        SubmissionStatus::Acknowledged(ack)
                    }
                    Err(e) => {
                        log::warn!("Score submission failed: {}", e);
                        SubmissionStatus::Failed {
                            error: e.to_string(),
                        }
                    }
                }
            }
            _ => {
                log::debug!(
                    "Ignoring submission result for generation {} (current {})",
                    ticket.generation,
                    self.generation
                );
                SubmissionStatus::Stale
            }
        };
        self.last_status = Some(status.clone());
        status
    }

    /// User-initiated retry after a failed submission.
    /// Returns whether a new submission is now pending.
    pub fn retry_submission(&mut self, token: SessionToken) -> Result<bool, ArcadeError> {
        let ticket = self.current(token)?.begin_submission();
        let queued = ticket.is_some();
        if queued {
            self.pending = ticket;
        }
        Ok(queued)
    }

    /// Send the pending submission, if any, and record the outcome
    pub async fn settle(&mut self) -> Option<SubmissionStatus> {
        let ticket = self.take_submission()?;
        let result = self
            .service
            .submit_score(&ticket.participant, &ticket.payload)
            .await;
        Some(self.complete_submission(&ticket, result))
    }

    /// Drop the current session and invalidate every outstanding token
    pub fn teardown(&mut self) {
        self.generation += 1;
        if let Some(session) = self.session.take() {
            log::debug!("Tearing down session {}", session.generation);
        }
        if self.pending.take().is_some() {
            log::warn!("Discarding unsent submission from torn-down session");
        }
    }
}
