//! In-process score service
//!
//! Records every call. Used by the headless binary when no server is
//! configured and by tests that need to count network calls.

use std::cell::RefCell;

use super::{ParticipantId, ScorePayload, ScoreService, SubmitAck};
use crate::error::SyncError;

#[derive(Debug, Default)]
struct MemoryState {
    joins: Vec<String>,
    submissions: Vec<(ParticipantId, ScorePayload)>,
    fail_joins: bool,
    /// Number of upcoming submissions to fail
    failing_submits: u32,
    total_currency: u64,
}

#[derive(Debug, Default)]
pub struct MemoryScoreService {
    state: RefCell<MemoryState>,
}

impl MemoryScoreService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every join fails (service unreachable)
    pub fn failing_joins() -> Self {
        let service = Self::new();
        service.state.borrow_mut().fail_joins = true;
        service
    }

    pub fn set_fail_joins(&self, fail: bool) {
        self.state.borrow_mut().fail_joins = fail;
    }

    /// Fail the next `count` submissions
    pub fn fail_next_submits(&self, count: u32) {
        self.state.borrow_mut().failing_submits = count;
    }

    pub fn join_count(&self) -> usize {
        self.state.borrow().joins.len()
    }

    pub fn submit_count(&self) -> usize {
        self.state.borrow().submissions.len()
    }

    pub fn submissions(&self) -> Vec<(ParticipantId, ScorePayload)> {
        self.state.borrow().submissions.clone()
    }

    pub fn total_currency(&self) -> u64 {
        self.state.borrow().total_currency
    }
}

impl ScoreService for MemoryScoreService {
    async fn join_session(&self, game_id: &str) -> Result<ParticipantId, SyncError> {
        let mut state = self.state.borrow_mut();
        if state.fail_joins {
            return Err(SyncError::Unavailable("join refused".to_string()));
        }
        state.joins.push(game_id.to_string());
        Ok(ParticipantId::new(format!("{game_id}-{}", state.joins.len())))
    }

    async fn submit_score(
        &self,
        participant: &ParticipantId,
        payload: &ScorePayload,
    ) -> Result<SubmitAck, SyncError> {
        let mut state = self.state.borrow_mut();
        // Failed attempts still count as calls
        state.submissions.push((participant.clone(), payload.clone()));
        if state.failing_submits > 0 {
            state.failing_submits -= 1;
            return Err(SyncError::Unavailable("submit timed out".to_string()));
        }
        state.total_currency += payload.currency as u64;
        Ok(SubmitAck {
            accepted: true,
            total_currency: Some(state.total_currency),
            trophies: Vec::new(),
        })
    }
}
