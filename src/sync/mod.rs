//! Score sync protocol
//!
//! Two calls bound the engine: `join_session` once at session start (fail
//! closed) and `submit_score` at most once per session. The `submitted`
//! guard is raised synchronously before the request leaves, released only on
//! failure, and never re-armed automatically.

pub mod http;
pub mod memory;

pub use http::HttpScoreService;
pub use memory::MemoryScoreService;

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::sim::TerminalReason;

/// Identifier issued by the service for one session; never regenerated mid-session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Context sent alongside the reward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreMetadata {
    pub game_id: String,
    pub outcome: TerminalReason,
    pub level: u32,
    pub best_streak: u32,
    /// Active play time
    pub duration_ms: u64,
    pub primaries_defeated: u32,
    pub bosses_defeated: u32,
}

/// Body of a submit-score call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorePayload {
    pub score: u64,
    pub currency: u32,
    pub metadata: ScoreMetadata,
}

/// Service acknowledgment of a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAck {
    pub accepted: bool,
    #[serde(default)]
    pub total_currency: Option<u64>,
    #[serde(default)]
    pub trophies: Vec<String>,
}

/// A submission that has been guarded and is ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionTicket {
    /// Session generation that produced it
    pub generation: u64,
    pub participant: ParticipantId,
    pub payload: ScorePayload,
}

/// Result of settling a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStatus {
    Acknowledged(SubmitAck),
    /// Reward shown locally but not persisted; guard released for a manual retry
    Failed { error: String },
    /// The session that produced the ticket no longer exists
    Stale,
}

/// External session/score service
pub trait ScoreService {
    fn join_session(&self, game_id: &str)
    -> impl Future<Output = Result<ParticipantId, SyncError>>;

    fn submit_score(
        &self,
        participant: &ParticipantId,
        payload: &ScorePayload,
    ) -> impl Future<Output = Result<SubmitAck, SyncError>>;
}

/// Account/profile collaborator refreshed after a successful submission
pub trait ProfileService {
    fn refresh_cached_totals(&mut self);
}

/// Profile collaborator that does nothing
#[derive(Debug, Default)]
pub struct NoopProfile;

impl ProfileService for NoopProfile {
    fn refresh_cached_totals(&mut self) {}
}

/// Per-session submission record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSync {
    participant: ParticipantId,
    submitted: bool,
    acknowledged: bool,
    attempts: u32,
    last_error: Option<String>,
}

impl ScoreSync {
    pub fn new(participant: ParticipantId) -> Self {
        Self {
            participant,
            submitted: false,
            acknowledged: false,
            attempts: 0,
            last_error: None,
        }
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Raise the guard and hand out a ticket, unless one is already out
    pub fn begin(&mut self, generation: u64, payload: ScorePayload) -> Option<SubmissionTicket> {
        if self.submitted || self.acknowledged {
            log::debug!("Submission already in flight or done, ignoring");
            return None;
        }
        self.submitted = true;
        self.attempts += 1;
        Some(SubmissionTicket {
            generation,
            participant: self.participant.clone(),
            payload,
        })
    }

    /// Record the network outcome. Returns whether the service acknowledged.
    pub fn complete(&mut self, result: &Result<SubmitAck, SyncError>) -> bool {
        match result {
            Ok(_) => {
                self.acknowledged = true;
                self.last_error = None;
                true
            }
            Err(e) => {
                self.submitted = false;
                self.last_error = Some(e.to_string());
                false
            }
        }
    }

    /// A failed attempt may be retried by an explicit user action
    pub fn can_retry(&self) -> bool {
        !self.submitted && !self.acknowledged && self.attempts > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ScorePayload {
        ScorePayload {
            score: 40,
            currency: 12,
            metadata: ScoreMetadata {
                game_id: "whack-a-mole".to_string(),
                outcome: TerminalReason::Exhausted,
                level: 1,
                best_streak: 3,
                duration_ms: 60_000,
                primaries_defeated: 4,
                bosses_defeated: 0,
            },
        }
    }

    #[test]
    fn test_guard_blocks_second_begin() {
        let mut sync = ScoreSync::new(ParticipantId::new("p-1"));
        assert!(sync.begin(1, payload()).is_some());
        assert!(sync.is_submitted());
        assert!(sync.begin(1, payload()).is_none());
        assert_eq!(sync.attempts(), 1);
    }

    #[test]
    fn test_failure_releases_guard_without_resubmitting() {
        let mut sync = ScoreSync::new(ParticipantId::new("p-1"));
        sync.begin(1, payload());
        let acked = sync.complete(&Err(SyncError::Unavailable("offline".into())));
        assert!(!acked);
        assert!(!sync.is_submitted());
        assert!(sync.can_retry());
        assert!(sync.last_error().unwrap().contains("offline"));
    }

    #[test]
    fn test_acknowledged_is_final() {
        let mut sync = ScoreSync::new(ParticipantId::new("p-1"));
        sync.begin(1, payload());
        let ack = SubmitAck {
            accepted: true,
            total_currency: Some(112),
            trophies: Vec::new(),
        };
        assert!(sync.complete(&Ok(ack)));
        assert!(!sync.can_retry());
        assert!(sync.begin(1, payload()).is_none());
    }

    #[test]
    fn test_payload_wire_format() {
        let json = serde_json::to_value(payload()).unwrap();
        assert_eq!(json["currency"], 12);
        assert_eq!(json["metadata"]["gameId"], "whack-a-mole");
        assert_eq!(json["metadata"]["outcome"], "exhausted");
        assert_eq!(json["metadata"]["bestStreak"], 3);
    }
}
