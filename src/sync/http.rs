//! HTTP client for the session/score service

use reqwest::{Client, Response};
use serde::Deserialize;

use super::{ParticipantId, ScorePayload, ScoreService, SubmitAck};
use crate::error::SyncError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinResponse {
    participant_id: String,
}

/// Score service reached over HTTP
///
/// - `POST {base}/games/{game_id}/sessions` → `{"participantId": ".."}`
/// - `POST {base}/participants/{id}/scores` with `{score, currency, metadata}`
#[derive(Debug, Clone)]
pub struct HttpScoreService {
    client: Client,
    base_url: String,
}

impl HttpScoreService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl ScoreService for HttpScoreService {
    async fn join_session(&self, game_id: &str) -> Result<ParticipantId, SyncError> {
        let url = self.url(&format!("/games/{game_id}/sessions"));
        log::debug!("POST {url}");

        let resp = self.client.post(&url).send().await?;
        let body: JoinResponse = ensure_success(resp).await?.json().await?;

        if body.participant_id.trim().is_empty() {
            return Err(SyncError::Rejected("empty participant id".to_string()));
        }
        Ok(ParticipantId::new(body.participant_id))
    }

    async fn submit_score(
        &self,
        participant: &ParticipantId,
        payload: &ScorePayload,
    ) -> Result<SubmitAck, SyncError> {
        let url = self.url(&format!("/participants/{participant}/scores"));
        log::debug!("POST {url} score={} currency={}", payload.score, payload.currency);

        let resp = self.client.post(&url).json(payload).send().await?;
        let ack: SubmitAck = ensure_success(resp).await?.json().await?;

        if !ack.accepted {
            return Err(SyncError::Rejected("submission not accepted".to_string()));
        }
        Ok(ack)
    }
}

async fn ensure_success(resp: Response) -> Result<Response, SyncError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(SyncError::Status {
        status: status.as_u16(),
        body,
    })
}
