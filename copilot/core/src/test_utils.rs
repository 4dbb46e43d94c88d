//! Test utilities: a scripted in-process backend
//!
//! Every endpoint answers with a preset result. Chat replies are consumed from a
//! queue, and an optional gate holds chat replies until the test releases them,
//! which keeps a turn "in flight" for as long as the test needs.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::backend::{BackendError, HelpdeskBackend};
use crate::messages::{
    AccessToken, ChallengeId, ChatReply, ChatRequest, ConversationId, HealthStatus, HistoryEntry,
    TicketSummary, UserProfile, UserRole,
};

/// Scripted backend
pub(crate) struct MockBackend {
    chat_replies: Mutex<VecDeque<Result<ChatReply, BackendError>>>,
    /// Every chat call: bearer token (raw) and request body
    pub chat_calls: Mutex<Vec<(Option<String>, ChatRequest)>>,
    gate: Option<Semaphore>,
    challenge: Mutex<Result<Option<ChallengeId>, BackendError>>,
    verify: Mutex<Result<AccessToken, BackendError>>,
    profile: Mutex<Result<UserProfile, BackendError>>,
    history: Mutex<Result<Vec<HistoryEntry>, BackendError>>,
    /// Names of the endpoints called, in order
    pub calls: Mutex<Vec<&'static str>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            chat_replies: Mutex::new(VecDeque::new()),
            chat_calls: Mutex::new(Vec::new()),
            gate: None,
            challenge: Mutex::new(Ok(Some(ChallengeId("challenge-1".to_string())))),
            verify: Mutex::new(Ok(AccessToken::new("access-1"))),
            profile: Mutex::new(Ok(profile("ada@example.com"))),
            history: Mutex::new(Ok(Vec::new())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Hold every chat reply until [`release`](Self::release) is called
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    /// Let one held chat reply through
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn with_chat(self, reply: Result<ChatReply, BackendError>) -> Self {
        self.chat_replies.lock().push_back(reply);
        self
    }

    /// Change the `/me` answer after construction
    pub fn set_profile(&self, result: Result<UserProfile, BackendError>) {
        *self.profile.lock() = result;
    }

    pub fn with_challenge(self, result: Result<Option<ChallengeId>, BackendError>) -> Self {
        *self.challenge.lock() = result;
        self
    }

    pub fn with_verify(self, result: Result<AccessToken, BackendError>) -> Self {
        *self.verify.lock() = result;
        self
    }

    pub fn with_profile(self, result: Result<UserProfile, BackendError>) -> Self {
        *self.profile.lock() = result;
        self
    }

    pub fn with_history(self, result: Result<Vec<HistoryEntry>, BackendError>) -> Self {
        *self.history.lock() = result;
        self
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == name).count()
    }
}

/// A successful chat reply with no attachments
pub(crate) fn reply(session_id: &str, answer: &str) -> ChatReply {
    ChatReply {
        session_id: ConversationId(session_id.to_string()),
        answer: answer.to_string(),
        tool_calls: Some(Vec::new()),
        sources: Some(Vec::new()),
        intent: None,
    }
}

pub(crate) fn profile(email: &str) -> UserProfile {
    UserProfile {
        id: "u1".to_string(),
        email: email.to_string(),
        name: email.split('@').next().unwrap_or(email).to_string(),
        role: UserRole::User,
    }
}

#[async_trait]
impl HelpdeskBackend for MockBackend {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn health(&self) -> Result<HealthStatus, BackendError> {
        self.calls.lock().push("health");
        Ok(HealthStatus {
            status: "ok".to_string(),
            timestamp: None,
        })
    }

    async fn request_challenge(&self, _email: &str) -> Result<Option<ChallengeId>, BackendError> {
        self.calls.lock().push("request_challenge");
        self.challenge.lock().clone()
    }

    async fn redeem_challenge(&self, _challenge: &ChallengeId) -> Result<AccessToken, BackendError> {
        self.calls.lock().push("redeem_challenge");
        self.verify.lock().clone()
    }

    async fn profile(&self, _token: &AccessToken) -> Result<UserProfile, BackendError> {
        self.calls.lock().push("profile");
        self.profile.lock().clone()
    }

    async fn chat(
        &self,
        token: Option<&AccessToken>,
        request: &ChatRequest,
    ) -> Result<ChatReply, BackendError> {
        self.calls.lock().push("chat");
        self.chat_calls
            .lock()
            .push((token.map(|t| t.as_str().to_string()), request.clone()));

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        self.chat_replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Transport("no scripted reply".to_string())))
    }

    async fn history(
        &self,
        _token: &AccessToken,
        _conversation: &ConversationId,
    ) -> Result<Vec<HistoryEntry>, BackendError> {
        self.calls.lock().push("history");
        self.history.lock().clone()
    }

    async fn ticket(
        &self,
        _token: &AccessToken,
        external_id: &str,
    ) -> Result<TicketSummary, BackendError> {
        self.calls.lock().push("ticket");
        Ok(TicketSummary {
            external_id: external_id.to_string(),
            short_desc: "VPN not connecting".to_string(),
            status: "New".to_string(),
            priority: Some("3".to_string()),
            opened_by: "ada@example.com".to_string(),
            assigned_to: None,
            created_at: "2024-05-01T09:30:00".to_string(),
            updated_at: "2024-05-01T09:30:00".to_string(),
        })
    }
}
