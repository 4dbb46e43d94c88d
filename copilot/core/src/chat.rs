//! Chat Session Client
//!
//! Drives one conversation with the helpdesk backend. The client owns the
//! [`Session`], the [`ConversationLog`] and the pending input buffer, and keeps
//! at most one chat request outstanding.
//!
//! # Turn lifecycle
//!
//! ```text
//!   Idle ──submit──► AwaitingResponse ──reply──► Idle
//!    ▲                      │
//!    └──────── failure ◄────┘
//! ```
//!
//! Submitting a turn appends the user message and clears the input before the
//! request leaves. A reply appends exactly one assistant message, built from
//! the answer on success or a failure notice otherwise. The user message is
//! never rolled back.
//!
//! Surfaces that run their own event loop use [`ChatSession::submit`] followed
//! by [`ChatSession::poll_reply`] (or [`ChatSession::wait_reply`]). Everyone
//! else can simply await [`ChatSession::send_message`].

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;

use crate::backend::{BackendError, HelpdeskBackend};
use crate::config::ClientConfig;
use crate::conversation::{ConversationLog, Message};
use crate::messages::{AccessToken, ChatReply, ChatRequest, ConversationId};
use crate::session::Session;

type PendingReply = oneshot::Receiver<Result<ChatReply, BackendError>>;

/// Where the client is in the turn lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatState {
    /// No request outstanding; a message may be sent
    Idle,
    /// A chat request is in flight
    AwaitingResponse,
}

/// Why a message was not sent
///
/// A rejected send leaves the log, the input buffer and the session untouched.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SendRejection {
    /// The text was empty or whitespace-only
    #[error("message is empty")]
    EmptyMessage,
    /// Another turn is still awaiting its reply
    #[error("a message is already being sent")]
    RequestInFlight,
}

/// How a completed turn ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The assistant answer was appended
    Answered,
    /// A failure notice was appended
    Failed,
}

/// Chat client for one conversation
pub struct ChatSession<B: HelpdeskBackend + 'static> {
    backend: Arc<B>,
    session: Session,
    log: ConversationLog,
    /// Text the user is composing
    input: String,
    /// Reply of the in-flight turn
    pending: Option<PendingReply>,
    /// Attach the bearer token to chat requests
    send_auth: bool,
    /// Append failure detail to the failure notice
    show_error_detail: bool,
    request_timeout: Option<Duration>,
}

impl<B: HelpdeskBackend + 'static> ChatSession<B> {
    /// Start a new conversation
    ///
    /// The conversation id is assigned by the backend on the first reply.
    pub fn new(backend: Arc<B>, auth_token: Option<AccessToken>, config: &ClientConfig) -> Self {
        Self::from_parts(backend, Session::new(auth_token), ConversationLog::new(), config)
    }

    /// Continue an existing conversation
    ///
    /// The log is pre-filled with the stored history, oldest first, and the
    /// conversation id is fixed to `conversation`.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the history cannot be fetched.
    pub async fn resume(
        backend: Arc<B>,
        auth_token: AccessToken,
        conversation: ConversationId,
        config: &ClientConfig,
    ) -> Result<Self, BackendError> {
        let history = backend.history(&auth_token, &conversation).await?;
        tracing::info!(
            conversation = %conversation,
            messages = history.len(),
            "Resumed conversation"
        );

        let mut log = ConversationLog::new();
        log.extend(history.into_iter().map(Message::from));

        Ok(Self::from_parts(
            backend,
            Session::with_conversation(Some(auth_token), conversation),
            log,
            config,
        ))
    }

    fn from_parts(
        backend: Arc<B>,
        session: Session,
        log: ConversationLog,
        config: &ClientConfig,
    ) -> Self {
        Self {
            backend,
            session,
            log,
            input: String::new(),
            pending: None,
            send_auth: config.send_auth_on_chat,
            show_error_detail: config.show_error_detail,
            request_timeout: config.request_timeout,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The conversation so far
    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// The session (token and conversation id)
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Conversation id, once the backend assigned one
    pub fn conversation_id(&self) -> Option<&ConversationId> {
        self.session.conversation_id()
    }

    /// Current lifecycle state
    pub fn state(&self) -> ChatState {
        if self.pending.is_some() {
            ChatState::AwaitingResponse
        } else {
            ChatState::Idle
        }
    }

    /// Whether a reply is outstanding
    pub fn is_loading(&self) -> bool {
        self.state() == ChatState::AwaitingResponse
    }

    /// Text the user is composing
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replace the input buffer (editable while a reply is pending)
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    // ========================================================================
    // Sending
    // ========================================================================

    /// Send a message and wait for the reply
    ///
    /// # Errors
    ///
    /// Returns a [`SendRejection`] if the message is blank or a turn is
    /// already in flight. Backend failures are not errors: they complete the
    /// turn with [`TurnOutcome::Failed`].
    pub async fn send_message(&mut self, text: &str) -> Result<TurnOutcome, SendRejection> {
        self.submit(text)?;
        Ok(self.wait_reply().await.unwrap_or(TurnOutcome::Failed))
    }

    /// Send the input buffer and wait for the reply
    ///
    /// # Errors
    ///
    /// Same as [`send_message`](Self::send_message).
    pub async fn send_input(&mut self) -> Result<TurnOutcome, SendRejection> {
        let text = self.input.clone();
        self.send_message(&text).await
    }

    /// Start a turn without waiting for the reply
    ///
    /// Appends the user message, clears the input and issues the chat request
    /// on a spawned task before returning. Must be called inside a Tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns a [`SendRejection`] without touching any state if the message
    /// is blank or a turn is already in flight.
    pub fn submit(&mut self, text: &str) -> Result<(), SendRejection> {
        if self.pending.is_some() {
            tracing::debug!("Rejected send: request in flight");
            return Err(SendRejection::RequestInFlight);
        }
        if text.trim().is_empty() {
            return Err(SendRejection::EmptyMessage);
        }

        self.log.push(Message::user(text));
        self.input.clear();

        let request = ChatRequest {
            session_id: self.session.conversation_id().cloned(),
            message: text.to_string(),
        };
        let token = if self.send_auth {
            self.session.auth_token().cloned()
        } else {
            None
        };
        tracing::debug!(
            backend = self.backend.name(),
            conversation = ?request.session_id,
            "Submitting chat turn"
        );

        let (tx, rx) = oneshot::channel();
        let backend = Arc::clone(&self.backend);
        let timeout = self.request_timeout;
        tokio::spawn(async move {
            let call = backend.chat(token.as_ref(), &request);
            let result = match timeout {
                Some(limit) => tokio::time::timeout(limit, call)
                    .await
                    .unwrap_or(Err(BackendError::Timeout)),
                None => call.await,
            };
            // Receiver dropped means the session is gone; nothing to deliver to
            let _ = tx.send(result);
        });

        self.pending = Some(rx);
        Ok(())
    }

    /// Apply the reply of the in-flight turn if it has arrived
    ///
    /// Returns `None` when nothing is pending or the reply is not there yet.
    pub fn poll_reply(&mut self) -> Option<TurnOutcome> {
        let pending = self.pending.as_mut()?;
        let result = match pending.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return None,
            Err(oneshot::error::TryRecvError::Closed) => Err(lost_reply()),
        };
        self.pending = None;
        Some(self.finish_turn(result))
    }

    /// Wait for the in-flight turn to complete and apply its reply
    ///
    /// Returns `None` when nothing is pending. Dropping the returned future
    /// leaves the turn pending.
    pub async fn wait_reply(&mut self) -> Option<TurnOutcome> {
        let pending = self.pending.as_mut()?;
        let result = pending.await.unwrap_or_else(|_| Err(lost_reply()));
        self.pending = None;
        Some(self.finish_turn(result))
    }

    fn finish_turn(&mut self, result: Result<ChatReply, BackendError>) -> TurnOutcome {
        match result {
            Ok(reply) => {
                if self.session.adopt_conversation(reply.session_id.clone()) {
                    tracing::info!(conversation = %reply.session_id, "Conversation started");
                } else if self.session.conversation_id() != Some(&reply.session_id) {
                    tracing::debug!(
                        returned = %reply.session_id,
                        "Ignoring conversation id from later reply"
                    );
                }
                if let Some(intent) = &reply.intent {
                    tracing::debug!(intent = %intent, "Reply classified");
                }

                self.log.push(Message::assistant(
                    reply.answer,
                    reply.tool_calls.unwrap_or_default(),
                    reply.sources.unwrap_or_default(),
                ));
                TurnOutcome::Answered
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chat turn failed");
                self.log
                    .push(Message::failure(e.to_string(), self.show_error_detail));
                TurnOutcome::Failed
            }
        }
    }
}

fn lost_reply() -> BackendError {
    BackendError::Transport("chat request ended without a reply".to_string())
}
