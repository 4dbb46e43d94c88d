//! Copilot Core - Chat Session Client for the IT Helpdesk Copilot
//!
//! This crate holds everything a helpdesk copilot surface needs besides
//! rendering: the signed-in session, the conversation with the backend, and the
//! magic-link login. It has no terminal or UI dependencies and can drive a
//! CLI, a GUI, or run headless in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Surfaces                              │
//! │        ┌─────────┐      ┌──────────────────────┐            │
//! │        │   CLI   │      │  Headless / tests    │            │
//! │        └────┬────┘      └──────────┬───────────┘            │
//! └─────────────┼──────────────────────┼────────────────────────┘
//!               └──────────┬───────────┘
//! ┌────────────────────────┼─────────────────────────────────────┐
//! │                    COPILOT CORE                              │
//! │  ┌─────────────────────┴──────────────────────────────────┐  │
//! │  │                      Copilot                           │  │
//! │  │  ┌──────────┐  ┌─────────────┐  ┌──────────────────┐  │  │
//! │  │  │ AuthFlow │  │ ChatSession │  │  SessionStore    │  │  │
//! │  │  └────┬─────┘  └──────┬──────┘  │ (file / memory)  │  │  │
//! │  │       └───────┬───────┘         └──────────────────┘  │  │
//! │  │        HelpdeskBackend (HTTP)                          │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Copilot`]: Restores the session, signs in and out, owns the conversation
//! - [`ChatSession`]: One conversation; optimistic, strictly ordered log
//! - [`AuthFlow`]: Two-step magic-link login
//! - [`SessionStore`]: Durable home of the access token
//! - [`HelpdeskBackend`]: The backend REST endpoints, as a trait
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use copilot_core::{load_config, Copilot, FileStore, HttpBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let backend = Arc::new(HttpBackend::new(&config)?);
//!     let store = FileStore::new(config.token_path.clone());
//!     let mut copilot = Copilot::new(backend, store, config);
//!
//!     if !copilot.restore().await? {
//!         copilot.login("ada@example.com").await?;
//!     }
//!     if let Some(chat) = copilot.chat_mut() {
//!         chat.send_message("My VPN keeps disconnecting").await?;
//!         for message in chat.log() {
//!             println!("{:?}: {}", message.role, message.text);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`auth`]: Magic-link login
//! - [`backend`]: Backend abstraction and the HTTP implementation
//! - [`chat`]: Chat session client and turn lifecycle
//! - [`client`]: The composed copilot client
//! - [`config`]: Configuration loading (file, environment, overrides)
//! - [`conversation`]: Messages and the append-only conversation log
//! - [`messages`]: Identifiers and wire records
//! - [`session`]: Session state and token stores

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod backend;
pub mod chat;
pub mod client;
pub mod config;
pub mod conversation;
pub mod messages;
pub mod session;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports for convenience
pub use auth::{AuthError, AuthFlow, LoginOutcome};
pub use backend::{BackendError, HelpdeskBackend, HttpBackend};
pub use chat::{ChatSession, ChatState, SendRejection, TurnOutcome};
pub use client::{ClientError, Copilot};
pub use conversation::{ConversationLog, Message, FAILURE_NOTICE};
pub use messages::{
    AccessToken, ActionRecord, ChallengeId, ChatReply, ChatRequest, ConversationId,
    HealthStatus, HistoryEntry, MessageId, MessageRole, ReleaseYear, SourceRecord, TicketSummary,
    UserProfile, UserRole,
};
pub use session::{FileStore, MemoryStore, Session, SessionStore, StoreError};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ClientConfig, ClientToml,
    ConfigError, ConfigOverrides, ConfigSource,
};
