//! Wire and Domain Records
//!
//! Identifiers and records exchanged with the helpdesk backend. Everything the
//! backend reports is decoded into an explicit record; a body that is missing a
//! required field or carries an unrecognised shape fails to decode and is routed
//! through the normal error path instead of being half-read.
//!
//! # JSON Shapes
//!
//! ```text
//! POST /chat          { "sessionId"?: str, "message": str }
//!                  -> { "sessionId": str, "answer": str,
//!                       "toolCalls"?: [ActionRecord], "sources"?: [SourceRecord],
//!                       "intent"?: str }
//! POST /auth/magic-link { "email": str } -> { "message"?: str, "token"?: str }
//! GET  /auth/verify?token=..              -> { "access_token": str, "token_type"?: str }
//! GET  /me                                -> UserProfile
//! ```

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Identifiers
// ============================================

/// Opaque bearer credential used to authorize backend calls
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token string
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building the `Authorization` header or persisting
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never expose the credential in logs
        write!(f, "AccessToken([REDACTED])")
    }
}

/// Opaque login challenge issued by `/auth/magic-link`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChallengeId(pub String);

/// Backend-assigned handle for a multi-turn conversation
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    /// Borrow the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique message identifier (local to this process)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("msg_{id}"))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

/// Who authored a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The signed-in user
    User,
    /// The helpdesk assistant
    Assistant,
}

// ============================================
// Backend-reported records
// ============================================

/// Side effect the backend performed during a chat turn (e.g. a created ticket)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionRecord {
    /// Tool that ran, e.g. `create_ticket`
    pub tool: String,
    /// Identifier of the affected object, e.g. `INC0012345`
    pub id: String,
}

/// Citation supporting an assistant answer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceRecord {
    /// A chunk retrieved from the knowledge base
    #[serde(rename_all = "camelCase")]
    KnowledgeChunk {
        /// Chunk identifier
        id: String,
        /// Parent document, when known
        #[serde(default, skip_serializing_if = "Option::is_none")]
        doc_id: Option<String>,
        /// Excerpt of the chunk text
        text: String,
    },
    /// An entry from a catalog collection
    CatalogEntry {
        /// Entry title
        title: String,
        /// Release year, when known
        #[serde(default, skip_serializing_if = "Option::is_none")]
        year: Option<ReleaseYear>,
    },
}

/// Year attached to a catalog entry
///
/// Catalog data is not uniform: entries without a year carry a placeholder
/// string such as `"N/A"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReleaseYear {
    /// A numeric year
    Number(i32),
    /// Anything the catalog put there instead
    Text(String),
}

impl std::fmt::Display for ReleaseYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(year) => write!(f, "{year}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Account role as reported by `/me`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular user
    User,
    /// Administrator (may trigger knowledge-base ingestion)
    Admin,
    /// Helpdesk staff
    Helpdesk,
    /// A role this client does not know about
    #[serde(other)]
    Other,
}

/// Signed-in user, as returned by `/me`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend user id
    pub id: String,
    /// Login email
    pub email: String,
    /// Display name
    pub name: String,
    /// Account role
    pub role: UserRole,
}

/// Ticket details from `/tickets/{external_id}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSummary {
    /// Ticket number in the external system
    pub external_id: String,
    /// One-line description
    pub short_desc: String,
    /// Workflow status
    pub status: String,
    /// Priority, when set
    #[serde(default)]
    pub priority: Option<String>,
    /// Who opened the ticket
    pub opened_by: String,
    /// Current assignee, when set
    #[serde(default)]
    pub assigned_to: Option<String>,
    /// Creation time as reported by the ticket system
    pub created_at: String,
    /// Last update time as reported by the ticket system
    pub updated_at: String,
}

/// Body of `/health`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    /// `"ok"` when the backend is serving
    pub status: String,
    /// Backend clock at the time of the check
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthStatus {
    /// Whether the backend reported itself healthy
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

// ============================================
// Request/response envelopes
// ============================================

/// Body of `POST /chat`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Conversation to continue (absent on the first message)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<ConversationId>,
    /// The user's message
    pub message: String,
}

/// Successful body of `POST /chat`
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    /// Conversation the turn belongs to
    pub session_id: ConversationId,
    /// Assistant answer text
    pub answer: String,
    /// Side effects, `null` treated as none
    #[serde(default)]
    pub tool_calls: Option<Vec<ActionRecord>>,
    /// Citations, `null` treated as none
    #[serde(default)]
    pub sources: Option<Vec<SourceRecord>>,
    /// Intent the backend classified the message as
    #[serde(default)]
    pub intent: Option<String>,
}

/// Body of `POST /auth/magic-link`
#[derive(Clone, Debug, Serialize)]
pub(crate) struct ChallengeRequest<'a> {
    pub email: &'a str,
}

/// Response of `POST /auth/magic-link`
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct ChallengeReply {
    /// Challenge id; absent when it is only delivered out-of-band
    #[serde(default)]
    pub token: Option<String>,
}

/// Response of `GET /auth/verify`
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct VerifyReply {
    pub access_token: String,
}

/// One stored message from `/sessions/{id}/messages`
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Backend message id
    pub id: String,
    /// Author
    pub role: MessageRole,
    /// Message text
    pub text: String,
    /// Side effects recorded with the message
    #[serde(default)]
    pub tool_calls: Option<Vec<ActionRecord>>,
    /// When the backend stored the message (UTC, no offset)
    pub created_at: NaiveDateTime,
}

impl HistoryEntry {
    /// Creation time as a UTC instant
    #[must_use]
    pub fn created_at_utc(&self) -> DateTime<Utc> {
        self.created_at.and_utc()
    }
}

/// Response of `/sessions/{id}/messages`
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct HistoryReply {
    pub messages: Vec<HistoryEntry>,
}
