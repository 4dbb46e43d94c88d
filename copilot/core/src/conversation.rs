//! Conversation Log
//!
//! The ordered, append-only record of a chat: what the user sent and what the
//! assistant answered, in the order it happened. Messages are never removed,
//! reordered or merged once pushed.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::messages::{ActionRecord, HistoryEntry, MessageId, MessageRole, SourceRecord};

/// Text shown when a chat turn fails
pub const FAILURE_NOTICE: &str = "Sorry, I encountered an error. Please try again.";

/// A message in the conversation
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Message {
    /// Unique message ID
    #[serde(skip)]
    pub id: MessageId,
    /// Who sent this message
    pub role: MessageRole,
    /// Message text
    pub text: String,
    /// Side effects reported with an assistant answer
    pub actions: Vec<ActionRecord>,
    /// Citations reported with an assistant answer
    pub sources: Vec<SourceRecord>,
    /// When the message was created
    pub created_at: DateTime<Utc>,
    /// Diagnostic detail when this message reports a failed turn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Message {
    /// A message typed by the user
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: MessageRole::User,
            text: text.into(),
            actions: Vec::new(),
            sources: Vec::new(),
            created_at: Utc::now(),
            error: None,
        }
    }

    /// An assistant answer with its attachments
    pub fn assistant(
        text: impl Into<String>,
        actions: Vec<ActionRecord>,
        sources: Vec<SourceRecord>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            role: MessageRole::Assistant,
            text: text.into(),
            actions,
            sources,
            created_at: Utc::now(),
            error: None,
        }
    }

    /// An assistant message reporting that a turn failed
    ///
    /// The detail is kept on the message; it only becomes part of the text when
    /// `show_detail` is set.
    pub fn failure(detail: impl Into<String>, show_detail: bool) -> Self {
        let detail = detail.into();
        let text = if show_detail {
            format!("{FAILURE_NOTICE} ({detail})")
        } else {
            FAILURE_NOTICE.to_string()
        };
        Self {
            error: Some(detail),
            ..Self::assistant(text, Vec::new(), Vec::new())
        }
    }

    /// Whether this message reports a failed turn
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

impl From<HistoryEntry> for Message {
    fn from(entry: HistoryEntry) -> Self {
        let created_at = entry.created_at_utc();
        Self {
            id: MessageId::new(),
            role: entry.role,
            text: entry.text,
            actions: entry.tool_calls.unwrap_or_default(),
            sources: Vec::new(),
            created_at,
            error: None,
        }
    }
}

/// Ordered message history of one conversation
///
/// Only grows: entries are never removed or reordered.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the end
    pub fn push(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// All messages, oldest first
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Most recent message
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Get message by ID
    #[must_use]
    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    /// Number of messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether nothing has been said yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterate oldest first
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

impl Extend<Message> for ConversationLog {
    fn extend<T: IntoIterator<Item = Message>>(&mut self, iter: T) {
        self.messages.extend(iter);
    }
}

impl<'a> IntoIterator for &'a ConversationLog {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
