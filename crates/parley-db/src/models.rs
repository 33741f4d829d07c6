//! Database row types. These map directly to SQLite rows.
//! Distinct from parley-types API models to keep the DB layer independent.
//! Ids are hyphenated UUID strings, timestamps are epoch microseconds.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// A conversation as seen by one participant.
#[derive(Debug, Clone)]
pub struct ConversationRow {
    pub id: String,
    pub kind: String,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub created_at: i64,
    /// The viewing participant's read marker.
    pub last_read_at: Option<i64>,
}

/// A participant joined with the user's display fields.
#[derive(Debug, Clone)]
pub struct ParticipantRow {
    pub conversation_id: String,
    pub user: UserRow,
    pub last_read_at: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub created_at: i64,
    pub sender_first_name: Option<String>,
    pub sender_last_name: Option<String>,
    pub sender_avatar_url: Option<String>,
}

/// Everything needed to summarize a user's conversations, read under one lock.
#[derive(Debug, Default)]
pub struct ConversationListing {
    pub conversations: Vec<ConversationRow>,
    pub participants: Vec<ParticipantRow>,
    /// Most recent message per conversation id.
    pub last_messages: HashMap<String, MessageRow>,
    /// Unread message count per conversation id; absent means zero.
    pub unread: HashMap<String, u64>,
}

/// Outcome of a one-to-one get-or-create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectConversation {
    pub id: String,
    pub created: bool,
}

#[derive(Debug, Clone)]
pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message: Option<String>,
    pub kind: String,
    pub is_read: bool,
    pub created_at: i64,
    pub related_entity_id: Option<String>,
    pub related_entity_type: Option<String>,
}
