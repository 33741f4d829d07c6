//! Row -> wire type conversions. Corrupt ids and enum values are logged and
//! replaced rather than failing the whole response.

use tracing::warn;
use uuid::Uuid;

use parley_db::from_micros;
use parley_db::models::{MessageRow, NotificationRow, UserRow};
use parley_types::api::{MessageDto, NotificationSummary, ParticipantSummary, UserSummary};
use parley_types::models::{
    NotificationKind, UNKNOWN_EMAIL, UNKNOWN_FIRST_NAME, UNKNOWN_LAST_NAME, UserProfile,
};

pub fn parse_uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

pub fn user_profile(row: UserRow) -> UserProfile {
    UserProfile {
        id: parse_uuid(&row.id, "user id"),
        email: row.email,
        first_name: row.first_name,
        last_name: row.last_name,
        avatar_url: row.avatar_url,
    }
}

pub fn participant_summary(row: UserRow) -> ParticipantSummary {
    ParticipantSummary {
        id: parse_uuid(&row.id, "user id"),
        email: row.email.unwrap_or_else(|| UNKNOWN_EMAIL.to_string()),
        first_name: row.first_name.unwrap_or_else(|| UNKNOWN_FIRST_NAME.to_string()),
        last_name: row.last_name.unwrap_or_else(|| UNKNOWN_LAST_NAME.to_string()),
        avatar_url: row.avatar_url,
    }
}

pub fn user_summary(row: UserRow) -> UserSummary {
    let p = participant_summary(row);
    UserSummary {
        id: p.id,
        email: p.email,
        first_name: p.first_name,
        last_name: p.last_name,
        avatar_url: p.avatar_url,
    }
}

pub fn message_dto(row: MessageRow) -> MessageDto {
    MessageDto {
        id: parse_uuid(&row.id, "message id"),
        conversation_id: parse_uuid(&row.conversation_id, "conversation id"),
        content: row.content,
        timestamp: from_micros(row.created_at),
        sender_id: parse_uuid(&row.sender_id, "sender id"),
        sender_first_name: row
            .sender_first_name
            .unwrap_or_else(|| UNKNOWN_FIRST_NAME.to_string()),
        sender_last_name: row
            .sender_last_name
            .unwrap_or_else(|| UNKNOWN_LAST_NAME.to_string()),
        sender_avatar_url: row.sender_avatar_url,
    }
}

pub fn notification_summary(row: NotificationRow) -> NotificationSummary {
    let kind = NotificationKind::parse(&row.kind).unwrap_or_else(|| {
        warn!("Unknown notification kind '{}' on '{}'", row.kind, row.id);
        NotificationKind::Info
    });

    NotificationSummary {
        id: parse_uuid(&row.id, "notification id"),
        title: row.title,
        message: row.message,
        kind,
        is_read: row.is_read,
        created_at: from_micros(row.created_at),
        related_entity_id: row.related_entity_id,
        related_entity_type: row.related_entity_type,
    }
}
