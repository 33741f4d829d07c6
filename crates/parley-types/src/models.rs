use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fallbacks used whenever a user's display fields are missing.
pub const UNKNOWN_FIRST_NAME: &str = "Unknown";
pub const UNKNOWN_LAST_NAME: &str = "User";
pub const UNKNOWN_EMAIL: &str = "no-email@example.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationKind {
    OneToOne,
    Group,
}

impl ConversationKind {
    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneToOne => "one_to_one",
            Self::Group => "group",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "one_to_one" => Some(Self::OneToOne),
            "group" => Some(Self::Group),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[default]
    Info,
    Message,
    System,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Message => "message",
            Self::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "info" => Some(Self::Info),
            "message" => Some(Self::Message),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

/// A user as exposed by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl UserProfile {
    pub fn first_name_or_default(&self) -> &str {
        self.first_name.as_deref().unwrap_or(UNKNOWN_FIRST_NAME)
    }

    pub fn last_name_or_default(&self) -> &str {
        self.last_name.as_deref().unwrap_or(UNKNOWN_LAST_NAME)
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name_or_default(), self.last_name_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_sentinels() {
        let user = UserProfile {
            id: Uuid::new_v4(),
            email: None,
            first_name: None,
            last_name: Some("Lovelace".into()),
            avatar_url: None,
        };
        assert_eq!(user.display_name(), "Unknown Lovelace");
    }

    #[test]
    fn kinds_parse_their_storage_form() {
        for kind in [ConversationKind::OneToOne, ConversationKind::Group] {
            assert_eq!(ConversationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationKind::parse("message"), Some(NotificationKind::Message));
        assert_eq!(NotificationKind::parse("bogus"), None);
    }

    #[test]
    fn wire_form_matches_storage_form() {
        let json = serde_json::to_string(&ConversationKind::OneToOne).unwrap();
        assert_eq!(json, "\"one_to_one\"");
        let json = serde_json::to_string(&NotificationKind::System).unwrap();
        assert_eq!(json, "\"system\"");
    }
}
