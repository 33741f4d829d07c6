use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{MessageDto, NotificationSummary};

/// Events pushed over the WebSocket gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all_fields = "camelCase")]
pub enum GatewayEvent {
    /// Server confirms the connection is registered
    Ready {
        user_id: Uuid,
        conversation_count: usize,
    },

    /// A message was posted in one of the user's conversations
    ReceiveMessage(MessageDto),

    /// A notification was created for the user
    ReceiveNotification(NotificationSummary),
}

impl GatewayEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "Ready",
            Self::ReceiveMessage(_) => "ReceiveMessage",
            Self::ReceiveNotification(_) => "ReceiveNotification",
        }
    }
}
