use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, error};
use uuid::Uuid;

use parley_db::{Database, from_micros, now_micros};
use parley_gateway::hub::Hub;
use parley_types::api::{Claims, CreateMessageRequest, MessageDto};
use parley_types::events::GatewayEvent;
use parley_types::models::{NotificationKind, UserProfile};

use crate::blocking;
use crate::conversations::check_membership;
use crate::convert::{parse_uuid, user_profile};
use crate::error::ApiError;
use crate::notifications::{NewNotification, NotificationService};
use crate::state::AppState;

pub const MAX_CONTENT_CHARS: usize = 4000;

/// Body used for notifications about messages without text.
pub const EMPTY_PREVIEW: &str = "Sent an attachment";

const PREVIEW_LIMIT: usize = 50;
const PREVIEW_KEEP: usize = 47;

/// Validates, stores and fans out new messages.
#[derive(Clone)]
pub struct MessageIntake {
    db: Arc<Database>,
    hub: Hub,
    notifications: NotificationService,
    order: SendOrder,
}

/// One async lock per conversation, held from insert through push so every
/// live connection sees a conversation's messages in stored order.
#[derive(Clone, Default)]
struct SendOrder {
    locks: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl SendOrder {
    async fn turn(&self, conversation_id: Uuid) -> SendTurn {
        let lock = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(conversation_id)
            .or_default()
            .clone();

        SendTurn {
            order: self.clone(),
            conversation_id,
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Exclusive right to persist and push in one conversation. Dropping it
/// frees the lock and forgets it once nobody else is waiting.
struct SendTurn {
    order: SendOrder,
    conversation_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SendTurn {
    fn drop(&mut self) {
        let mut locks = self.order.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Our guard's Arc goes first; a count of 1 means only the map holds it
        self.guard.take();
        if locks
            .get(&self.conversation_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.conversation_id);
        }
    }
}

impl MessageIntake {
    pub fn new(db: Arc<Database>, hub: Hub, notifications: NotificationService) -> Self {
        Self {
            db,
            hub,
            notifications,
            order: SendOrder::default(),
        }
    }

    /// Store a message and deliver it.
    ///
    /// Once the message is stored this succeeds: push and notification
    /// failures are logged, not returned.
    pub async fn send(
        &self,
        caller: Uuid,
        req: CreateMessageRequest,
    ) -> Result<MessageDto, ApiError> {
        validate_content(&req.content)?;

        let (sender, message, recipients) = {
            let _turn = self.order.turn(req.conversation_id).await;
            self.persist_and_push(caller, req).await?
        };

        self.notify_others(&sender, &message, &recipients).await;

        Ok(message)
    }

    async fn persist_and_push(
        &self,
        caller: Uuid,
        req: CreateMessageRequest,
    ) -> Result<(UserProfile, MessageDto, Vec<Uuid>), ApiError> {
        let message_id = Uuid::new_v4();
        let cid = req.conversation_id.to_string();
        let uid = caller.to_string();
        let mid = message_id.to_string();
        let content = req.content.clone();

        let (sender, participant_ids, created_at) = blocking(&self.db, move |db| {
            if let Err(denied) = check_membership(db, &cid, &uid)? {
                return Ok(Err(denied));
            }
            let sender = db.get_user(&uid)?;
            let created_at = now_micros();
            db.insert_message(&mid, &cid, &uid, &content, created_at)?;
            // Fresh from the Store, never from room subscriptions
            let participants = db.participant_ids(&cid)?;
            Ok(Ok((sender, participants, created_at)))
        })
        .await??;

        let sender = sender.map(user_profile).unwrap_or_else(|| UserProfile {
            id: caller,
            email: None,
            first_name: None,
            last_name: None,
            avatar_url: None,
        });

        let message = MessageDto {
            id: message_id,
            conversation_id: req.conversation_id,
            content: req.content,
            timestamp: from_micros(created_at),
            sender_id: caller,
            sender_first_name: sender.first_name_or_default().to_string(),
            sender_last_name: sender.last_name_or_default().to_string(),
            sender_avatar_url: sender.avatar_url.clone(),
        };

        let recipients: Vec<Uuid> = participant_ids
            .iter()
            .map(|id| parse_uuid(id, "participant id"))
            .collect();

        let delivered = self
            .hub
            .push_to_users(&recipients, &GatewayEvent::ReceiveMessage(message.clone()))
            .await;
        debug!(
            "Message {} delivered live to {} connection(s) of {} participant(s)",
            message.id,
            delivered,
            recipients.len()
        );

        Ok((sender, message, recipients))
    }

    async fn notify_others(&self, sender: &UserProfile, message: &MessageDto, recipients: &[Uuid]) {
        let title = format!("New message from {}", sender.display_name());
        let body = preview(&message.content);

        for &recipient in recipients.iter().filter(|&&id| id != message.sender_id) {
            let result = self
                .notifications
                .create(NewNotification {
                    user_id: recipient,
                    title: title.clone(),
                    message: Some(body.clone()),
                    kind: NotificationKind::Message,
                    related_entity_id: Some(message.conversation_id.to_string()),
                    related_entity_type: Some("Conversation".to_string()),
                })
                .await;

            if let Err(e) = result {
                error!(
                    "Failed to notify {} about message {}: {}",
                    recipient, message.id, e
                );
            }
        }
    }
}

/// Rejects empty, whitespace-only and over-long content.
pub fn validate_content(content: &str) -> Result<(), ApiError> {
    if content.trim().is_empty() {
        return Err(ApiError::invalid("content", "content is required"));
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(ApiError::invalid(
            "content",
            format!("content must be at most {} characters", MAX_CONTENT_CHARS),
        ));
    }
    Ok(())
}

/// Notification body for a message.
pub fn preview(content: &str) -> String {
    if content.is_empty() {
        return EMPTY_PREVIEW.to_string();
    }
    if content.chars().count() > PREVIEW_LIMIT {
        let kept: String = content.chars().take(PREVIEW_KEEP).collect();
        format!("{}...", kept)
    } else {
        content.to_string()
    }
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let message = state.intake.send(claims.sub, req).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
