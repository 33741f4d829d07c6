use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use parley_db::models::ConversationListing;
use parley_db::{Database, from_micros, now_micros};
use parley_gateway::hub::Hub;
use parley_types::api::{
    Claims, ConversationSummary, CreateGroupRequest, MessageDto, ParticipantSummary,
};
use parley_types::models::ConversationKind;

use crate::blocking;
use crate::convert::{message_dto, parse_uuid, participant_summary};
use crate::error::ApiError;
use crate::state::AppState;

const MAX_GROUP_NAME_CHARS: usize = 255;

/// Conversation listing, one-to-one get-or-create, message history and read
/// markers. Every operation takes the caller's id explicitly.
#[derive(Clone)]
pub struct ConversationService {
    db: Arc<Database>,
    hub: Hub,
}

impl ConversationService {
    pub fn new(db: Arc<Database>, hub: Hub) -> Self {
        Self { db, hub }
    }

    /// The caller's conversations, most recently active first.
    pub async fn list(&self, caller: Uuid) -> Result<Vec<ConversationSummary>, ApiError> {
        let uid = caller.to_string();
        let listing = blocking(&self.db, move |db| db.list_conversations_for_user(&uid)).await?;

        let mut summaries = summarize(listing, caller);
        summaries.sort_by(|a, b| last_activity(b).cmp(&last_activity(a)).then(a.id.cmp(&b.id)));
        Ok(summaries)
    }

    /// Full history, oldest first. NotFound for an unknown conversation,
    /// Forbidden when the caller is not a participant.
    pub async fn messages(
        &self,
        conversation_id: Uuid,
        caller: Uuid,
    ) -> Result<Vec<MessageDto>, ApiError> {
        let cid = conversation_id.to_string();
        let uid = caller.to_string();

        let rows = blocking(&self.db, move |db| {
            if let Err(denied) = check_membership(db, &cid, &uid)? {
                return Ok(Err(denied));
            }
            Ok(Ok(db.get_messages(&cid)?))
        })
        .await??;

        Ok(rows.into_iter().map(message_dto).collect())
    }

    pub async fn get_or_create_one_to_one(
        &self,
        caller: Uuid,
        other: Uuid,
    ) -> Result<ConversationSummary, ApiError> {
        if caller == other {
            return Err(ApiError::invalid(
                "otherUserId",
                "cannot start a conversation with yourself",
            ));
        }

        let uid = caller.to_string();
        let oid = other.to_string();
        let candidate = Uuid::new_v4().to_string();

        let (direct, listing) = blocking(&self.db, move |db| {
            // Callers sync their profile via PUT /users/me before chatting
            if db.get_user(&uid)?.is_none() || db.get_user(&oid)?.is_none() {
                return Ok(Err(ApiError::NotFound("user")));
            }
            // A lost creation race comes back as the winner's row
            let direct = db.get_or_create_direct(&candidate, &uid, &oid, now_micros())?;
            let listing = db.conversation_for_user(&direct.id, &uid)?;
            Ok(Ok((direct, listing)))
        })
        .await??;

        let conversation_id = parse_uuid(&direct.id, "conversation id");
        if direct.created {
            info!("Created one-to-one conversation {} for {} and {}", conversation_id, caller, other);
            self.hub.join_room(&[caller, other], conversation_id).await;
        }

        single(listing, caller, conversation_id)
    }

    /// Groups are never deduplicated. The caller is always a member.
    pub async fn create_group(
        &self,
        caller: Uuid,
        req: CreateGroupRequest,
    ) -> Result<ConversationSummary, ApiError> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::invalid("name", "name is required"));
        }
        if name.chars().count() > MAX_GROUP_NAME_CHARS {
            return Err(ApiError::invalid(
                "name",
                format!("name must be at most {} characters", MAX_GROUP_NAME_CHARS),
            ));
        }

        let mut members = vec![caller];
        for id in req.member_ids {
            if !members.contains(&id) {
                members.push(id);
            }
        }

        let conversation_id = Uuid::new_v4();
        let cid = conversation_id.to_string();
        let uid = caller.to_string();
        let member_ids: Vec<String> = members.iter().map(Uuid::to_string).collect();
        let image_url = req.image_url;

        let listing = blocking(&self.db, move |db| {
            for member in &member_ids {
                if db.get_user(member)?.is_none() {
                    return Ok(Err(ApiError::NotFound("user")));
                }
            }
            db.create_group(&cid, &name, image_url.as_deref(), &member_ids, now_micros())?;
            Ok(Ok(db.conversation_for_user(&cid, &uid)?))
        })
        .await??;

        info!("{} created group {} with {} members", caller, conversation_id, members.len());
        self.hub.join_room(&members, conversation_id).await;

        single(listing, caller, conversation_id)
    }

    /// Move the caller's read marker to now. Returns false if the caller is
    /// not a participant (there is no marker to move).
    pub async fn mark_as_read(&self, conversation_id: Uuid, caller: Uuid) -> Result<bool, ApiError> {
        let cid = conversation_id.to_string();
        let uid = caller.to_string();
        blocking(&self.db, move |db| db.set_last_read(&cid, &uid, now_micros())).await
    }
}

/// NotFound for an unknown conversation, Forbidden for a non-participant.
pub(crate) fn check_membership(
    db: &Database,
    conversation_id: &str,
    user_id: &str,
) -> anyhow::Result<Result<(), ApiError>> {
    if !db.conversation_exists(conversation_id)? {
        return Ok(Err(ApiError::NotFound("conversation")));
    }
    if !db.is_participant(conversation_id, user_id)? {
        return Ok(Err(ApiError::Forbidden));
    }
    Ok(Ok(()))
}

fn last_activity(summary: &ConversationSummary) -> chrono::DateTime<chrono::Utc> {
    summary
        .last_message
        .as_ref()
        .map_or(summary.created_at, |m| m.timestamp)
}

fn single(
    listing: ConversationListing,
    caller: Uuid,
    conversation_id: Uuid,
) -> Result<ConversationSummary, ApiError> {
    summarize(listing, caller).into_iter().next().ok_or_else(|| {
        ApiError::Internal(anyhow::anyhow!(
            "conversation {} missing right after creation",
            conversation_id
        ))
    })
}

/// Assemble summaries as seen by `caller`. One-to-one conversations take
/// their name and image from the other participant.
fn summarize(listing: ConversationListing, caller: Uuid) -> Vec<ConversationSummary> {
    let ConversationListing {
        conversations,
        participants,
        mut last_messages,
        unread,
    } = listing;

    let mut by_conversation: HashMap<String, Vec<ParticipantSummary>> = HashMap::new();
    for p in participants {
        by_conversation
            .entry(p.conversation_id)
            .or_default()
            .push(participant_summary(p.user));
    }

    conversations
        .into_iter()
        .map(|row| {
            let kind = ConversationKind::parse(&row.kind).unwrap_or_else(|| {
                warn!("Unknown conversation kind '{}' on '{}'", row.kind, row.id);
                ConversationKind::Group
            });
            let participants = by_conversation.remove(&row.id).unwrap_or_default();

            let (name, image_url) = match kind {
                ConversationKind::OneToOne => participants
                    .iter()
                    .find(|p| p.id != caller)
                    .map(|other| {
                        (
                            Some(format!("{} {}", other.first_name, other.last_name)),
                            other.avatar_url.clone(),
                        )
                    })
                    .unwrap_or((None, None)),
                ConversationKind::Group => (row.name, row.image_url),
            };

            ConversationSummary {
                id: parse_uuid(&row.id, "conversation id"),
                kind,
                name,
                image_url,
                created_at: from_micros(row.created_at),
                last_message: last_messages.remove(&row.id).map(message_dto),
                unread_count: unread.get(&row.id).copied().unwrap_or(0),
                participants,
            }
        })
        .collect()
}

// -- Handlers --

pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.conversations.list(claims.sub).await?))
}

pub async fn get_messages(
    State(state): State<AppState>,
    conversation_id: Result<Path<Uuid>, PathRejection>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(conversation_id) = conversation_id?;
    Ok(Json(state.conversations.messages(conversation_id, claims.sub).await?))
}

pub async fn get_or_create_one_to_one(
    State(state): State<AppState>,
    other_user_id: Result<Path<Uuid>, PathRejection>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(other_user_id) = other_user_id?;
    let summary = state
        .conversations
        .get_or_create_one_to_one(claims.sub, other_user_id)
        .await?;
    Ok(Json(summary))
}

pub async fn create_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateGroupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let summary = state.conversations.create_group(claims.sub, req).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn mark_as_read(
    State(state): State<AppState>,
    conversation_id: Result<Path<Uuid>, PathRejection>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(conversation_id) = conversation_id?;
    if !state.conversations.mark_as_read(conversation_id, claims.sub).await? {
        return Err(ApiError::NotFound("conversation"));
    }
    Ok(Json(json!({ "message": "Conversation marked as read" })))
}
