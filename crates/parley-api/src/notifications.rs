use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    response::IntoResponse,
};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use parley_db::models::NotificationRow;
use parley_db::{Database, now_micros};
use parley_gateway::hub::Hub;
use parley_types::api::{Claims, NotificationQuery, NotificationSummary, UnreadCountResponse};
use parley_types::events::GatewayEvent;
use parley_types::models::NotificationKind;

use crate::blocking;
use crate::convert::notification_summary;
use crate::error::ApiError;
use crate::state::AppState;

const MAX_PAGE_SIZE: u32 = 100;

/// Input for [`NotificationService::create`].
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub title: String,
    pub message: Option<String>,
    pub kind: NotificationKind,
    pub related_entity_id: Option<String>,
    pub related_entity_type: Option<String>,
}

/// Durable per-user notifications plus a live `ReceiveNotification` push.
#[derive(Clone)]
pub struct NotificationService {
    db: Arc<Database>,
    hub: Hub,
}

impl NotificationService {
    pub fn new(db: Arc<Database>, hub: Hub) -> Self {
        Self { db, hub }
    }

    /// Newest first; `page` is 1-based.
    pub async fn list(
        &self,
        caller: Uuid,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<NotificationSummary>, ApiError> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let offset = u64::from(page - 1) * u64::from(page_size);

        let uid = caller.to_string();
        let rows =
            blocking(&self.db, move |db| db.list_notifications(&uid, page_size, offset)).await?;
        Ok(rows.into_iter().map(notification_summary).collect())
    }

    /// Persist first, then push. The push is best-effort and cannot undo
    /// the stored notification.
    pub async fn create(&self, new: NewNotification) -> Result<NotificationSummary, ApiError> {
        let row = NotificationRow {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id.to_string(),
            title: new.title,
            message: new.message,
            kind: new.kind.as_str().to_string(),
            is_read: false,
            created_at: now_micros(),
            related_entity_id: new.related_entity_id,
            related_entity_type: new.related_entity_type,
        };

        let stored = row.clone();
        blocking(&self.db, move |db| db.insert_notification(&stored)).await?;

        let summary = notification_summary(row);
        let delivered = self
            .hub
            .push_to_users(&[new.user_id], &GatewayEvent::ReceiveNotification(summary.clone()))
            .await;
        if delivered == 0 {
            debug!("{} offline, notification {} stored only", new.user_id, summary.id);
        }

        Ok(summary)
    }

    /// Idempotent; a missing id or someone else's notification is a no-op.
    pub async fn mark_as_read(&self, caller: Uuid, notification_id: Uuid) -> Result<(), ApiError> {
        let id = notification_id.to_string();
        let uid = caller.to_string();
        blocking(&self.db, move |db| db.mark_notification_read(&id, &uid)).await?;
        Ok(())
    }

    /// Returns how many notifications flipped to read.
    pub async fn mark_all_as_read(&self, caller: Uuid) -> Result<usize, ApiError> {
        let uid = caller.to_string();
        blocking(&self.db, move |db| db.mark_all_notifications_read(&uid)).await
    }

    /// Idempotent; a missing id or someone else's notification is a no-op.
    pub async fn delete(&self, caller: Uuid, notification_id: Uuid) -> Result<(), ApiError> {
        let id = notification_id.to_string();
        let uid = caller.to_string();
        blocking(&self.db, move |db| db.delete_notification(&id, &uid)).await?;
        Ok(())
    }

    pub async fn unread_count(&self, caller: Uuid) -> Result<u64, ApiError> {
        let uid = caller.to_string();
        blocking(&self.db, move |db| db.unread_notification_count(&uid)).await
    }
}

// -- Handlers --

pub async fn list_notifications(
    State(state): State<AppState>,
    query: Result<Query<NotificationQuery>, QueryRejection>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let notifications = state
        .notifications
        .list(claims.sub, query.page, query.page_size)
        .await?;
    Ok(Json(notifications))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let count = state.notifications.unread_count(claims.sub).await?;
    Ok(Json(UnreadCountResponse { count }))
}

pub async fn mark_as_read(
    State(state): State<AppState>,
    notification_id: Result<Path<Uuid>, PathRejection>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(notification_id) = notification_id?;
    state.notifications.mark_as_read(claims.sub, notification_id).await?;
    Ok(Json(json!({ "message": "Marked as read" })))
}

pub async fn mark_all_as_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    state.notifications.mark_all_as_read(claims.sub).await?;
    Ok(Json(json!({ "message": "All marked as read" })))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    notification_id: Result<Path<Uuid>, PathRejection>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(notification_id) = notification_id?;
    state.notifications.delete(claims.sub, notification_id).await?;
    Ok(Json(json!({ "message": "Deleted" })))
}
