use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use parley_db::models::UserRow;
use parley_db::{Database, now_micros};
use parley_types::api::{Claims, UpdateProfileRequest, UserSummary};
use parley_types::models::UserProfile;

use crate::blocking;
use crate::convert::{user_profile, user_summary};
use crate::error::ApiError;
use crate::state::AppState;

/// Look up a profile; `None` when the identity collaborator never wrote it.
pub async fn resolve_user(db: &Arc<Database>, id: Uuid) -> Result<Option<UserProfile>, ApiError> {
    let uid = id.to_string();
    let row = blocking(db, move |db| db.get_user(&uid)).await?;
    Ok(row.map(user_profile))
}

/// Insert or refresh a profile. Existing rows keep their creation time.
pub async fn upsert_user(db: &Arc<Database>, profile: UserProfile) -> Result<(), ApiError> {
    let row = UserRow {
        id: profile.id.to_string(),
        email: profile.email,
        first_name: profile.first_name,
        last_name: profile.last_name,
        avatar_url: profile.avatar_url,
    };
    blocking(db, move |db| db.upsert_user(&row, now_micros())).await
}

pub async fn list_users(db: &Arc<Database>, except: Uuid) -> Result<Vec<UserSummary>, ApiError> {
    let uid = except.to_string();
    let rows = blocking(db, move |db| db.list_users_except(&uid)).await?;
    Ok(rows.into_iter().map(user_summary).collect())
}

/// Blank strings count as absent so the display defaults still apply.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Store the caller's own profile under the id from their token.
pub async fn sync_profile(
    db: &Arc<Database>,
    caller: Uuid,
    req: UpdateProfileRequest,
) -> Result<UserSummary, ApiError> {
    let profile = UserProfile {
        id: caller,
        email: present(req.email),
        first_name: present(req.first_name),
        last_name: present(req.last_name),
        avatar_url: present(req.avatar_url),
    };
    let row = UserRow {
        id: caller.to_string(),
        email: profile.email.clone(),
        first_name: profile.first_name.clone(),
        last_name: profile.last_name.clone(),
        avatar_url: profile.avatar_url.clone(),
    };
    upsert_user(db, profile).await?;
    info!("Profile synced for {}", caller);
    Ok(user_summary(row))
}

// -- Handlers --

pub async fn put_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    Ok(Json(sync_profile(&state.db, claims.sub, req).await?))
}

pub async fn get_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(list_users(&state.db, claims.sub).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::models::{UNKNOWN_EMAIL, UNKNOWN_FIRST_NAME};

    fn profile(first: Option<&str>) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            email: None,
            first_name: first.map(str::to_string),
            last_name: Some("Hopper".to_string()),
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn upsert_then_resolve() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let mut grace = profile(Some("Grace"));
        upsert_user(&db, grace.clone()).await.unwrap();
        assert_eq!(resolve_user(&db, grace.id).await.unwrap(), Some(grace.clone()));

        grace.avatar_url = Some("https://img.example.com/g.png".to_string());
        upsert_user(&db, grace.clone()).await.unwrap();
        assert_eq!(resolve_user(&db, grace.id).await.unwrap(), Some(grace));

        assert_eq!(resolve_user(&db, Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn profile_sync_creates_then_refreshes() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let me = Uuid::new_v4();

        let summary = sync_profile(
            &db,
            me,
            UpdateProfileRequest {
                first_name: Some("Ada".to_string()),
                last_name: Some("  ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(summary.id, me);
        assert_eq!(summary.first_name, "Ada");
        assert_eq!(summary.email, UNKNOWN_EMAIL);

        let stored = resolve_user(&db, me).await.unwrap().unwrap();
        assert_eq!(stored.last_name, None);

        sync_profile(
            &db,
            me,
            UpdateProfileRequest {
                email: Some("ada@example.com".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let stored = resolve_user(&db, me).await.unwrap().unwrap();
        assert_eq!(stored.email.as_deref(), Some("ada@example.com"));
        assert_eq!(stored.first_name, None);
    }

    #[tokio::test]
    async fn listing_skips_caller_and_fills_defaults() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let me = profile(Some("Grace"));
        let other = profile(None);
        upsert_user(&db, me.clone()).await.unwrap();
        upsert_user(&db, other.clone()).await.unwrap();

        let listed = list_users(&db, me.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, other.id);
        assert_eq!(listed[0].first_name, UNKNOWN_FIRST_NAME);
        assert_eq!(listed[0].email, UNKNOWN_EMAIL);
    }
}
