use axum::{
    Extension, Router,
    extract::{State, WebSocketUpgrade},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use parley_gateway::connection;
use parley_types::api::Claims;

use crate::conversations;
use crate::messages;
use crate::middleware::{require_auth, require_gateway_auth};
use crate::notifications;
use crate::state::AppState;
use crate::users;

/// Full HTTP surface: bearer-protected REST routes, the `/gateway`
/// WebSocket and an open `/health` check.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(health));

    let protected_routes = Router::new()
        .route("/conversations", get(conversations::list_conversations))
        .route("/conversations/group", post(conversations::create_group))
        .route(
            "/conversations/onetoone/{other_user_id}",
            post(conversations::get_or_create_one_to_one),
        )
        .route(
            "/conversations/{conversation_id}/messages",
            get(conversations::get_messages),
        )
        .route(
            "/conversations/{conversation_id}/read",
            post(conversations::mark_as_read),
        )
        .route("/messages", post(messages::send_message))
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/unread-count", get(notifications::unread_count))
        .route("/notifications/read-all", post(notifications::mark_all_as_read))
        .route(
            "/notifications/{notification_id}/read",
            post(notifications::mark_as_read),
        )
        .route(
            "/notifications/{notification_id}",
            delete(notifications::delete_notification),
        )
        .route("/users", get(users::get_users))
        .route("/users/me", put(users::put_me))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let ws_route = Router::new()
        .route("/gateway", get(ws_upgrade))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_gateway_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(ws_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn ws_upgrade(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    debug!("Gateway upgrade for {}", claims.sub);
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| connection::handle_connection(socket, hub, claims.sub))
}
