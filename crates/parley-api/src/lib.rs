pub mod conversations;
pub mod convert;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod notifications;
pub mod router;
pub mod state;
pub mod users;

use std::sync::Arc;

use tracing::error;

use parley_db::Database;

use crate::error::ApiError;

/// Run a Store call on the blocking pool.
pub(crate) async fn blocking<F, T>(db: &Arc<Database>, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || f(&db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
        .map_err(ApiError::from)
}
