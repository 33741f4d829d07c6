use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

use parley_db::Database;
use parley_types::events::GatewayEvent;

/// Identifies one live connection. A user may hold several at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Returned by [`Hub::on_connect`]; the receiver yields every event pushed
/// to this connection until it is deregistered.
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub user_id: Uuid,
    pub conversation_count: usize,
    pub events: mpsc::UnboundedReceiver<GatewayEvent>,
}

/// Maps user identities to their live connections and delivers events.
///
/// Message delivery always targets user ids resolved by the caller from the
/// Store. Rooms (one per conversation) are kept alongside as a broadcast
/// hook but are never the delivery path for messages: a connection's room
/// set can lag behind the real participant list.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

struct HubInner {
    db: Arc<Database>,
    registry: RwLock<Registry>,
}

/// The three indexes are only ever mutated together under one lock.
#[derive(Default)]
struct Registry {
    users: HashMap<Uuid, HashSet<ConnectionId>>,
    connections: HashMap<ConnectionId, LiveConnection>,
    rooms: HashMap<Uuid, HashSet<ConnectionId>>,
}

struct LiveConnection {
    user_id: Uuid,
    tx: mpsc::UnboundedSender<GatewayEvent>,
    rooms: HashSet<Uuid>,
}

impl Registry {
    fn insert(&mut self, id: ConnectionId, user_id: Uuid, tx: mpsc::UnboundedSender<GatewayEvent>) {
        self.users.entry(user_id).or_default().insert(id);
        self.connections.insert(
            id,
            LiveConnection {
                user_id,
                tx,
                rooms: HashSet::new(),
            },
        );
    }

    fn join(&mut self, id: ConnectionId, room: Uuid) {
        if let Some(conn) = self.connections.get_mut(&id) {
            conn.rooms.insert(room);
            self.rooms.entry(room).or_default().insert(id);
        }
    }

    /// Drops the connection from every index, pruning emptied entries.
    fn remove(&mut self, id: ConnectionId) -> Option<LiveConnection> {
        let conn = self.connections.remove(&id)?;

        if let Some(ids) = self.users.get_mut(&conn.user_id) {
            ids.remove(&id);
            if ids.is_empty() {
                self.users.remove(&conn.user_id);
            }
        }

        for room in &conn.rooms {
            if let Some(members) = self.rooms.get_mut(room) {
                members.remove(&id);
                if members.is_empty() {
                    self.rooms.remove(room);
                }
            }
        }

        Some(conn)
    }
}

impl Hub {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            inner: Arc::new(HubInner {
                db,
                registry: RwLock::new(Registry::default()),
            }),
        }
    }

    /// Register a new connection for `user_id` and subscribe it to a room per
    /// conversation the user currently belongs to.
    ///
    /// The connection is registered before memberships are loaded, so a
    /// conversation created meanwhile still finds it in `join_room`.
    pub async fn on_connect(&self, user_id: Uuid) -> anyhow::Result<ConnectionHandle> {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.registry.write().await.insert(id, user_id, tx);

        let db = self.inner.db.clone();
        let uid = user_id.to_string();
        let memberships =
            match tokio::task::spawn_blocking(move || db.conversation_ids_for_user(&uid)).await {
                Ok(Ok(memberships)) => memberships,
                Ok(Err(e)) => {
                    self.inner.registry.write().await.remove(id);
                    return Err(e);
                }
                Err(e) => {
                    self.inner.registry.write().await.remove(id);
                    return Err(e.into());
                }
            };

        let rooms: Vec<Uuid> = memberships
            .iter()
            .filter_map(|raw| match raw.parse::<Uuid>() {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!("Corrupt conversation id '{}' for user {}: {}", raw, user_id, e);
                    None
                }
            })
            .collect();

        {
            let mut registry = self.inner.registry.write().await;
            for room in &rooms {
                registry.join(id, *room);
            }
        }

        debug!("Connection {} registered for {} ({} rooms)", id, user_id, rooms.len());

        Ok(ConnectionHandle {
            id,
            user_id,
            conversation_count: rooms.len(),
            events: rx,
        })
    }

    /// Deregister a connection from the registry and all rooms.
    /// Returns false if it was already gone.
    pub async fn on_disconnect(&self, id: ConnectionId) -> bool {
        let removed = self.inner.registry.write().await.remove(id);
        match removed {
            Some(conn) => {
                debug!("Connection {} for {} deregistered", id, conn.user_id);
                true
            }
            None => false,
        }
    }

    /// Deliver `event` to every live connection of every listed user.
    /// Best-effort: offline users are skipped. Returns the number of
    /// connections reached.
    pub async fn push_to_users(&self, user_ids: &[Uuid], event: &GatewayEvent) -> usize {
        let mut delivered = 0;
        let mut dead = Vec::new();

        {
            let registry = self.inner.registry.read().await;
            let targets: HashSet<&Uuid> = user_ids.iter().collect();
            for user_id in targets {
                let Some(ids) = registry.users.get(user_id) else {
                    continue;
                };
                for id in ids {
                    if let Some(conn) = registry.connections.get(id) {
                        if conn.tx.send(event.clone()).is_ok() {
                            delivered += 1;
                        } else {
                            dead.push(*id);
                        }
                    }
                }
            }
        }

        self.prune(dead).await;

        debug!(
            "Pushed {} to {} connection(s) across {} user(s)",
            event.name(),
            delivered,
            user_ids.len()
        );
        delivered
    }

    /// Deliver `event` to a single connection. Returns whether it was live.
    pub async fn push_to_connection(&self, id: ConnectionId, event: &GatewayEvent) -> bool {
        let sent = {
            let registry = self.inner.registry.read().await;
            match registry.connections.get(&id) {
                Some(conn) => conn.tx.send(event.clone()).is_ok(),
                None => return false,
            }
        };

        if !sent {
            self.prune(vec![id]).await;
        }
        sent
    }

    /// Subscribe every live connection of `user_ids` to `conversation_id`'s
    /// room, e.g. right after the conversation was created.
    pub async fn join_room(&self, user_ids: &[Uuid], conversation_id: Uuid) {
        let mut registry = self.inner.registry.write().await;
        let ids: Vec<ConnectionId> = user_ids
            .iter()
            .filter_map(|user_id| registry.users.get(user_id))
            .flatten()
            .copied()
            .collect();
        for id in ids {
            registry.join(id, conversation_id);
        }
    }

    /// Room-keyed fan-out. Only as accurate as the room subscriptions, so it
    /// must not carry anything that has to reach every participant.
    pub async fn broadcast_to_room(&self, conversation_id: Uuid, event: &GatewayEvent) -> usize {
        let mut delivered = 0;
        let mut dead = Vec::new();

        {
            let registry = self.inner.registry.read().await;
            if let Some(members) = registry.rooms.get(&conversation_id) {
                for id in members {
                    if let Some(conn) = registry.connections.get(id) {
                        if conn.tx.send(event.clone()).is_ok() {
                            delivered += 1;
                        } else {
                            dead.push(*id);
                        }
                    }
                }
            }
        }

        self.prune(dead).await;
        delivered
    }

    pub async fn connection_count(&self, user_id: Uuid) -> usize {
        self.inner
            .registry
            .read()
            .await
            .users
            .get(&user_id)
            .map_or(0, HashSet::len)
    }

    pub async fn room_size(&self, conversation_id: Uuid) -> usize {
        self.inner
            .registry
            .read()
            .await
            .rooms
            .get(&conversation_id)
            .map_or(0, HashSet::len)
    }

    async fn prune(&self, dead: Vec<ConnectionId>) {
        if dead.is_empty() {
            return;
        }
        let mut registry = self.inner.registry.write().await;
        for id in dead {
            if registry.remove(id).is_some() {
                debug!("Pruned dead connection {}", id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_db::models::UserRow;

    fn add_user(db: &Database) -> Uuid {
        let id = Uuid::new_v4();
        db.upsert_user(
            &UserRow {
                id: id.to_string(),
                email: None,
                first_name: None,
                last_name: None,
                avatar_url: None,
            },
            0,
        )
        .unwrap();
        id
    }

    fn ready(user_id: Uuid) -> GatewayEvent {
        GatewayEvent::Ready {
            user_id,
            conversation_count: 0,
        }
    }

    #[tokio::test]
    async fn pushes_reach_every_device_of_a_user() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let alice = add_user(&db);
        let hub = Hub::new(db);

        let mut phone = hub.on_connect(alice).await.unwrap();
        let mut laptop = hub.on_connect(alice).await.unwrap();
        assert_eq!(hub.connection_count(alice).await, 2);

        let delivered = hub.push_to_users(&[alice], &ready(alice)).await;
        assert_eq!(delivered, 2);
        assert_eq!(phone.events.try_recv().unwrap(), ready(alice));
        assert_eq!(laptop.events.try_recv().unwrap(), ready(alice));
    }

    #[tokio::test]
    async fn duplicate_user_ids_deliver_once() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let alice = add_user(&db);
        let hub = Hub::new(db);

        let mut conn = hub.on_connect(alice).await.unwrap();
        assert_eq!(hub.push_to_users(&[alice, alice], &ready(alice)).await, 1);
        assert!(conn.events.try_recv().is_ok());
        assert!(conn.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn disconnect_removes_connection_everywhere() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let alice = add_user(&db);
        let bob = add_user(&db);
        let convo = db
            .get_or_create_direct(&Uuid::new_v4().to_string(), &alice.to_string(), &bob.to_string(), 0)
            .unwrap()
            .id
            .parse::<Uuid>()
            .unwrap();
        let hub = Hub::new(db);

        let conn = hub.on_connect(alice).await.unwrap();
        assert_eq!(conn.conversation_count, 1);
        assert_eq!(hub.room_size(convo).await, 1);

        assert!(hub.on_disconnect(conn.id).await);
        assert!(!hub.on_disconnect(conn.id).await);
        assert_eq!(hub.connection_count(alice).await, 0);
        assert_eq!(hub.room_size(convo).await, 0);

        // Pushing to a user with no connections is not an error
        assert_eq!(hub.push_to_users(&[alice], &ready(alice)).await, 0);
        assert!(!hub.push_to_connection(conn.id, &ready(alice)).await);
    }

    #[tokio::test]
    async fn dropped_receivers_are_pruned_on_push() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let alice = add_user(&db);
        let hub = Hub::new(db);

        let gone = hub.on_connect(alice).await.unwrap();
        let mut live = hub.on_connect(alice).await.unwrap();
        drop(gone.events);

        assert_eq!(hub.push_to_users(&[alice], &ready(alice)).await, 1);
        assert_eq!(hub.connection_count(alice).await, 1);
        assert!(live.events.try_recv().is_ok());
    }

    #[tokio::test]
    async fn join_room_subscribes_live_connections() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let alice = add_user(&db);
        let bob = add_user(&db);
        let hub = Hub::new(db);

        let mut a = hub.on_connect(alice).await.unwrap();
        let mut b = hub.on_connect(bob).await.unwrap();
        let room = Uuid::new_v4();

        hub.join_room(&[alice, bob], room).await;
        assert_eq!(hub.room_size(room).await, 2);

        assert_eq!(hub.broadcast_to_room(room, &ready(alice)).await, 2);
        assert!(a.events.try_recv().is_ok());
        assert!(b.events.try_recv().is_ok());
    }

    #[tokio::test]
    async fn room_joined_while_memberships_load_is_kept() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let alice = add_user(&db);
        let hub = Hub::new(db.clone());

        // Hold the Store so on_connect stalls on its membership query
        let (held_tx, held_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let holder = db.clone();
        let blocker = std::thread::spawn(move || {
            holder
                .with_conn(|_| {
                    held_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    Ok(())
                })
                .unwrap();
        });
        held_rx.recv().unwrap();

        let connecting = tokio::spawn({
            let hub = hub.clone();
            async move { hub.on_connect(alice).await.unwrap() }
        });
        while hub.connection_count(alice).await == 0 {
            tokio::task::yield_now().await;
        }

        let room = Uuid::new_v4();
        hub.join_room(&[alice], room).await;

        release_tx.send(()).unwrap();
        blocker.join().unwrap();
        let conn = connecting.await.unwrap();

        assert_eq!(conn.conversation_count, 0);
        assert_eq!(hub.room_size(room).await, 1);
    }

    #[tokio::test]
    async fn push_to_connection_targets_one_handle() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let alice = add_user(&db);
        let hub = Hub::new(db);

        let mut first = hub.on_connect(alice).await.unwrap();
        let mut second = hub.on_connect(alice).await.unwrap();

        assert!(hub.push_to_connection(first.id, &ready(alice)).await);
        assert!(first.events.try_recv().is_ok());
        assert!(second.events.try_recv().is_err());
    }
}
