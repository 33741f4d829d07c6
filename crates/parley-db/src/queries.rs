use std::collections::HashMap;

use crate::Database;
use crate::models::{
    ConversationListing, ConversationRow, DirectConversation, MessageRow, NotificationRow,
    ParticipantRow, UserRow,
};
use anyhow::Result;
use parley_types::models::ConversationKind;
use rusqlite::{Connection, Row, TransactionBehavior, params};

/// Normalized key for a user pair: order-independent.
pub fn direct_key(user_a: &str, user_b: &str) -> String {
    if user_a <= user_b {
        format!("{}:{}", user_a, user_b)
    } else {
        format!("{}:{}", user_b, user_a)
    }
}

impl Database {
    // -- Users --

    pub fn upsert_user(&self, user: &UserRow, created_at: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, first_name, last_name, avatar_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    email = excluded.email,
                    first_name = excluded.first_name,
                    last_name = excluded.last_name,
                    avatar_url = excluded.avatar_url",
                params![
                    user.id,
                    user.email,
                    user.first_name,
                    user.last_name,
                    user.avatar_url,
                    created_at
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, email, first_name, last_name, avatar_url FROM users WHERE id = ?1",
                [id],
                map_user,
            )
            .optional()
        })
    }

    pub fn list_users_except(&self, id: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, email, first_name, last_name, avatar_url FROM users
                 WHERE id != ?1
                 ORDER BY first_name, last_name, id",
            )?;
            let rows = stmt
                .query_map([id], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Conversations --

    pub fn conversation_exists(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM conversations WHERE id = ?1)",
                [id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    pub fn is_participant(&self, conversation_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM participants WHERE conversation_id = ?1 AND user_id = ?2
                 )",
                [conversation_id, user_id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    /// The authoritative participant list, read fresh on every call.
    pub fn participant_ids(&self, conversation_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id FROM participants WHERE conversation_id = ?1 ORDER BY rowid",
            )?;
            let ids = stmt
                .query_map([conversation_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(ids)
        })
    }

    pub fn conversation_ids_for_user(&self, user_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT conversation_id FROM participants WHERE user_id = ?1")?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(ids)
        })
    }

    /// Find the one-to-one conversation for `{user_a, user_b}` or create it
    /// with `candidate_id`.
    ///
    /// The insert is guarded by the UNIQUE `direct_key` column: when two
    /// callers race, the loser's insert is a no-op and both read back the
    /// same winning row.
    pub fn get_or_create_direct(
        &self,
        candidate_id: &str,
        user_a: &str,
        user_b: &str,
        created_at: i64,
    ) -> Result<DirectConversation> {
        let key = direct_key(user_a, user_b);

        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let inserted = tx.execute(
                "INSERT INTO conversations (id, kind, direct_key, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(direct_key) DO NOTHING",
                params![candidate_id, ConversationKind::OneToOne.as_str(), key, created_at],
            )?;

            if inserted == 1 {
                tx.execute(
                    "INSERT INTO participants (user_id, conversation_id) VALUES (?1, ?2), (?3, ?2)",
                    params![user_a, candidate_id, user_b],
                )?;
            }

            let id: String = tx.query_row(
                "SELECT id FROM conversations WHERE direct_key = ?1",
                [&key],
                |row| row.get(0),
            )?;

            tx.commit()?;

            Ok(DirectConversation {
                id,
                created: inserted == 1,
            })
        })
    }

    pub fn create_group(
        &self,
        id: &str,
        name: &str,
        image_url: Option<&str>,
        member_ids: &[String],
        created_at: i64,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO conversations (id, kind, name, image_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, ConversationKind::Group.as_str(), name, image_url, created_at],
            )?;

            {
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO participants (user_id, conversation_id) VALUES (?1, ?2)",
                )?;
                for member in member_ids {
                    stmt.execute([member.as_str(), id])?;
                }
            }

            tx.commit()?;
            Ok(())
        })
    }

    /// Every conversation `user_id` participates in, with participants, last
    /// message and unread count.
    pub fn list_conversations_for_user(&self, user_id: &str) -> Result<ConversationListing> {
        self.with_conn(|conn| query_listing(conn, user_id, None))
    }

    /// Same as `list_conversations_for_user`, narrowed to one conversation.
    pub fn conversation_for_user(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<ConversationListing> {
        self.with_conn(|conn| query_listing(conn, user_id, Some(conversation_id)))
    }

    /// Returns false when `user_id` is not a participant.
    pub fn set_last_read(&self, conversation_id: &str, user_id: &str, at: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE participants SET last_read_at = ?3
                 WHERE conversation_id = ?1 AND user_id = ?2",
                params![conversation_id, user_id, at],
            )?;
            Ok(updated == 1)
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        id: &str,
        conversation_id: &str,
        sender_id: &str,
        content: &str,
        created_at: i64,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (id, conversation_id, sender_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, conversation_id, sender_id, content, created_at],
            )?;
            Ok(())
        })
    }

    /// All messages of a conversation, oldest first.
    pub fn get_messages(&self, conversation_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            // JOIN users to fetch sender display fields in a single query
            let mut stmt = conn.prepare(
                "SELECT m.id, m.conversation_id, m.sender_id, m.content, m.created_at,
                        u.first_name, u.last_name, u.avatar_url
                 FROM messages m
                 LEFT JOIN users u ON u.id = m.sender_id
                 WHERE m.conversation_id = ?1
                 ORDER BY m.created_at ASC, m.rowid ASC",
            )?;
            let rows = stmt
                .query_map([conversation_id], map_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Notifications --

    pub fn insert_notification(&self, row: &NotificationRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO notifications
                    (id, user_id, title, message, kind, is_read, created_at,
                     related_entity_id, related_entity_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    row.id,
                    row.user_id,
                    row.title,
                    row.message,
                    row.kind,
                    row.is_read,
                    row.created_at,
                    row.related_entity_id,
                    row.related_entity_type
                ],
            )?;
            Ok(())
        })
    }

    /// Newest first.
    pub fn list_notifications(
        &self,
        user_id: &str,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, title, message, kind, is_read, created_at,
                        related_entity_id, related_entity_type
                 FROM notifications
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2 OFFSET ?3",
            )?;
            let offset = i64::try_from(offset).unwrap_or(i64::MAX);
            let rows = stmt
                .query_map(params![user_id, limit, offset], map_notification)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Scoped to the owner. Returns whether a row changed.
    pub fn mark_notification_read(&self, id: &str, user_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE notifications SET is_read = 1
                 WHERE id = ?1 AND user_id = ?2 AND is_read = 0",
                [id, user_id],
            )?;
            Ok(updated == 1)
        })
    }

    pub fn mark_all_notifications_read(&self, user_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
                [user_id],
            )?;
            Ok(updated)
        })
    }

    /// Scoped to the owner. Returns whether a row was deleted.
    pub fn delete_notification(&self, id: &str, user_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute(
                "DELETE FROM notifications WHERE id = ?1 AND user_id = ?2",
                [id, user_id],
            )?;
            Ok(deleted == 1)
        })
    }

    pub fn unread_notification_count(&self, user_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
    }
}

fn query_listing(
    conn: &Connection,
    user_id: &str,
    only: Option<&str>,
) -> Result<ConversationListing> {
    let mut listing = ConversationListing::default();

    let mut stmt = conn.prepare(
        "SELECT c.id, c.kind, c.name, c.image_url, c.created_at, p.last_read_at
         FROM conversations c
         JOIN participants p ON p.conversation_id = c.id
         WHERE p.user_id = ?1 AND (?2 IS NULL OR c.id = ?2)",
    )?;
    listing.conversations = stmt
        .query_map(params![user_id, only], |row| {
            Ok(ConversationRow {
                id: row.get(0)?,
                kind: row.get(1)?,
                name: row.get(2)?,
                image_url: row.get(3)?,
                created_at: row.get(4)?,
                last_read_at: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT p.conversation_id, p.last_read_at,
                p.user_id, u.email, u.first_name, u.last_name, u.avatar_url
         FROM participants p
         LEFT JOIN users u ON u.id = p.user_id
         WHERE p.conversation_id IN (
             SELECT conversation_id FROM participants
             WHERE user_id = ?1 AND (?2 IS NULL OR conversation_id = ?2)
         )
         ORDER BY p.conversation_id, p.rowid",
    )?;
    listing.participants = stmt
        .query_map(params![user_id, only], |row| {
            Ok(ParticipantRow {
                conversation_id: row.get(0)?,
                last_read_at: row.get(1)?,
                user: UserRow {
                    id: row.get(2)?,
                    email: row.get(3)?,
                    first_name: row.get(4)?,
                    last_name: row.get(5)?,
                    avatar_url: row.get(6)?,
                },
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT m.id, m.conversation_id, m.sender_id, m.content, m.created_at,
                u.first_name, u.last_name, u.avatar_url
         FROM participants p
         JOIN messages m ON m.rowid = (
             SELECT m2.rowid FROM messages m2
             WHERE m2.conversation_id = p.conversation_id
             ORDER BY m2.created_at DESC, m2.rowid DESC
             LIMIT 1
         )
         LEFT JOIN users u ON u.id = m.sender_id
         WHERE p.user_id = ?1 AND (?2 IS NULL OR p.conversation_id = ?2)",
    )?;
    listing.last_messages = stmt
        .query_map(params![user_id, only], map_message)?
        .map(|row| row.map(|m| (m.conversation_id.clone(), m)))
        .collect::<std::result::Result<HashMap<_, _>, _>>()?;

    // A missing read marker means nothing has been read yet.
    let mut stmt = conn.prepare(
        "SELECT m.conversation_id, COUNT(*)
         FROM participants p
         JOIN messages m ON m.conversation_id = p.conversation_id
         WHERE p.user_id = ?1 AND (?2 IS NULL OR p.conversation_id = ?2)
           AND (p.last_read_at IS NULL OR m.created_at > p.last_read_at)
         GROUP BY m.conversation_id",
    )?;
    listing.unread = stmt
        .query_map(params![user_id, only], |row| {
            let count: i64 = row.get(1)?;
            Ok((row.get::<_, String>(0)?, u64::try_from(count).unwrap_or_default()))
        })?
        .collect::<std::result::Result<HashMap<_, _>, _>>()?;

    Ok(listing)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        avatar_url: row.get(4)?,
    })
}

fn map_message(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sender_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        sender_first_name: row.get(5)?,
        sender_last_name: row.get(6)?,
        sender_avatar_url: row.get(7)?,
    })
}

fn map_notification(row: &Row<'_>) -> rusqlite::Result<NotificationRow> {
    Ok(NotificationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        message: row.get(3)?,
        kind: row.get(4)?,
        is_read: row.get(5)?,
        created_at: row.get(6)?,
        related_entity_id: row.get(7)?,
        related_entity_type: row.get(8)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn user(db: &Database, first: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        db.upsert_user(
            &UserRow {
                id: id.clone(),
                email: Some(format!("{}@example.com", first.to_lowercase())),
                first_name: Some(first.to_string()),
                last_name: None,
                avatar_url: None,
            },
            0,
        )
        .unwrap();
        id
    }

    fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    #[test]
    fn direct_key_is_order_independent() {
        assert_eq!(direct_key("b", "a"), direct_key("a", "b"));
        assert_eq!(direct_key("a", "b"), "a:b");
    }

    #[test]
    fn stored_kinds_parse_back() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "Alice");
        let bob = user(&db, "Bob");
        let direct = db.get_or_create_direct(&new_id(), &alice, &bob, 1).unwrap();
        let group = new_id();
        db.create_group(&group, "crew", None, &[alice.clone(), bob], 2).unwrap();

        let listing = db.list_conversations_for_user(&alice).unwrap();
        let kind_of = |id: &str| {
            let row = listing.conversations.iter().find(|c| c.id == id).unwrap();
            ConversationKind::parse(&row.kind)
        };
        assert_eq!(kind_of(&direct.id), Some(ConversationKind::OneToOne));
        assert_eq!(kind_of(&group), Some(ConversationKind::Group));
    }

    #[test]
    fn get_or_create_direct_reuses_existing_pair() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "Alice");
        let bob = user(&db, "Bob");

        let first = db.get_or_create_direct(&new_id(), &alice, &bob, 10).unwrap();
        assert!(first.created);

        // Reversed pair resolves to the same row
        let second = db.get_or_create_direct(&new_id(), &bob, &alice, 20).unwrap();
        assert!(!second.created);
        assert_eq!(first.id, second.id);
        assert_eq!(db.participant_ids(&first.id).unwrap().len(), 2);
    }

    #[test]
    fn concurrent_direct_creation_yields_one_conversation() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let alice = user(&db, "Alice");
        let bob = user(&db, "Bob");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let db = db.clone();
                let (a, b) = if i % 2 == 0 {
                    (alice.clone(), bob.clone())
                } else {
                    (bob.clone(), alice.clone())
                };
                thread::spawn(move || db.get_or_create_direct(&new_id(), &a, &b, i).unwrap())
            })
            .collect();

        let results: Vec<DirectConversation> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.created).count(), 1);
        assert!(results.iter().all(|r| r.id == results[0].id));

        let direct_count: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM conversations WHERE kind = 'one_to_one'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(direct_count, 1);
    }

    #[test]
    fn groups_are_never_deduplicated() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "Alice");
        let bob = user(&db, "Bob");
        let members = vec![alice.clone(), bob.clone()];

        let g1 = new_id();
        let g2 = new_id();
        db.create_group(&g1, "team", None, &members, 1).unwrap();
        db.create_group(&g2, "team", None, &members, 2).unwrap();

        let listing = db.list_conversations_for_user(&alice).unwrap();
        assert_eq!(listing.conversations.len(), 2);
    }

    #[test]
    fn unread_counts_respect_read_marker() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "Alice");
        let bob = user(&db, "Bob");
        let convo = db.get_or_create_direct(&new_id(), &alice, &bob, 0).unwrap().id;

        for ts in [100, 200, 300] {
            db.insert_message(&new_id(), &convo, &bob, "hi", ts).unwrap();
        }

        // Never read: everything is unread
        let listing = db.list_conversations_for_user(&alice).unwrap();
        assert_eq!(listing.unread.get(&convo), Some(&3));

        // Strictly greater: the message at exactly the marker counts as read
        assert!(db.set_last_read(&convo, &alice, 200).unwrap());
        let listing = db.list_conversations_for_user(&alice).unwrap();
        assert_eq!(listing.unread.get(&convo), Some(&1));
        assert_eq!(listing.last_messages[&convo].created_at, 300);

        // Bob never marked anything read
        let listing = db.list_conversations_for_user(&bob).unwrap();
        assert_eq!(listing.unread.get(&convo), Some(&3));
    }

    #[test]
    fn set_last_read_requires_membership() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "Alice");
        let bob = user(&db, "Bob");
        let carol = user(&db, "Carol");
        let convo = db.get_or_create_direct(&new_id(), &alice, &bob, 0).unwrap().id;

        assert!(!db.set_last_read(&convo, &carol, 5).unwrap());
        assert!(!db.is_participant(&convo, &carol).unwrap());
    }

    #[test]
    fn messages_come_back_oldest_first_with_sender_fields() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "Alice");
        let bob = user(&db, "Bob");
        let convo = db.get_or_create_direct(&new_id(), &alice, &bob, 0).unwrap().id;

        db.insert_message(&new_id(), &convo, &alice, "second", 20).unwrap();
        db.insert_message(&new_id(), &convo, &bob, "first", 10).unwrap();

        let messages = db.get_messages(&convo).unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["first", "second"]);
        assert_eq!(messages[0].sender_first_name.as_deref(), Some("Bob"));
        assert_eq!(messages[0].sender_last_name, None);
    }

    #[test]
    fn mark_all_read_only_touches_owner() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "Alice");
        let bob = user(&db, "Bob");

        for (owner, n) in [(&alice, 3), (&bob, 2)] {
            for i in 0..n {
                db.insert_notification(&NotificationRow {
                    id: new_id(),
                    user_id: owner.clone(),
                    title: "t".into(),
                    message: None,
                    kind: "info".into(),
                    is_read: false,
                    created_at: i,
                    related_entity_id: None,
                    related_entity_type: None,
                })
                .unwrap();
            }
        }

        assert_eq!(db.mark_all_notifications_read(&alice).unwrap(), 3);
        assert_eq!(db.unread_notification_count(&alice).unwrap(), 0);
        assert_eq!(db.unread_notification_count(&bob).unwrap(), 2);

        // Second pass is a no-op
        assert_eq!(db.mark_all_notifications_read(&alice).unwrap(), 0);
    }

    #[test]
    fn notifications_paginate_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "Alice");

        for i in 0..7 {
            db.insert_notification(&NotificationRow {
                id: new_id(),
                user_id: alice.clone(),
                title: format!("n{}", i),
                message: None,
                kind: "info".into(),
                is_read: false,
                created_at: i,
                related_entity_id: None,
                related_entity_type: None,
            })
            .unwrap();
        }

        let page1 = db.list_notifications(&alice, 5, 0).unwrap();
        let page2 = db.list_notifications(&alice, 5, 5).unwrap();
        assert_eq!(page1.len(), 5);
        assert_eq!(page1[0].title, "n6");
        assert_eq!(page2.len(), 2);
        assert_eq!(page2[1].title, "n0");
    }

    #[test]
    fn deleting_a_conversation_cascades() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "Alice");
        let bob = user(&db, "Bob");
        let convo = db.get_or_create_direct(&new_id(), &alice, &bob, 0).unwrap().id;
        db.insert_message(&new_id(), &convo, &alice, "hi", 1).unwrap();

        db.with_conn(|conn| {
            conn.execute("DELETE FROM conversations WHERE id = ?1", [&convo])?;
            Ok(())
        })
        .unwrap();

        assert!(db.participant_ids(&convo).unwrap().is_empty());
        assert!(db.get_messages(&convo).unwrap().is_empty());
    }
}
