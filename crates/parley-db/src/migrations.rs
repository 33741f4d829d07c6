use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                email       TEXT,
                first_name  TEXT,
                last_name   TEXT,
                avatar_url  TEXT,
                created_at  INTEGER NOT NULL
            );

            -- direct_key is min(a,b):max(a,b) for one-to-one conversations and
            -- NULL for groups, so at most one direct conversation per pair.
            CREATE TABLE conversations (
                id          TEXT PRIMARY KEY,
                kind        TEXT NOT NULL CHECK (kind IN ('one_to_one', 'group')),
                name        TEXT,
                image_url   TEXT,
                direct_key  TEXT UNIQUE,
                created_at  INTEGER NOT NULL
            );

            CREATE TABLE participants (
                user_id         TEXT NOT NULL REFERENCES users(id),
                conversation_id TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
                last_read_at    INTEGER,
                PRIMARY KEY (user_id, conversation_id)
            );

            CREATE INDEX idx_participants_conversation
                ON participants(conversation_id);

            CREATE TABLE messages (
                id              TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
                sender_id       TEXT NOT NULL REFERENCES users(id),
                content         TEXT NOT NULL,
                created_at      INTEGER NOT NULL
            );

            CREATE INDEX idx_messages_conversation
                ON messages(conversation_id, created_at);

            CREATE TABLE notifications (
                id                  TEXT PRIMARY KEY,
                user_id             TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title               TEXT NOT NULL,
                message             TEXT,
                kind                TEXT NOT NULL,
                is_read             INTEGER NOT NULL DEFAULT 0,
                created_at          INTEGER NOT NULL,
                related_entity_id   TEXT,
                related_entity_type TEXT
            );

            CREATE INDEX idx_notifications_user
                ON notifications(user_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
