use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id        TEXT PRIMARY KEY NOT NULL,      -- UUID v4
    username  TEXT NOT NULL,                  -- author
    body      TEXT NOT NULL,
    image_url TEXT NOT NULL DEFAULT '',
    timestamp TEXT NOT NULL                   -- RFC-3339, UTC, millis
);

CREATE INDEX IF NOT EXISTS idx_messages_ts ON messages(timestamp);

CREATE TABLE IF NOT EXISTS message_reads (
    message_id TEXT NOT NULL,
    reader     TEXT NOT NULL,

    PRIMARY KEY (message_id, reader),
    FOREIGN KEY (message_id) REFERENCES messages(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS resources (
    id          TEXT PRIMARY KEY NOT NULL,    -- UUID v4
    username    TEXT NOT NULL,
    title       TEXT NOT NULL,
    url         TEXT NOT NULL,
    description TEXT,
    category    TEXT NOT NULL DEFAULT 'Other',
    created_at  TEXT NOT NULL
);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
