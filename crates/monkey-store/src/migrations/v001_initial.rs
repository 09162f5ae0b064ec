//! v001 -- Initial schema creation.
//!
//! Creates the scoring tables: `users`, `tasks`, `task_delete_votes`,
//! `completions` and `friends`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    username    TEXT PRIMARY KEY NOT NULL,    -- case-sensitive, globally unique
    password    TEXT NOT NULL,
    profile_pic TEXT NOT NULL DEFAULT '',     -- emoji glyph or data URI
    created_at  TEXT NOT NULL                 -- RFC-3339, UTC, millis
);

-- ----------------------------------------------------------------
-- Tasks (shared by every user)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS tasks (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    name       TEXT NOT NULL,
    points     INTEGER NOT NULL CHECK (points > 0),
    recurrence TEXT NOT NULL DEFAULT 'daily',
    created_by TEXT NOT NULL,                 -- informational only
    created_at TEXT NOT NULL
);

-- One row per (task, voter): duplicate votes collapse on the primary key.
CREATE TABLE IF NOT EXISTS task_delete_votes (
    task_id  TEXT NOT NULL,
    voter    TEXT NOT NULL,
    voted_at TEXT NOT NULL,

    PRIMARY KEY (task_id, voter),
    FOREIGN KEY (task_id) REFERENCES tasks(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Completions
-- ----------------------------------------------------------------
-- task_id is deliberately not a foreign key: a completion may outlive or
-- predate its task and is then ignored when scoring.
CREATE TABLE IF NOT EXISTS completions (
    id           TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    username     TEXT NOT NULL,
    task_id      TEXT NOT NULL,
    date         TEXT NOT NULL,               -- YYYY-MM-DD
    completed_at TEXT NOT NULL                -- RFC-3339, UTC, millis
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_completions_key
    ON completions(username, task_id, date);
CREATE INDEX IF NOT EXISTS idx_completions_user_ts
    ON completions(username, completed_at);
CREATE INDEX IF NOT EXISTS idx_completions_task
    ON completions(task_id);

-- ----------------------------------------------------------------
-- Friends (directed edges)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS friends (
    username        TEXT NOT NULL,
    friend_username TEXT NOT NULL,
    created_at      TEXT NOT NULL,

    PRIMARY KEY (username, friend_username)
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
