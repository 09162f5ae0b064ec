use std::collections::HashMap;

use monkey_shared::validate;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Message;
use crate::row::{format_timestamp, now, parse_timestamp, parse_uuid};

impl Database {
    pub fn send_message(
        &self,
        author: &str,
        body: &str,
        image_url: Option<&str>,
    ) -> Result<Message> {
        let author = validate::username("username", author)?;
        validate::required("message", body)?;

        let message = Message {
            id: Uuid::new_v4(),
            username: author.to_string(),
            body: body.to_string(),
            image_url: image_url.unwrap_or_default().to_string(),
            timestamp: now(),
            read_by: Vec::new(),
        };

        self.conn().execute(
            "INSERT INTO messages (id, username, body, image_url, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                message.id.to_string(),
                message.username,
                message.body,
                message.image_url,
                format_timestamp(&message.timestamp),
            ],
        )?;
        Ok(message)
    }

    /// The `limit` most recent messages, oldest first.
    pub fn list_recent_messages(&self, limit: usize) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, username, body, image_url, timestamp
             FROM messages
             ORDER BY timestamp DESC, rowid DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        messages.reverse();

        let ids: Vec<Uuid> = messages.iter().map(|m| m.id).collect();
        let mut readers = self.readers_for(&ids)?;
        for message in &mut messages {
            message.read_by = readers.remove(&message.id).unwrap_or_default();
        }
        Ok(messages)
    }

    pub fn get_message(&self, id: Uuid) -> Result<Message> {
        let mut message = self
            .conn()
            .query_row(
                "SELECT id, username, body, image_url, timestamp
                 FROM messages WHERE id = ?1",
                params![id.to_string()],
                row_to_message,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound("Message"),
                other => StoreError::Sqlite(other),
            })?;
        message.read_by = self.readers_for(&[id])?.remove(&id).unwrap_or_default();
        Ok(message)
    }

    /// Mark a message read by `reader` and return it with its receipts.
    /// Marking twice is a no-op.
    pub fn mark_message_read(&self, id: Uuid, reader: &str) -> Result<Message> {
        let reader = validate::username("username", reader)?;
        let mut message = self.get_message(id)?;

        let added = self.conn().execute(
            "INSERT OR IGNORE INTO message_reads (message_id, reader) VALUES (?1, ?2)",
            params![id.to_string(), reader],
        )?;
        if added > 0 {
            message.read_by.push(reader.to_string());
        }
        Ok(message)
    }

    /// Messages written by someone else that `username` has not marked read.
    ///
    /// Counts over the whole history, not just the listing window.
    pub fn unread_count(&self, username: &str) -> Result<u64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM messages m
             WHERE m.username != ?1
               AND NOT EXISTS (
                   SELECT 1 FROM message_reads r
                   WHERE r.message_id = m.id AND r.reader = ?1
               )",
            params![username],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // read receipts go with it (ON DELETE CASCADE)
    pub fn delete_message(&self, id: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM messages WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(affected > 0)
    }

    fn readers_for(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<String>>> {
        let mut stmt = self.conn().prepare(
            "SELECT reader FROM message_reads WHERE message_id = ?1 ORDER BY rowid",
        )?;

        let mut map = HashMap::new();
        for id in ids {
            let rows = stmt.query_map(params![id.to_string()], |row| row.get(0))?;
            let readers = rows.collect::<std::result::Result<Vec<String>, _>>()?;
            if !readers.is_empty() {
                map.insert(*id, readers);
            }
        }
        Ok(map)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let id_str: String = row.get(0)?;
    let ts_str: String = row.get(4)?;

    Ok(Message {
        id: parse_uuid(0, &id_str)?,
        username: row.get(1)?,
        body: row.get(2)?,
        image_url: row.get(3)?,
        timestamp: parse_timestamp(4, &ts_str)?,
        read_by: Vec::new(),
    })
}
