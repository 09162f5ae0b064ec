//! The completion ledger.
//!
//! A (user, task, date) triple is either absent or present; toggling flips
//! it.  The unique index on the triple backs that invariant and the flip runs
//! in a single transaction.

use chrono::{DateTime, Utc};
use monkey_shared::validate;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Completion, ToggleAction, ToggleOutcome};
use crate::row::{format_timestamp, now, parse_timestamp, parse_uuid};

const SELECT_COLUMNS: &str = "SELECT id, username, task_id, date, completed_at FROM completions";

impl Database {
    /// Flip the completion of `task_id` by `username` on `date`.
    ///
    /// The task is not looked up: completing a task that does not exist
    /// records an orphan that scores nothing.
    pub fn toggle_completion(
        &self,
        username: &str,
        task_id: Uuid,
        date: &str,
    ) -> Result<ToggleOutcome> {
        let username = validate::username("username", username)?;
        validate::calendar_date(date)?;

        let tx = self.conn().unchecked_transaction()?;

        let removed = tx.execute(
            "DELETE FROM completions WHERE username = ?1 AND task_id = ?2 AND date = ?3",
            params![username, task_id.to_string(), date],
        )?;

        let outcome = if removed > 0 {
            ToggleOutcome {
                action: ToggleAction::Removed,
                completion: None,
            }
        } else {
            let completion = Completion {
                id: Uuid::new_v4(),
                username: username.to_string(),
                task_id,
                date: date.to_string(),
                completed_at: now(),
            };
            insert(&tx, &completion)?;
            ToggleOutcome {
                action: ToggleAction::Added,
                completion: Some(completion),
            }
        };

        tx.commit()?;

        tracing::debug!(
            username,
            task_id = %task_id,
            date,
            action = ?outcome.action,
            "completion toggled"
        );
        Ok(outcome)
    }

    /// Insert a completion with an explicit timestamp.
    #[cfg(test)]
    pub(crate) fn insert_completion(&self, completion: &Completion) -> Result<()> {
        use crate::row::is_constraint_violation;

        validate::calendar_date(&completion.date)?;
        insert(self.conn(), completion).map_err(|e| {
            if is_constraint_violation(&e) {
                StoreError::Conflict("Completion already recorded for this day".into())
            } else {
                StoreError::Sqlite(e)
            }
        })?;
        Ok(())
    }

    /// Every completion recorded by `username`, oldest first.
    pub fn list_completions(&self, username: &str) -> Result<Vec<Completion>> {
        let mut stmt = self.conn().prepare(&format!(
            "{SELECT_COLUMNS} WHERE username = ?1 ORDER BY completed_at ASC, rowid ASC"
        ))?;
        let rows = stmt.query_map(params![username], row_to_completion)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Completions by `username` whose `completed_at` is at or after `since`.
    pub fn completions_since(
        &self,
        username: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Completion>> {
        let mut stmt = self.conn().prepare(&format!(
            "{SELECT_COLUMNS} WHERE username = ?1 AND completed_at >= ?2
             ORDER BY completed_at ASC, rowid ASC"
        ))?;
        let rows = stmt.query_map(
            params![username, format_timestamp(&since)],
            row_to_completion,
        )?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }
}

fn insert(conn: &rusqlite::Connection, completion: &Completion) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO completions (id, username, task_id, date, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            completion.id.to_string(),
            completion.username,
            completion.task_id.to_string(),
            completion.date,
            format_timestamp(&completion.completed_at),
        ],
    )
}

fn row_to_completion(row: &rusqlite::Row<'_>) -> rusqlite::Result<Completion> {
    let id_str: String = row.get(0)?;
    let task_id_str: String = row.get(2)?;
    let completed_str: String = row.get(4)?;

    Ok(Completion {
        id: parse_uuid(0, &id_str)?,
        username: row.get(1)?,
        task_id: parse_uuid(2, &task_id_str)?,
        date: row.get(3)?,
        completed_at: parse_timestamp(4, &completed_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use monkey_shared::ValidationError;

    fn test_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("completions.db")).unwrap();
        (db, dir)
    }

    #[test]
    fn test_toggle_alternates() {
        let (db, _dir) = test_db();
        let task = Uuid::new_v4();

        let first = db.toggle_completion("alice", task, "2024-03-04").unwrap();
        assert_eq!(first.action, ToggleAction::Added);
        let added = first.completion.expect("added carries the record");
        assert_eq!(db.list_completions("alice").unwrap(), vec![added]);

        let second = db.toggle_completion("alice", task, "2024-03-04").unwrap();
        assert_eq!(second.action, ToggleAction::Removed);
        assert!(second.completion.is_none());
        assert!(db.list_completions("alice").unwrap().is_empty());

        let third = db.toggle_completion("alice", task, "2024-03-04").unwrap();
        assert_eq!(third.action, ToggleAction::Added);
        assert_eq!(db.list_completions("alice").unwrap().len(), 1);
    }

    #[test]
    fn test_triples_are_independent() {
        let (db, _dir) = test_db();
        let task = Uuid::new_v4();

        db.toggle_completion("alice", task, "2024-03-04").unwrap();
        db.toggle_completion("alice", task, "2024-03-05").unwrap();
        db.toggle_completion("bob", task, "2024-03-04").unwrap();

        assert_eq!(db.list_completions("alice").unwrap().len(), 2);
        assert_eq!(db.list_completions("bob").unwrap().len(), 1);

        db.toggle_completion("bob", task, "2024-03-04").unwrap();
        assert_eq!(db.list_completions("alice").unwrap().len(), 2);
        assert!(db.list_completions("bob").unwrap().is_empty());
    }

    #[test]
    fn test_toggle_accepts_unknown_task() {
        let (db, _dir) = test_db();
        let outcome = db
            .toggle_completion("alice", Uuid::new_v4(), "2024-03-04")
            .unwrap();
        assert_eq!(outcome.action, ToggleAction::Added);
    }

    #[test]
    fn test_toggle_rejects_malformed_date() {
        let (db, _dir) = test_db();
        assert!(matches!(
            db.toggle_completion("alice", Uuid::new_v4(), "03/04/2024"),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            db.toggle_completion("", Uuid::new_v4(), "2024-03-04"),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_toggle_refuses_padded_username() {
        let (db, _dir) = test_db();
        let task = Uuid::new_v4();

        assert!(matches!(
            db.toggle_completion("alice ", task, "2024-03-04"),
            Err(StoreError::Validation(ValidationError::SurroundingWhitespace(
                "username"
            )))
        ));
        assert!(db.list_completions("alice").unwrap().is_empty());
        assert!(db.list_completions("alice ").unwrap().is_empty());
    }

    #[test]
    fn test_insert_duplicate_triple_conflicts() {
        let (db, _dir) = test_db();
        let task = Uuid::new_v4();
        db.toggle_completion("alice", task, "2024-03-04").unwrap();

        let dup = Completion {
            id: Uuid::new_v4(),
            username: "alice".into(),
            task_id: task,
            date: "2024-03-04".into(),
            completed_at: Utc::now(),
        };
        assert!(matches!(
            db.insert_completion(&dup),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn test_completions_since_is_inclusive() {
        let (db, _dir) = test_db();
        let task = Uuid::new_v4();
        let cutoff = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();

        for (date, at) in [
            ("2024-03-03", cutoff - Duration::milliseconds(1)),
            ("2024-03-04", cutoff),
            ("2024-03-05", cutoff + Duration::days(1)),
        ] {
            db.insert_completion(&Completion {
                id: Uuid::new_v4(),
                username: "alice".into(),
                task_id: task,
                date: date.into(),
                completed_at: at,
            })
            .unwrap();
        }

        let recent = db.completions_since("alice", cutoff).unwrap();
        let dates: Vec<_> = recent.iter().map(|c| c.date.as_str()).collect();
        assert_eq!(dates, ["2024-03-04", "2024-03-05"]);
    }
}
