//! The shared task catalog and delete voting.

use std::collections::HashMap;

use monkey_shared::{validate, Recurrence};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{NewTask, Task, VoteOutcome};
use crate::row::{format_timestamp, now, parse_timestamp, parse_uuid};

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Validate and insert a new task.  Any user may create one.
    pub fn create_task(&self, new: &NewTask) -> Result<Task> {
        let name = validate::required("name", &new.name)?;
        let created_by = validate::username("createdBy", &new.created_by)?;
        let points = validate::task_points(new.points)?;
        let recurrence = match new.recurrence.as_deref() {
            None | Some("") => Recurrence::default(),
            Some(tag) => tag.parse()?,
        };

        let task = Task {
            id: Uuid::new_v4(),
            name: name.to_string(),
            points,
            recurrence,
            created_by: created_by.to_string(),
            created_at: now(),
            delete_votes: Vec::new(),
        };

        self.conn().execute(
            "INSERT INTO tasks (id, name, points, recurrence, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                task.id.to_string(),
                task.name,
                task.points,
                task.recurrence.as_str(),
                task.created_by,
                format_timestamp(&task.created_at),
            ],
        )?;

        tracing::info!(task_id = %task.id, name = %task.name, points = task.points, "task created");
        Ok(task)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Every task in the catalog, oldest first, with its delete votes.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let mut votes = self.all_delete_votes()?;

        let mut stmt = self.conn().prepare(
            "SELECT id, name, points, recurrence, created_by, created_at
             FROM tasks
             ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map([], row_to_task)?;

        let mut tasks = Vec::new();
        for row in rows {
            let mut task = row?;
            task.delete_votes = votes.remove(&task.id).unwrap_or_default();
            tasks.push(task);
        }
        Ok(tasks)
    }

    /// Fetch a single task by id.
    pub fn get_task(&self, id: Uuid) -> Result<Task> {
        let mut task = self
            .conn()
            .query_row(
                "SELECT id, name, points, recurrence, created_by, created_at
                 FROM tasks WHERE id = ?1",
                params![id.to_string()],
                row_to_task,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound("Task"),
                other => StoreError::Sqlite(other),
            })?;
        task.delete_votes = self.delete_votes_for(id)?;
        Ok(task)
    }

    /// Point value of every task currently in the catalog.
    pub fn task_points(&self) -> Result<HashMap<Uuid, u32>> {
        let mut stmt = self.conn().prepare("SELECT id, points FROM tasks")?;
        let rows = stmt.query_map([], |row| {
            let id_str: String = row.get(0)?;
            Ok((parse_uuid(0, &id_str)?, row.get::<_, u32>(1)?))
        })?;
        rows.collect::<std::result::Result<HashMap<_, _>, _>>()
            .map_err(StoreError::Sqlite)
    }

    fn delete_votes_for(&self, task_id: Uuid) -> Result<Vec<String>> {
        let mut stmt = self.conn().prepare(
            "SELECT voter FROM task_delete_votes WHERE task_id = ?1 ORDER BY voted_at, rowid",
        )?;
        let rows = stmt.query_map(params![task_id.to_string()], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<String>, _>>()
            .map_err(StoreError::Sqlite)
    }

    fn all_delete_votes(&self) -> Result<HashMap<Uuid, Vec<String>>> {
        let mut stmt = self.conn().prepare(
            "SELECT task_id, voter FROM task_delete_votes ORDER BY voted_at, rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            let id_str: String = row.get(0)?;
            Ok((parse_uuid(0, &id_str)?, row.get::<_, String>(1)?))
        })?;

        let mut votes: HashMap<Uuid, Vec<String>> = HashMap::new();
        for row in rows {
            let (task_id, voter) = row?;
            votes.entry(task_id).or_default().push(voter);
        }
        Ok(votes)
    }

    // ------------------------------------------------------------------
    // Delete voting
    // ------------------------------------------------------------------

    /// Record `voter`'s vote to delete a task.
    ///
    /// Voting twice is a no-op.  Once the number of distinct voters reaches
    /// `quorum`, the task and every completion referencing it are removed in
    /// the same transaction.
    pub fn vote_delete_task(
        &self,
        task_id: Uuid,
        voter: &str,
        quorum: usize,
    ) -> Result<VoteOutcome> {
        let voter = validate::username("username", voter)?;
        let id = task_id.to_string();

        let tx = self.conn().unchecked_transaction()?;

        if !task_exists(&tx, &id)? {
            return Err(StoreError::NotFound("Task"));
        }

        let added = tx.execute(
            "INSERT OR IGNORE INTO task_delete_votes (task_id, voter, voted_at)
             VALUES (?1, ?2, ?3)",
            params![id, voter, format_timestamp(&now())],
        )?;

        let votes: i64 = tx.query_row(
            "SELECT COUNT(*) FROM task_delete_votes WHERE task_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        let votes = votes as usize;

        if votes >= quorum {
            let removed = cascade_delete(&tx, &id)?;
            tx.commit()?;
            tracing::info!(
                task_id = %task_id,
                votes,
                quorum,
                completions_removed = removed,
                "task deleted by vote"
            );
            return Ok(VoteOutcome::deleted());
        }

        tx.commit()?;
        if added > 0 {
            tracing::debug!(task_id = %task_id, voter, votes, quorum, "delete vote recorded");
        }
        Ok(VoteOutcome::pending(votes))
    }

    /// Remove a task and its completions unconditionally.  Returns `true` if
    /// the task existed.
    pub fn delete_task(&self, task_id: Uuid) -> Result<bool> {
        let tx = self.conn().unchecked_transaction()?;
        let existed = task_exists(&tx, &task_id.to_string())?;
        let removed = cascade_delete(&tx, &task_id.to_string())?;
        tx.commit()?;

        tracing::info!(task_id = %task_id, existed, completions_removed = removed, "task deleted");
        Ok(existed)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn task_exists(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )
}

/// Delete the task row (votes cascade) and its ledger entries. Returns the
/// number of completions removed.
fn cascade_delete(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<usize> {
    let removed = conn.execute("DELETE FROM completions WHERE task_id = ?1", params![id])?;
    conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
    Ok(removed)
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    let id_str: String = row.get(0)?;
    let recurrence_str: String = row.get(3)?;
    let created_str: String = row.get(5)?;

    let recurrence = recurrence_str.parse::<Recurrence>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Task {
        id: parse_uuid(0, &id_str)?,
        name: row.get(1)?,
        points: row.get(2)?,
        recurrence,
        created_by: row.get(4)?,
        created_at: parse_timestamp(5, &created_str)?,
        delete_votes: Vec::new(),
    })
}
