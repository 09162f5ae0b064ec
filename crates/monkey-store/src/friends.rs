//! Directed friend edges.  A -> B says nothing about B -> A.

use monkey_shared::{validate, ValidationError};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::row::{format_timestamp, is_constraint_violation, now};

impl Database {
    /// Identities `username` has befriended, in the order they were added.
    pub fn list_friends(&self, username: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn().prepare(
            "SELECT friend_username FROM friends
             WHERE username = ?1
             ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![username], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<String>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Add the edge `username -> friend`.  The target must be a registered
    /// user and the edge must not already exist.
    pub fn add_friend(&self, username: &str, friend: &str) -> Result<()> {
        let username = validate::username("username", username)?;
        let friend = validate::username("friendUsername", friend)?;
        if username == friend {
            return Err(ValidationError::SelfFriend.into());
        }
        if !self.user_exists(friend)? {
            return Err(StoreError::NotFound("User"));
        }

        self.conn()
            .execute(
                "INSERT INTO friends (username, friend_username, created_at)
                 VALUES (?1, ?2, ?3)",
                params![username, friend, format_timestamp(&now())],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StoreError::Conflict("Already friends".into())
                } else {
                    StoreError::Sqlite(e)
                }
            })?;

        tracing::info!(username, friend, "friend added");
        Ok(())
    }

    /// Remove the edge `username -> friend`.  Returns `true` if it existed.
    pub fn remove_friend(&self, username: &str, friend: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM friends WHERE username = ?1 AND friend_username = ?2",
            params![username, friend],
        )?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("friends.db")).unwrap();
        for name in ["alice", "bob", "carol"] {
            db.create_user(name, "pw").unwrap();
        }
        (db, dir)
    }

    #[test]
    fn test_edges_are_directed() {
        let (db, _dir) = test_db();
        db.add_friend("alice", "bob").unwrap();

        assert_eq!(db.list_friends("alice").unwrap(), vec!["bob"]);
        assert!(db.list_friends("bob").unwrap().is_empty());
    }

    #[test]
    fn test_friends_keep_insertion_order() {
        let (db, _dir) = test_db();
        db.add_friend("alice", "carol").unwrap();
        db.add_friend("alice", "bob").unwrap();
        assert_eq!(db.list_friends("alice").unwrap(), vec!["carol", "bob"]);
    }

    #[test]
    fn test_duplicate_edge_conflicts() {
        let (db, _dir) = test_db();
        db.add_friend("alice", "bob").unwrap();
        assert!(matches!(
            db.add_friend("alice", "bob"),
            Err(StoreError::Conflict(_))
        ));
        // The reverse edge is a different edge.
        db.add_friend("bob", "alice").unwrap();
    }

    #[test]
    fn test_unknown_friend_not_found() {
        let (db, _dir) = test_db();
        assert!(matches!(
            db.add_friend("alice", "mallory"),
            Err(StoreError::NotFound("User"))
        ));
    }

    #[test]
    fn test_self_friend_rejected() {
        let (db, _dir) = test_db();
        assert!(matches!(
            db.add_friend("alice", "alice"),
            Err(StoreError::Validation(ValidationError::SelfFriend))
        ));
    }

    #[test]
    fn test_remove_friend() {
        let (db, _dir) = test_db();
        db.add_friend("alice", "bob").unwrap();
        assert!(db.remove_friend("alice", "bob").unwrap());
        assert!(!db.remove_friend("alice", "bob").unwrap());
        assert!(db.list_friends("alice").unwrap().is_empty());
    }
}
