//! Account records.  Credentials are compared by the HTTP layer.

use monkey_shared::validate;
use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::User;
use crate::row::{format_timestamp, is_constraint_violation, now, parse_timestamp};

impl Database {
    /// Register a new account. Usernames are case-sensitive.
    pub fn create_user(&self, username: &str, password: &str) -> Result<User> {
        let username = validate::username("username", username)?;
        if password.is_empty() {
            return Err(monkey_shared::ValidationError::MissingField("password").into());
        }

        let user = User {
            username: username.to_string(),
            password: password.to_string(),
            profile_pic: String::new(),
            created_at: now(),
        };

        self.conn()
            .execute(
                "INSERT INTO users (username, password, profile_pic, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    user.username,
                    user.password,
                    user.profile_pic,
                    format_timestamp(&user.created_at),
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StoreError::Conflict("Username already exists".into())
                } else {
                    StoreError::Sqlite(e)
                }
            })?;

        tracing::info!(username = %user.username, "user registered");
        Ok(user)
    }

    pub fn get_user(&self, username: &str) -> Result<User> {
        self.find_user(username)?.ok_or(StoreError::NotFound("User"))
    }

    pub fn find_user(&self, username: &str) -> Result<Option<User>> {
        let user = self
            .conn()
            .query_row(
                "SELECT username, password, profile_pic, created_at
                 FROM users WHERE username = ?1",
                params![username],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn user_exists(&self, username: &str) -> Result<bool> {
        let exists: bool = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
            params![username],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Replace the avatar (emoji or data URI) and return the updated user.
    pub fn set_profile_pic(&self, username: &str, profile_pic: &str) -> Result<User> {
        let affected = self.conn().execute(
            "UPDATE users SET profile_pic = ?1 WHERE username = ?2",
            params![profile_pic, username],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound("User"));
        }
        self.get_user(username)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let created_str: String = row.get(3)?;
    Ok(User {
        username: row.get(0)?,
        password: row.get(1)?,
        profile_pic: row.get(2)?,
        created_at: parse_timestamp(3, &created_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("users.db")).unwrap();
        (db, dir)
    }

    #[test]
    fn test_create_and_get_user() {
        let (db, _dir) = test_db();
        let created = db.create_user("alice", "pw").unwrap();
        let fetched = db.get_user("alice").unwrap();
        assert_eq!(created, fetched);
        assert_eq!(fetched.profile_pic, "");
    }

    #[test]
    fn test_duplicate_username_conflicts() {
        let (db, _dir) = test_db();
        db.create_user("alice", "pw").unwrap();
        assert!(matches!(
            db.create_user("alice", "other"),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn test_usernames_are_case_sensitive() {
        let (db, _dir) = test_db();
        db.create_user("alice", "pw").unwrap();
        db.create_user("Alice", "pw").unwrap();
        assert!(db.user_exists("Alice").unwrap());
        assert!(!db.user_exists("ALICE").unwrap());
    }

    #[test]
    fn test_empty_fields_rejected() {
        let (db, _dir) = test_db();
        assert!(matches!(
            db.create_user("  ", "pw"),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            db.create_user("bob", ""),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_set_profile_pic() {
        let (db, _dir) = test_db();
        db.create_user("alice", "pw").unwrap();
        let user = db.set_profile_pic("alice", "🦍").unwrap();
        assert_eq!(user.profile_pic, "🦍");

        assert!(matches!(
            db.set_profile_pic("ghost", "🦍"),
            Err(StoreError::NotFound("User"))
        ));
    }
}
