//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` so it can be handed directly to the HTTP
//! layer; field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use monkey_shared::Recurrence;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered account.  The username is the identity used everywhere else.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    /// Stored as given; never serialized.
    #[serde(skip_serializing, default)]
    pub password: String,
    /// Emoji glyph or `data:image/...` URI. Empty when unset.
    pub profile_pic: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A shared task anyone can complete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub points: u32,
    pub recurrence: Recurrence,
    /// Informational only; the creator has no extra rights over the task.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    /// Users who voted to delete this task, in voting order.
    pub delete_votes: Vec<String>,
}

/// Input for [`Database::create_task`](crate::Database::create_task).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    #[serde(default)]
    pub name: String,
    pub points: i64,
    #[serde(default)]
    pub recurrence: Option<String>,
    #[serde(default)]
    pub created_by: String,
}

/// Result of a delete vote.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct VoteOutcome {
    pub deleted: bool,
    /// Current tally; absent once the task is gone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub votes: Option<usize>,
}

impl VoteOutcome {
    pub fn deleted() -> Self {
        Self {
            deleted: true,
            votes: None,
        }
    }

    pub fn pending(votes: usize) -> Self {
        Self {
            deleted: false,
            votes: Some(votes),
        }
    }
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// A user did a task on a given calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub id: Uuid,
    pub username: String,
    /// Not checked against the catalog.
    pub task_id: Uuid,
    /// `YYYY-MM-DD`, as chosen by the client.
    pub date: String,
    /// Wall-clock time of the toggle; only used for weekly scoring.
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    Added,
    Removed,
}

/// Result of flipping a (user, task, date) completion.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub action: ToggleAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<Completion>,
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub username: String,
    pub points: u64,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A chatroom message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    /// Author.
    pub username: String,
    #[serde(rename = "message")]
    pub body: String,
    /// Optional image data URI; empty when the message is text only.
    pub image_url: String,
    pub timestamp: DateTime<Utc>,
    /// Users who marked this message read.
    pub read_by: Vec<String>,
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// A learning-resource link shared with everyone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: Uuid,
    pub username: String,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResource {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_toggle_outcome_wire_shape() {
        let removed = ToggleOutcome {
            action: ToggleAction::Removed,
            completion: None,
        };
        assert_eq!(
            serde_json::to_value(&removed).unwrap(),
            json!({ "action": "removed" })
        );
    }

    #[test]
    fn test_vote_outcome_wire_shape() {
        assert_eq!(
            serde_json::to_value(VoteOutcome::deleted()).unwrap(),
            json!({ "deleted": true })
        );
        assert_eq!(
            serde_json::to_value(VoteOutcome::pending(2)).unwrap(),
            json!({ "deleted": false, "votes": 2 })
        );
    }

    #[test]
    fn test_user_password_not_serialized() {
        let user = User {
            username: "alice".into(),
            password: "hunter2".into(),
            profile_pic: "🐵".into(),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password").is_none());
        assert_eq!(value["profilePic"], "🐵");
    }

    #[test]
    fn test_message_body_is_named_message() {
        let msg = Message {
            id: Uuid::new_v4(),
            username: "bob".into(),
            body: "hi".into(),
            image_url: String::new(),
            timestamp: Utc::now(),
            read_by: vec!["alice".into()],
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["message"], "hi");
        assert_eq!(value["readBy"], json!(["alice"]));
        assert_eq!(value["imageUrl"], "");
    }
}
