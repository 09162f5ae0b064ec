//! # monkey-store
//!
//! Persistent storage for MONKey, backed by embedded SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed helpers for the shared task
//! catalog, the completion ledger, delete voting, friend edges, the chatroom
//! and learning resources.  Points are never stored: the weekly leaderboard
//! is recomputed from the ledger and the current catalog on every call.

pub mod completions;
pub mod database;
pub mod friends;
pub mod leaderboard;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod resources;
pub mod tasks;
pub mod users;

mod error;
mod row;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
