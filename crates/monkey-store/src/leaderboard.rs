//! Weekly leaderboard.
//!
//! Points are derived, never stored: every call re-reads the ledger for the
//! caller and the people they follow, and prices each completion against the
//! task catalog as it is *now*.  Completions of deleted (or never existing)
//! tasks score nothing.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::Database;
use crate::error::Result;
use crate::models::{Completion, LeaderboardEntry};

/// Score `population` over the window starting at `week_start`.
///
/// `completions` may contain records of anyone and from any time; only those
/// by a population member with `completed_at >= week_start` whose task is in
/// `catalog` count.  The result is sorted by points, highest first; ties keep
/// the order of `population`.
pub fn rank(
    population: &[String],
    completions: &[Completion],
    catalog: &HashMap<Uuid, u32>,
    week_start: DateTime<Utc>,
) -> Vec<LeaderboardEntry> {
    let mut totals: HashMap<&str, u64> = HashMap::with_capacity(population.len());
    for completion in completions {
        if completion.completed_at < week_start {
            continue;
        }
        let Some(points) = catalog.get(&completion.task_id) else {
            continue;
        };
        *totals.entry(completion.username.as_str()).or_default() += u64::from(*points);
    }

    let mut board: Vec<LeaderboardEntry> = population
        .iter()
        .map(|username| LeaderboardEntry {
            username: username.clone(),
            points: totals.get(username.as_str()).copied().unwrap_or(0),
        })
        .collect();

    // `sort_by` is stable, so ties stay in population order.
    board.sort_by(|a, b| b.points.cmp(&a.points));
    board
}

impl Database {
    /// Leaderboard for `username` and everyone they have befriended.
    pub fn leaderboard(
        &self,
        username: &str,
        week_start: DateTime<Utc>,
    ) -> Result<Vec<LeaderboardEntry>> {
        let mut population = vec![username.to_string()];
        for friend in self.list_friends(username)? {
            if !population.contains(&friend) {
                population.push(friend);
            }
        }

        let mut completions = Vec::new();
        for member in &population {
            completions.extend(self.completions_since(member, week_start)?);
        }

        let catalog = self.task_points()?;
        let board = rank(&population, &completions, &catalog, week_start);

        tracing::debug!(
            username,
            members = population.len(),
            completions = completions.len(),
            week_start = %week_start,
            "leaderboard computed"
        );
        Ok(board)
    }
}
