//! Leaderboard service.
//!
//! Standings are a projection over the user table, never stored. Ordering is
//! points descending with ULID ascending as the tie-break, so users on equal
//! points rank in signup order and the ordering is total and stable.

use greenwatch_common::AppResult;
use greenwatch_db::repositories::UserRepository;
use serde::Serialize;

/// Default number of leaderboard entries.
pub const DEFAULT_TOP: u64 = 20;

/// One leaderboard row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u64,
    pub user_id: String,
    pub name: String,
    pub points: i32,
}

/// A single user's standing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub rank: u64,
    pub points: i32,
    pub total_users: u64,
}

/// Leaderboard service.
#[derive(Clone)]
pub struct LeaderboardService {
    user_repo: UserRepository,
}

impl LeaderboardService {
    /// Create a new leaderboard service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// Credit (or debit) points with a single atomic UPDATE.
    ///
    /// Submission awards travel inside the report transaction instead;
    /// negative deltas only travel through the guarded claim path. This is
    /// the standalone adjustment used by administrative corrections.
    pub async fn award_points(&self, user_id: &str, delta: i32) -> AppResult<()> {
        self.user_repo.adjust_points(user_id, delta).await?;
        tracing::info!(user_id = user_id, delta = delta, "points adjusted");
        Ok(())
    }

    /// The top `limit` users with ranks assigned by position.
    pub async fn top(&self, limit: u64) -> AppResult<Vec<LeaderboardEntry>> {
        let users = self.user_repo.top_by_points(limit).await?;

        Ok(users
            .into_iter()
            .enumerate()
            .map(|(i, user)| LeaderboardEntry {
                rank: i as u64 + 1,
                user_id: user.id,
                name: user.name,
                points: user.points,
            })
            .collect())
    }

    /// A user's own standing, computed without fetching the whole board.
    pub async fn standing(&self, user_id: &str) -> AppResult<Standing> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let ahead = self
            .user_repo
            .count_ranked_ahead(user.points, &user.id)
            .await?;
        let total_users = self.user_repo.count().await?;

        Ok(Standing {
            rank: ahead + 1,
            points: user.points,
            total_users,
        })
    }
}
