//! Per-user completion state, stats, leaderboard, and progress reports.

use super::{
    BatchItem, BatchReport, ChallengeRow, CompleteOutcome, LeaderboardEntry, ProgressEntry,
    ProgressOutcome, ProgressReport, RandomPick, Store, UserStats,
};
use questlog_core::{error::QuestError, validate::ChallengeName};
use rand::Rng;
use tracing::info;

impl Store {
    /// Challenges the user has not completed, highest points first.
    pub async fn remaining(&self, user_id: &str) -> Result<Vec<ChallengeRow>, QuestError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT challenge_name, points FROM challenges \
             WHERE challenge_id NOT IN ( \
                 SELECT challenge_id FROM user_progress WHERE user_id = ? AND is_completed = 1 \
             ) \
             ORDER BY points DESC, challenge_id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| QuestError::Storage(format!("remaining query failed: {e}")))?;

        Ok(rows.into_iter().map(ChallengeRow::from).collect())
    }

    /// A uniformly random unfinished challenge, or `None` when everything is done.
    pub async fn random_remaining(&self, user_id: &str) -> Result<Option<RandomPick>, QuestError> {
        let mut rows = self.remaining(user_id).await?;
        if rows.is_empty() {
            return Ok(None);
        }
        let remaining_after = rows.len() - 1;
        let idx = rand::thread_rng().gen_range(0..rows.len());
        Ok(Some(RandomPick {
            challenge: rows.swap_remove(idx),
            remaining_after,
        }))
    }

    /// Mark a challenge completed for a user (name matched ignoring case).
    ///
    /// The upsert only flips rows that are not completed yet, so two racing
    /// calls cannot both report `Completed`.
    pub async fn complete_challenge(
        &self,
        user_id: &str,
        name: &ChallengeName,
    ) -> Result<CompleteOutcome, QuestError> {
        let result = sqlx::query(
            "INSERT INTO user_progress (user_id, challenge_id, is_completed) \
             SELECT ?, challenge_id, 1 FROM challenges WHERE challenge_name = ? COLLATE NOCASE \
             ON CONFLICT(user_id, challenge_id) DO UPDATE SET is_completed = 1 \
             WHERE user_progress.is_completed = 0",
        )
        .bind(user_id)
        .bind(name.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| QuestError::Storage(format!("complete challenge failed: {e}")))?;

        if result.rows_affected() > 0 {
            let total_points = self.total_points(user_id).await?;
            info!("user {user_id} completed {name} (total {total_points})");
            return Ok(CompleteOutcome::Completed { total_points });
        }

        // Nothing written: either no such challenge or already done.
        let exists: Option<(i64,)> = sqlx::query_as(
            "SELECT challenge_id FROM challenges WHERE challenge_name = ? COLLATE NOCASE",
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| QuestError::Storage(format!("challenge lookup failed: {e}")))?;

        Ok(match exists {
            Some(_) => CompleteOutcome::AlreadyCompleted,
            None => CompleteOutcome::NotFound,
        })
    }

    /// Complete several challenges, one atomic step per name, in order.
    /// Stops at the first storage failure.
    pub async fn complete_challenges(
        &self,
        user_id: &str,
        names: &[ChallengeName],
    ) -> BatchReport<CompleteOutcome> {
        let mut report = BatchReport::default();
        for name in names {
            match self.complete_challenge(user_id, name).await {
                Ok(status) => report.items.push(BatchItem {
                    name: name.to_string(),
                    status,
                }),
                Err(e) => {
                    report.failure = Some(e);
                    break;
                }
            }
        }
        report
    }

    /// Sum of points over the user's completed challenges.
    pub async fn total_points(&self, user_id: &str) -> Result<i64, QuestError> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(c.points), 0) FROM user_progress p \
             INNER JOIN challenges c ON p.challenge_id = c.challenge_id \
             WHERE p.user_id = ? AND p.is_completed = 1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| QuestError::Storage(format!("total points query failed: {e}")))?;

        Ok(total)
    }

    /// Points, completed challenges, and most recent completion for a user.
    pub async fn user_stats(&self, user_id: &str) -> Result<UserStats, QuestError> {
        // rowid order is completion order: rows are created on first completion
        // attempt and never re-inserted.
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT c.challenge_name, c.points FROM user_progress p \
             INNER JOIN challenges c ON p.challenge_id = c.challenge_id \
             WHERE p.user_id = ? AND p.is_completed = 1 \
             ORDER BY p.rowid ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| QuestError::Storage(format!("user stats query failed: {e}")))?;

        let mut completed: Vec<ChallengeRow> = rows.into_iter().map(ChallengeRow::from).collect();
        let most_recent = completed.last().cloned();
        let total_points = completed.iter().map(|c| c.points).sum();
        completed.sort_by(|a, b| b.points.cmp(&a.points));

        Ok(UserStats {
            total_points,
            completed,
            most_recent,
            available_points: self.available_points().await?,
        })
    }

    /// Users with at least one completion, most points first.
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, QuestError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT p.user_id, SUM(c.points) AS total FROM user_progress p \
             INNER JOIN challenges c ON p.challenge_id = c.challenge_id \
             WHERE p.is_completed = 1 \
             GROUP BY p.user_id \
             ORDER BY total DESC, p.user_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| QuestError::Storage(format!("leaderboard query failed: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|(user_id, total_points)| LeaderboardEntry {
                user_id,
                total_points,
            })
            .collect())
    }

    /// Side-by-side progress for the given users (duplicates collapsed).
    pub async fn progress_report(&self, user_ids: &[String]) -> Result<ProgressReport, QuestError> {
        let total_challenges = self.challenge_count().await?;

        let mut entries: Vec<ProgressEntry> = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            if entries.iter().any(|e| &e.user_id == user_id) {
                continue;
            }
            let (completed_count, total_points): (i64, i64) = sqlx::query_as(
                "SELECT COUNT(*), COALESCE(SUM(c.points), 0) FROM user_progress p \
                 INNER JOIN challenges c ON p.challenge_id = c.challenge_id \
                 WHERE p.user_id = ? AND p.is_completed = 1",
            )
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| QuestError::Storage(format!("progress query failed: {e}")))?;

            entries.push(ProgressEntry {
                user_id: user_id.clone(),
                total_points,
                completed_count,
                percent: percent_of(completed_count, total_challenges),
            });
        }

        let outcome = decide_outcome(&entries);
        Ok(ProgressReport {
            total_challenges,
            entries,
            outcome,
        })
    }
}

/// `part / whole` as a percentage rounded to two decimals; 0 when `whole` is 0.
fn percent_of(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 10_000.0).round() / 100.0
}

/// Highest points wins, then most completions; among equals the user listed
/// first keeps the lead. Only users identical on every field tie.
pub(super) fn decide_outcome(entries: &[ProgressEntry]) -> ProgressOutcome {
    if entries.len() < 2 {
        return ProgressOutcome::Solo;
    }
    let first = &entries[0];
    if entries.iter().all(|e| {
        e.total_points == first.total_points
            && e.completed_count == first.completed_count
            && e.percent == first.percent
    }) {
        return ProgressOutcome::Tie;
    }

    let mut leader = first;
    for entry in &entries[1..] {
        if (entry.total_points, entry.completed_count)
            > (leader.total_points, leader.completed_count)
        {
            leader = entry;
        }
    }
    ProgressOutcome::Winner(leader.user_id.clone())
}
