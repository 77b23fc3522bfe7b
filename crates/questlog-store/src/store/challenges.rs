//! Challenge definitions: add, delete, list, and fuzzy search.

use super::search::similarity;
use super::{AddOutcome, BatchItem, BatchReport, ChallengeRow, DeleteOutcome, Store};
use questlog_core::{
    error::QuestError,
    validate::{ChallengeName, Points},
};
use tracing::info;

impl Store {
    /// Add a challenge unless one with the same name (ignoring case) exists.
    ///
    /// The unique index on `challenge_name COLLATE NOCASE` makes the check and
    /// the insert a single statement.
    pub async fn add_challenge(
        &self,
        name: &ChallengeName,
        points: Points,
    ) -> Result<AddOutcome, QuestError> {
        let result =
            sqlx::query("INSERT OR IGNORE INTO challenges (challenge_name, points) VALUES (?, ?)")
                .bind(name.as_str())
                .bind(points.get())
                .execute(&self.pool)
                .await
                .map_err(|e| QuestError::Storage(format!("add challenge failed: {e}")))?;

        if result.rows_affected() > 0 {
            info!("challenge added: {name} ({points} points)");
            Ok(AddOutcome::Added)
        } else {
            Ok(AddOutcome::AlreadyExists)
        }
    }

    /// Add several challenges with the same point value, in order.
    ///
    /// Each name is applied on its own, so a repeat later in the batch sees
    /// the earlier insert. Stops at the first storage failure.
    pub async fn add_challenges(
        &self,
        names: &[ChallengeName],
        points: Points,
    ) -> BatchReport<AddOutcome> {
        let mut report = BatchReport::default();
        for name in names {
            match self.add_challenge(name, points).await {
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

    /// Delete a challenge by name (ignoring case).
    ///
    /// Progress rows pointing at it are left in place; every query joins
    /// through `challenges`, so they stop counting.
    pub async fn delete_challenge(&self, name: &ChallengeName) -> Result<DeleteOutcome, QuestError> {
        let result = sqlx::query("DELETE FROM challenges WHERE challenge_name = ? COLLATE NOCASE")
            .bind(name.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| QuestError::Storage(format!("delete challenge failed: {e}")))?;

        if result.rows_affected() > 0 {
            info!("challenge deleted: {name}");
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }

    /// All challenges, highest points first.
    pub async fn list_challenges(&self) -> Result<Vec<ChallengeRow>, QuestError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT challenge_name, points FROM challenges \
             ORDER BY points DESC, challenge_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| QuestError::Storage(format!("list challenges failed: {e}")))?;

        Ok(rows.into_iter().map(ChallengeRow::from).collect())
    }

    /// Challenges whose names resemble `keyword`, best match first.
    ///
    /// Scores run 0-100; names below `min_score` are dropped and at most
    /// `limit` rows are returned. Equal scores keep insertion order.
    pub async fn search_challenges(
        &self,
        keyword: &str,
        min_score: u8,
        limit: usize,
    ) -> Result<Vec<ChallengeRow>, QuestError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT challenge_name, points FROM challenges ORDER BY challenge_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| QuestError::Storage(format!("search challenges failed: {e}")))?;

        let mut scored: Vec<(u8, ChallengeRow)> = rows
            .into_iter()
            .map(|(name, points)| (similarity(keyword, &name), ChallengeRow { name, points }))
            .filter(|(score, _)| *score >= min_score)
            .collect();

        // Stable: ties stay in insertion order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(limit);

        Ok(scored.into_iter().map(|(_, row)| row).collect())
    }

    /// Number of challenges.
    pub async fn challenge_count(&self) -> Result<i64, QuestError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM challenges")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| QuestError::Storage(format!("count challenges failed: {e}")))?;

        Ok(count)
    }

    /// Sum of points over every challenge.
    pub async fn available_points(&self) -> Result<i64, QuestError> {
        let (total,): (i64,) = sqlx::query_as("SELECT COALESCE(SUM(points), 0) FROM challenges")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| QuestError::Storage(format!("sum points failed: {e}")))?;

        Ok(total)
    }
}
