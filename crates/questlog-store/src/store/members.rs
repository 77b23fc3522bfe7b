//! Display names and handles of users the bot has seen.
//!
//! Chat platforms hand the bot opaque user ids; this directory lets
//! commands accept `@handle` arguments and show names on the leaderboard.

use super::{Member, Store};
use questlog_core::error::QuestError;

impl Store {
    /// Record (or refresh) a user's display name and handle.
    pub async fn remember_member(
        &self,
        user_id: &str,
        display_name: &str,
        username: Option<&str>,
    ) -> Result<(), QuestError> {
        sqlx::query(
            "INSERT INTO members (user_id, display_name, username) VALUES (?, ?, ?) \
             ON CONFLICT(user_id) DO UPDATE SET \
                 display_name = excluded.display_name, \
                 username = excluded.username, \
                 updated_at = datetime('now')",
        )
        .bind(user_id)
        .bind(display_name)
        .bind(username)
        .execute(&self.pool)
        .await
        .map_err(|e| QuestError::Storage(format!("remember member failed: {e}")))?;

        Ok(())
    }

    /// Resolve `@handle`, a display name, or a raw user id to a known member.
    ///
    /// Handles and names match ignoring case; the most recently seen member
    /// wins when several share a display name.
    pub async fn find_member(&self, handle: &str) -> Result<Option<Member>, QuestError> {
        let handle = handle.trim().trim_start_matches('@');
        if handle.is_empty() {
            return Ok(None);
        }

        let row: Option<(String, String, Option<String>)> = sqlx::query_as(
            "SELECT user_id, display_name, username FROM members \
             WHERE username = ?1 COLLATE NOCASE \
                OR user_id = ?1 \
                OR display_name = ?1 COLLATE NOCASE \
             ORDER BY (username = ?1 COLLATE NOCASE) DESC, \
                      (user_id = ?1) DESC, \
                      updated_at DESC \
             LIMIT 1",
        )
        .bind(handle)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| QuestError::Storage(format!("find member failed: {e}")))?;

        Ok(row.map(|(user_id, display_name, username)| Member {
            user_id,
            display_name,
            username,
        }))
    }

    /// Display name for a user id, if the bot has seen them.
    pub async fn display_name(&self, user_id: &str) -> Result<Option<String>, QuestError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT display_name FROM members WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| QuestError::Storage(format!("display name lookup failed: {e}")))?;

        Ok(row.map(|(name,)| name))
    }
}
