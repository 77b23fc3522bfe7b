//! Records and outcomes returned by store operations.
//!
//! "Not found", "already exists" and "already completed" are ordinary
//! outcomes here, not errors; only storage failures travel as `Err`.

use questlog_core::error::QuestError;

/// A challenge as shown to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRow {
    pub name: String,
    pub points: i64,
}

impl From<(String, i64)> for ChallengeRow {
    fn from((name, points): (String, i64)) -> Self {
        Self { name, points }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompleteOutcome {
    /// First completion; carries the user's total points afterwards.
    Completed { total_points: i64 },
    AlreadyCompleted,
    NotFound,
}

/// One processed entry of a batch operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem<S> {
    pub name: String,
    pub status: S,
}

/// Per-item results of a batch, plus the storage failure that cut it short.
///
/// Items processed before a failure are always reported.
#[derive(Debug)]
pub struct BatchReport<S> {
    pub items: Vec<BatchItem<S>>,
    pub failure: Option<QuestError>,
}

impl<S> Default for BatchReport<S> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            failure: None,
        }
    }
}

impl<S: Copy> BatchReport<S> {
    pub fn statuses(&self) -> Vec<S> {
        self.items.iter().map(|item| item.status).collect()
    }
}

/// A random unfinished challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomPick {
    pub challenge: ChallengeRow,
    /// How many unfinished challenges are left besides this one.
    pub remaining_after: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStats {
    pub total_points: i64,
    /// Completed challenges, highest points first.
    pub completed: Vec<ChallengeRow>,
    /// The most recently completed challenge.
    pub most_recent: Option<ChallengeRow>,
    /// Sum of points over every existing challenge.
    pub available_points: i64,
}

impl UserStats {
    /// Share of all available points this user has earned, 0.0-1.0.
    pub fn completion_ratio(&self) -> f64 {
        if self.available_points <= 0 {
            return 0.0;
        }
        self.total_points as f64 / self.available_points as f64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub total_points: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEntry {
    pub user_id: String,
    pub total_points: i64,
    pub completed_count: i64,
    /// Completed share of all challenges, rounded to two decimals.
    pub percent: f64,
}

/// Who is ahead in a progress report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressOutcome {
    /// Fewer than two users: nothing to compare.
    Solo,
    Winner(String),
    /// Every user has the same points, completion count and percentage.
    Tie,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    pub total_challenges: i64,
    pub entries: Vec<ProgressEntry>,
    pub outcome: ProgressOutcome,
}

/// A user the bot has seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user_id: String,
    pub display_name: String,
    pub username: Option<String>,
}
