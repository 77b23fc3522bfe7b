//! # questlog-store
//!
//! Persistent challenge, progress, and member storage for questlog (SQLite-backed).

pub mod store;

pub use store::{
    similarity, AddOutcome, BatchItem, BatchReport, ChallengeRow, CompleteOutcome,
    DeleteOutcome, LeaderboardEntry, Member, ProgressEntry, ProgressOutcome, ProgressReport,
    RandomPick, Store, UserStats,
};
