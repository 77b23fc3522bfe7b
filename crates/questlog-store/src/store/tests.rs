use super::*;
use questlog_core::config::StoreConfig;
use questlog_core::validate::{ChallengeName, Points};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::collections::HashSet;
use std::str::FromStr;

/// Create an in-memory store for testing.
async fn test_store() -> Store {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .create_if_missing(true)
        .foreign_keys(false);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .unwrap();
    Store::run_migrations(&pool).await.unwrap();
    Store { pool }
}

fn name(s: &str) -> ChallengeName {
    ChallengeName::parse(s).unwrap()
}

fn pts(n: i64) -> Points {
    Points::new(n).unwrap()
}

fn rows(list: &[(&str, i64)]) -> Vec<ChallengeRow> {
    list.iter()
        .map(|(n, p)| ChallengeRow {
            name: n.to_string(),
            points: *p,
        })
        .collect()
}

async fn seed(store: &Store, list: &[(&str, i64)]) {
    for (n, p) in list {
        assert_eq!(
            store.add_challenge(&name(n), pts(*p)).await.unwrap(),
            AddOutcome::Added
        );
    }
}

// --- Challenges ---

#[tokio::test]
async fn test_add_then_duplicate_any_case() {
    let store = test_store().await;
    assert_eq!(
        store.add_challenge(&name("Push-ups"), pts(10)).await.unwrap(),
        AddOutcome::Added
    );
    for variant in ["push-ups", "  PUSH-UPS ", "\"Push-Ups\""] {
        assert_eq!(
            store.add_challenge(&name(variant), pts(99)).await.unwrap(),
            AddOutcome::AlreadyExists,
            "variant {variant:?}"
        );
    }
    // The original row is untouched.
    assert_eq!(
        store.list_challenges().await.unwrap(),
        rows(&[("Push-ups", 10)])
    );
}

#[tokio::test]
async fn test_add_challenges_batch_applies_in_order() {
    let store = test_store().await;
    let names = vec![name("A"), name("A"), name("B")];
    let report = store.add_challenges(&names, pts(5)).await;
    assert!(report.failure.is_none());
    assert_eq!(
        report.items,
        vec![
            BatchItem {
                name: "A".into(),
                status: AddOutcome::Added
            },
            BatchItem {
                name: "A".into(),
                status: AddOutcome::AlreadyExists
            },
            BatchItem {
                name: "B".into(),
                status: AddOutcome::Added
            },
        ]
    );
}

#[tokio::test]
async fn test_batch_reports_items_before_failure() {
    let store = test_store().await;
    seed(&store, &[("Plank", 20)]).await;
    store.pool.close().await;

    let report = store.add_challenges(&[name("A"), name("B")], pts(5)).await;
    assert!(report.items.is_empty());
    assert!(matches!(report.failure, Some(QuestError::Storage(_))));
}

#[tokio::test]
async fn test_batch_keeps_items_processed_before_failure() {
    let store = test_store().await;
    sqlx::raw_sql(
        "CREATE TRIGGER reject_b BEFORE INSERT ON challenges \
         WHEN NEW.challenge_name = 'B' \
         BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
    )
    .execute(&store.pool)
    .await
    .unwrap();

    let report = store
        .add_challenges(&[name("A"), name("B"), name("C")], pts(5))
        .await;
    assert_eq!(
        report.items,
        vec![BatchItem {
            name: "A".into(),
            status: AddOutcome::Added
        }]
    );
    assert!(matches!(report.failure, Some(QuestError::Storage(_))));
    // Nothing after the failure was attempted.
    assert_eq!(store.list_challenges().await.unwrap(), rows(&[("A", 5)]));
}

#[tokio::test]
async fn test_delete_challenge_ignores_case() {
    let store = test_store().await;
    seed(&store, &[("Plank", 20)]).await;
    assert_eq!(
        store.delete_challenge(&name("PLANK")).await.unwrap(),
        DeleteOutcome::Deleted
    );
    assert_eq!(
        store.delete_challenge(&name("plank")).await.unwrap(),
        DeleteOutcome::NotFound
    );
    assert_eq!(store.challenge_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_list_orders_by_points_then_insertion() {
    let store = test_store().await;
    seed(&store, &[("Low", 5), ("High", 100), ("Mid A", 50), ("Mid B", 50)]).await;
    assert_eq!(
        store.list_challenges().await.unwrap(),
        rows(&[("High", 100), ("Mid A", 50), ("Mid B", 50), ("Low", 5)])
    );
}

#[tokio::test]
async fn test_search_ranks_fragments() {
    let store = test_store().await;
    seed(&store, &[("Push-ups", 10), ("Plank", 20), ("Pull-ups", 15)]).await;

    let results = store.search_challenges("pus", 50, 20).await.unwrap();
    assert_eq!(results, rows(&[("Push-ups", 10), ("Pull-ups", 15)]));

    let limited = store.search_challenges("pus", 50, 1).await.unwrap();
    assert_eq!(limited, rows(&[("Push-ups", 10)]));

    let everything = store.search_challenges("pus", 0, 20).await.unwrap();
    assert_eq!(everything.len(), 3);
    assert_eq!(everything[2].name, "Plank");
}

#[tokio::test]
async fn test_search_ties_keep_insertion_order() {
    let store = test_store().await;
    seed(&store, &[("Run 5k", 10), ("Run 10k", 20)]).await;
    let results = store.search_challenges("zzz", 0, 20).await.unwrap();
    assert_eq!(results, rows(&[("Run 5k", 10), ("Run 10k", 20)]));
}

// --- Progress ---

#[tokio::test]
async fn test_scenario_complete_remaining_leaderboard() {
    let store = test_store().await;
    seed(&store, &[("Push-ups", 10), ("Plank", 20)]).await;

    let outcome = store
        .complete_challenge("U1", &name("push-ups"))
        .await
        .unwrap();
    assert_eq!(outcome, CompleteOutcome::Completed { total_points: 10 });

    assert_eq!(store.remaining("U1").await.unwrap(), rows(&[("Plank", 20)]));
    assert_eq!(
        store.leaderboard().await.unwrap(),
        vec![LeaderboardEntry {
            user_id: "U1".into(),
            total_points: 10
        }]
    );
}

#[tokio::test]
async fn test_complete_is_idempotent() {
    let store = test_store().await;
    seed(&store, &[("Plank", 20)]).await;
    store.complete_challenge("U1", &name("Plank")).await.unwrap();

    let again = store.complete_challenge("U1", &name("PLANK")).await.unwrap();
    assert_eq!(again, CompleteOutcome::AlreadyCompleted);
    assert_eq!(store.total_points("U1").await.unwrap(), 20);
}

#[tokio::test]
async fn test_complete_unknown_challenge() {
    let store = test_store().await;
    let outcome = store.complete_challenge("U1", &name("Nope")).await.unwrap();
    assert_eq!(outcome, CompleteOutcome::NotFound);

    let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_progress")
        .fetch_one(&store.pool)
        .await
        .unwrap();
    assert_eq!(rows, 0, "no progress row for a missing challenge");
}

#[tokio::test]
async fn test_complete_flips_legacy_incomplete_row() {
    let store = test_store().await;
    seed(&store, &[("Plank", 20)]).await;
    // Earlier versions created the row first with is_completed = 0.
    sqlx::query("INSERT INTO user_progress (user_id, challenge_id, is_completed) VALUES ('U1', 1, 0)")
        .execute(&store.pool)
        .await
        .unwrap();

    let outcome = store.complete_challenge("U1", &name("plank")).await.unwrap();
    assert_eq!(outcome, CompleteOutcome::Completed { total_points: 20 });
}

#[tokio::test]
async fn test_complete_challenges_batch() {
    let store = test_store().await;
    seed(&store, &[("A", 5), ("B", 7)]).await;
    store.complete_challenge("U1", &name("B")).await.unwrap();

    let report = store
        .complete_challenges("U1", &[name("a"), name("b"), name("c"), name("A")])
        .await;
    assert!(report.failure.is_none());
    assert_eq!(
        report.statuses(),
        vec![
            CompleteOutcome::Completed { total_points: 12 },
            CompleteOutcome::AlreadyCompleted,
            CompleteOutcome::NotFound,
            CompleteOutcome::AlreadyCompleted,
        ]
    );
}

#[tokio::test]
async fn test_concurrent_completion_counts_once() {
    let store = test_store().await;
    seed(&store, &[("Plank", 20)]).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let s = store.clone();
        handles.push(tokio::spawn(async move {
            s.complete_challenge("U1", &name("Plank")).await.unwrap()
        }));
    }
    let mut completed = 0;
    for h in handles {
        if matches!(h.await.unwrap(), CompleteOutcome::Completed { .. }) {
            completed += 1;
        }
    }
    assert_eq!(completed, 1);
    assert_eq!(store.total_points("U1").await.unwrap(), 20);
}

#[tokio::test]
async fn test_remaining_and_completed_partition_all() {
    let store = test_store().await;
    seed(&store, &[("A", 5), ("B", 10), ("C", 15), ("D", 20)]).await;
    store.complete_challenge("U1", &name("B")).await.unwrap();
    store.complete_challenge("U1", &name("D")).await.unwrap();
    store.complete_challenge("U2", &name("A")).await.unwrap();

    let all: HashSet<String> = store
        .list_challenges()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();

    for user in ["U1", "U2", "U3"] {
        let remaining: HashSet<String> = store
            .remaining(user)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        let done: HashSet<String> = store
            .user_stats(user)
            .await
            .unwrap()
            .completed
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert!(remaining.is_disjoint(&done), "{user}");
        let union: HashSet<String> = remaining.union(&done).cloned().collect();
        assert_eq!(union, all, "{user}");
    }
}

#[tokio::test]
async fn test_random_remaining() {
    let store = test_store().await;
    seed(&store, &[("A", 5), ("B", 10), ("C", 15)]).await;
    store.complete_challenge("U1", &name("A")).await.unwrap();

    let pick = store.random_remaining("U1").await.unwrap().unwrap();
    assert!(["B", "C"].contains(&pick.challenge.name.as_str()));
    assert_eq!(pick.remaining_after, 1);

    store.complete_challenge("U1", &name("B")).await.unwrap();
    store.complete_challenge("U1", &name("C")).await.unwrap();
    assert!(store.random_remaining("U1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_user_stats() {
    let store = test_store().await;
    seed(&store, &[("A", 5), ("B", 50), ("C", 20)]).await;
    store.complete_challenge("U1", &name("B")).await.unwrap();
    store.complete_challenge("U1", &name("A")).await.unwrap();

    let stats = store.user_stats("U1").await.unwrap();
    assert_eq!(stats.total_points, 55);
    assert_eq!(stats.completed, rows(&[("B", 50), ("A", 5)]));
    assert_eq!(stats.most_recent, Some(rows(&[("A", 5)])[0].clone()));
    assert_eq!(stats.available_points, 75);
    assert!((stats.completion_ratio() - 55.0 / 75.0).abs() < 1e-9);

    let empty = store.user_stats("nobody").await.unwrap();
    assert_eq!(empty.total_points, 0);
    assert!(empty.completed.is_empty());
    assert!(empty.most_recent.is_none());
}

#[tokio::test]
async fn test_deleted_challenge_leaves_orphan_rows_harmless() {
    let store = test_store().await;
    seed(&store, &[("A", 5), ("B", 10)]).await;
    store.complete_challenge("U1", &name("A")).await.unwrap();
    store.complete_challenge("U1", &name("B")).await.unwrap();

    assert_eq!(
        store.delete_challenge(&name("B")).await.unwrap(),
        DeleteOutcome::Deleted
    );
    assert_eq!(store.total_points("U1").await.unwrap(), 5);
    assert_eq!(store.user_stats("U1").await.unwrap().completed, rows(&[("A", 5)]));
    assert!(store.remaining("U1").await.unwrap().is_empty());

    // Re-adding the name creates a fresh challenge the user has not done.
    seed(&store, &[("B", 10)]).await;
    assert_eq!(store.remaining("U1").await.unwrap(), rows(&[("B", 10)]));
}

#[tokio::test]
async fn test_deleted_challenge_id_is_never_reused() {
    let store = test_store().await;
    seed(&store, &[("Push-ups", 10), ("Plank", 20)]).await;
    store.complete_challenge("U1", &name("Plank")).await.unwrap();
    store.delete_challenge(&name("Plank")).await.unwrap();

    seed(&store, &[("Squats", 30)]).await;
    assert_eq!(
        store.remaining("U1").await.unwrap(),
        rows(&[("Squats", 30), ("Push-ups", 10)])
    );
    assert_eq!(store.total_points("U1").await.unwrap(), 0);
    assert_eq!(
        store.complete_challenge("U1", &name("Squats")).await.unwrap(),
        CompleteOutcome::Completed { total_points: 30 }
    );
}

#[tokio::test]
async fn test_migrations_drop_orphans_of_legacy_deletes() {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(false);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .unwrap();

    // An old database where the newest challenge was deleted after U1 did it.
    sqlx::raw_sql(include_str!("../../migrations/001_init.sql"))
        .execute(&pool)
        .await
        .unwrap();
    sqlx::raw_sql(
        "INSERT INTO challenges (challenge_id, challenge_name, points) VALUES \
             (1, 'Plank', 20), (2, 'Squats', 10);
         INSERT INTO user_progress (user_id, challenge_id, is_completed) VALUES ('U1', 2, 1);
         DELETE FROM challenges WHERE challenge_id = 2;",
    )
    .execute(&pool)
    .await
    .unwrap();

    Store::run_migrations(&pool).await.unwrap();
    let store = Store { pool };

    seed(&store, &[("Lunges", 15)]).await;
    assert_eq!(store.total_points("U1").await.unwrap(), 0);
    assert_eq!(
        store.remaining("U1").await.unwrap(),
        rows(&[("Plank", 20), ("Lunges", 15)])
    );
}

#[tokio::test]
async fn test_leaderboard_order_and_absence() {
    let store = test_store().await;
    seed(&store, &[("A", 5), ("B", 10), ("C", 20)]).await;
    store.complete_challenge("low", &name("A")).await.unwrap();
    store.complete_challenge("high", &name("C")).await.unwrap();
    store.complete_challenge("high", &name("B")).await.unwrap();
    store.complete_challenge("mid", &name("C")).await.unwrap();

    let board = store.leaderboard().await.unwrap();
    let ids: Vec<&str> = board.iter().map(|e| e.user_id.as_str()).collect();
    assert_eq!(ids, vec!["high", "mid", "low"]);
    assert!(board
        .windows(2)
        .all(|w| w[0].total_points >= w[1].total_points));
    assert!(!ids.contains(&"idle"));
}

#[tokio::test]
async fn test_progress_report() {
    let store = test_store().await;
    seed(&store, &[("A", 5), ("B", 10), ("C", 20), ("D", 1)]).await;
    store.complete_challenge("U1", &name("C")).await.unwrap();
    store.complete_challenge("U2", &name("A")).await.unwrap();
    store.complete_challenge("U2", &name("B")).await.unwrap();

    let users = vec!["U1".to_string(), "U2".to_string(), "U1".to_string()];
    let report = store.progress_report(&users).await.unwrap();
    assert_eq!(report.total_challenges, 4);
    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.entries[0].total_points, 20);
    assert_eq!(report.entries[0].completed_count, 1);
    assert_eq!(report.entries[0].percent, 25.0);
    assert_eq!(report.entries[1].percent, 50.0);
    assert_eq!(report.outcome, ProgressOutcome::Winner("U1".into()));

    let tie = store
        .progress_report(&["X".to_string(), "Y".to_string()])
        .await
        .unwrap();
    assert_eq!(tie.outcome, ProgressOutcome::Tie);

    let solo = store.progress_report(&["U2".to_string()]).await.unwrap();
    assert_eq!(solo.outcome, ProgressOutcome::Solo);
}

#[tokio::test]
async fn test_progress_report_with_no_challenges() {
    let store = test_store().await;
    let report = store.progress_report(&["U1".to_string()]).await.unwrap();
    assert_eq!(report.total_challenges, 0);
    assert_eq!(report.entries[0].percent, 0.0);
}

// --- Members ---

#[tokio::test]
async fn test_member_directory() {
    let store = test_store().await;
    store
        .remember_member("100", "Ada Lovelace", Some("ada"))
        .await
        .unwrap();
    store.remember_member("200", "Grace", None).await.unwrap();

    let ada = store.find_member("@ADA").await.unwrap().unwrap();
    assert_eq!(ada.user_id, "100");
    assert_eq!(store.find_member("grace").await.unwrap().unwrap().user_id, "200");
    assert_eq!(store.find_member("200").await.unwrap().unwrap().display_name, "Grace");
    assert!(store.find_member("@nobody").await.unwrap().is_none());
    assert!(store.find_member("@").await.unwrap().is_none());

    // Renames overwrite.
    store
        .remember_member("100", "Countess", Some("ada_l"))
        .await
        .unwrap();
    assert_eq!(
        store.display_name("100").await.unwrap().as_deref(),
        Some("Countess")
    );
    assert!(store.find_member("@ada").await.unwrap().is_none());
}

// --- Migrations ---

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let store = test_store().await;
    Store::run_migrations(&store.pool).await.unwrap();
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _migrations")
        .fetch_one(&store.pool)
        .await
        .unwrap();
    assert_eq!(count, 4);
}

#[tokio::test]
async fn test_migrations_collapse_legacy_duplicates() {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(false);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .unwrap();

    // A database as the first version of the bot left it.
    sqlx::raw_sql(include_str!("../../migrations/001_init.sql"))
        .execute(&pool)
        .await
        .unwrap();
    sqlx::raw_sql(
        "INSERT INTO challenges (challenge_id, challenge_name, points) VALUES \
             (1, 'Plank', 20), (2, 'plank', 30), (3, 'Squats', 10);
         INSERT INTO user_progress (user_id, challenge_id, is_completed) VALUES \
             ('U1', 3, 0), ('U1', 3, 1), ('U2', 1, 1);",
    )
    .execute(&pool)
    .await
    .unwrap();

    Store::run_migrations(&pool).await.unwrap();
    let store = Store { pool };

    assert_eq!(store.challenge_count().await.unwrap(), 2);
    assert_eq!(store.total_points("U1").await.unwrap(), 10);
    assert_eq!(
        store.complete_challenge("U1", &name("squats")).await.unwrap(),
        CompleteOutcome::AlreadyCompleted
    );
    assert_eq!(
        store.complete_challenge("U2", &name("PLANK")).await.unwrap(),
        CompleteOutcome::AlreadyCompleted
    );
}

#[tokio::test]
async fn test_new_creates_database_file() {
    let dir = std::env::temp_dir().join(format!("__questlog_store_test_{}__", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let db_path = dir.join("nested/challenges.db");
    let config = StoreConfig {
        db_path: db_path.to_string_lossy().to_string(),
    };

    let store = Store::new(&config).await.unwrap();
    seed(&store, &[("Plank", 20)]).await;
    assert!(db_path.exists());
    assert!(store.db_size().await.unwrap() > 0);

    let _ = std::fs::remove_dir_all(&dir);
}
