//! Challenge definition commands: add, delete, search, list.

use super::{storage_failure, CommandContext, PagedReply, Reply};
use questlog_core::validate::{parse_name_list, ChallengeName, Points};
use questlog_store::{AddOutcome, ChallengeRow, DeleteOutcome};
use tracing::warn;

const ADD_USAGE: &str =
    "Usage: /add_challenge \"challenge1\", \"challenge2\" points\nExample: /add_challenge \"Plank\", \"Push-ups\" 10";

/// Medal by point value.
pub(super) fn tier_emoji(points: i64) -> &'static str {
    if points >= 100 {
        "🏆"
    } else if points >= 50 {
        "🎖️"
    } else {
        "🎗️"
    }
}

/// Numbered name and points; `index` is 0-based.
pub(super) fn challenge_row(index: usize, row: &ChallengeRow) -> String {
    format!("{}. *{}* for `{} points`", index + 1, row.name, row.points)
}

pub(super) fn tiered_row(index: usize, row: &ChallengeRow) -> String {
    format!(
        "{}. {} *{}* for `{} points`",
        index + 1,
        tier_emoji(row.points),
        row.name,
        row.points
    )
}

pub(super) async fn handle_add(ctx: &CommandContext<'_>) -> Reply {
    let args = ctx.args();
    let Some((names_raw, points_raw)) = args.rsplit_once(char::is_whitespace) else {
        return Reply::Text(ADD_USAGE.to_string());
    };
    let points = match Points::parse(points_raw) {
        Ok(p) => p,
        Err(e) => return Reply::Text(format!("{e}.\n{ADD_USAGE}")),
    };
    let names = match parse_name_list(names_raw) {
        Ok(n) => n,
        Err(_) => return Reply::Text(ADD_USAGE.to_string()),
    };

    let mut report = ctx.store.add_challenges(&names, points).await;
    if report.items.is_empty() {
        if let Some(e) = report.failure.take() {
            return storage_failure(e);
        }
    }
    let rows = report
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let (emoji, status) = match item.status {
                AddOutcome::Added => ("✅", "added"),
                AddOutcome::AlreadyExists => ("❌", "already exists"),
            };
            format!(
                "{}. {emoji} *{}* for `{points} points` {status}",
                i + 1,
                item.name
            )
        })
        .collect();

    let mut reply = PagedReply::new("Added challenges", rows, "No challenges were added.");
    if let Some(e) = report.failure {
        warn!("add_challenge stopped early: {e}");
        reply = reply.with_note("⚠️ Stopped early: something went wrong.");
    }
    Reply::Pages(reply)
}

pub(super) async fn handle_delete(ctx: &CommandContext<'_>) -> Reply {
    if !ctx.is_admin {
        return Reply::Text("Only admins can delete challenges.".to_string());
    }
    let name = match ChallengeName::parse(ctx.args()) {
        Ok(n) => n,
        Err(_) => return Reply::Text("Usage: /delete_challenge challenge name".to_string()),
    };
    match ctx.store.delete_challenge(&name).await {
        Ok(DeleteOutcome::Deleted) => {
            Reply::Text(format!("The challenge \"{name}\" has been deleted."))
        }
        Ok(DeleteOutcome::NotFound) => {
            Reply::Text(format!("The challenge \"{name}\" does not exist."))
        }
        Err(e) => storage_failure(e),
    }
}

pub(super) async fn handle_search(ctx: &CommandContext<'_>) -> Reply {
    let keyword = ctx.args();
    if keyword.is_empty() {
        return Reply::Text("Usage: /search keyword".to_string());
    }
    match ctx
        .store
        .search_challenges(keyword, ctx.search.min_score, ctx.search.limit)
        .await
    {
        Ok(results) => Reply::Pages(PagedReply::new(
            format!("Challenge search results for \"{keyword}\""),
            results
                .iter()
                .enumerate()
                .map(|(i, row)| challenge_row(i, row))
                .collect(),
            format!("No challenges found similar to \"{keyword}\""),
        )),
        Err(e) => storage_failure(e),
    }
}

pub(super) async fn handle_all(ctx: &CommandContext<'_>) -> Reply {
    match ctx.store.list_challenges().await {
        Ok(all) => Reply::Pages(PagedReply::new(
            "All Challenges",
            all.iter()
                .enumerate()
                .map(|(i, row)| tiered_row(i, row))
                .collect(),
            "No challenges exist yet.",
        )),
        Err(e) => storage_failure(e),
    }
}
