//! Per-user commands: complete, remaining, random pick, stats, leaderboard, progress.

use super::challenges::tiered_row;
use super::{split_handle, storage_failure, CommandContext, PagedReply, Reply};
use questlog_core::validate::parse_name_list;
use questlog_store::{CompleteOutcome, ProgressOutcome};
use tracing::warn;

/// Traffic light for the share of all points a user has earned.
pub(super) fn progress_light(ratio: f64) -> &'static str {
    if ratio >= 0.5 {
        "🟢"
    } else if ratio >= 0.25 {
        "🟡"
    } else {
        "🔴"
    }
}

/// Medal for a leaderboard position (1-based).
pub(super) fn rank_emoji(rank: usize) -> &'static str {
    match rank {
        1 => "👑",
        2 => "🥈",
        3 => "🥉",
        _ => "⭐",
    }
}

/// Optional user argument: empty means the sender.
fn who(args: &str) -> Option<&str> {
    Some(args.trim()).filter(|a| !a.is_empty())
}

/// Split a trailing `detail` flag off the arguments.
pub(super) fn split_detail(args: &str) -> (&str, bool) {
    let args = args.trim();
    let (head, last) = match args.rsplit_once(char::is_whitespace) {
        Some((head, last)) => (head.trim_end(), last),
        None => ("", args),
    };
    if matches!(last.to_lowercase().as_str(), "detail" | "details" | "true") {
        (head, true)
    } else {
        (args, false)
    }
}

pub(super) async fn handle_complete(ctx: &CommandContext<'_>) -> Reply {
    let (handle, rest) = split_handle(ctx.args());
    let target = match ctx.resolve(handle).await {
        Ok(t) => t,
        Err(reply) => return reply,
    };
    let Ok(names) = parse_name_list(rest) else {
        return Reply::Text("No challenges provided.".to_string());
    };

    let mut report = ctx.store.complete_challenges(&target.user_id, &names).await;
    if report.items.is_empty() {
        if let Some(e) = report.failure.take() {
            return storage_failure(e);
        }
    }
    let mut total = None;
    let rows = report
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let (emoji, status) = match item.status {
                CompleteOutcome::Completed { total_points } => {
                    total = Some(total_points);
                    ("✅", "completed")
                }
                CompleteOutcome::AlreadyCompleted => ("❌", "already completed"),
                CompleteOutcome::NotFound => ("❌", "not found"),
            };
            format!("{}. {emoji} *{}* {status}", i + 1, item.name)
        })
        .collect();

    let title = if target.user_id == ctx.sender_id {
        "Completed Challenges".to_string()
    } else {
        format!("Completed Challenges for {}", target.name)
    };
    let mut reply = PagedReply::new(title, rows, "No challenges were processed.");
    if let Some(e) = report.failure {
        warn!("complete stopped early: {e}");
        reply = reply.with_note("⚠️ Stopped early: something went wrong.");
    } else if let Some(total) = total {
        reply = reply.with_note(format!("🏆 {} now has {total} points.", target.name));
    }
    Reply::Pages(reply)
}

pub(super) async fn handle_remaining(ctx: &CommandContext<'_>) -> Reply {
    let target = match ctx.resolve(who(ctx.args())).await {
        Ok(t) => t,
        Err(reply) => return reply,
    };
    match ctx.store.remaining(&target.user_id).await {
        Ok(rows) => Reply::Pages(PagedReply::new(
            format!("Remaining challenges for {}", target.name),
            rows.iter()
                .enumerate()
                .map(|(i, row)| tiered_row(i, row))
                .collect(),
            format!("{} has completed all challenges.", target.name),
        )),
        Err(e) => storage_failure(e),
    }
}

pub(super) async fn handle_random(ctx: &CommandContext<'_>) -> Reply {
    let target = match ctx.resolve(who(ctx.args())).await {
        Ok(t) => t,
        Err(reply) => return reply,
    };
    match ctx.store.random_remaining(&target.user_id).await {
        Ok(Some(pick)) => Reply::Text(format!(
            "🎲 *A random challenge for {}*\n\n\
             Challenge: *{}*\n\
             Points: `{}`\n\
             Remaining Challenges: `{}`",
            target.name, pick.challenge.name, pick.challenge.points, pick.remaining_after
        )),
        Ok(None) => Reply::Text(format!("{} has completed all challenges.", target.name)),
        Err(e) => storage_failure(e),
    }
}

pub(super) async fn handle_user_stats(ctx: &CommandContext<'_>) -> Reply {
    let (handle, detail) = split_detail(ctx.args());
    let target = match ctx.resolve(who(handle)).await {
        Ok(t) => t,
        Err(reply) => return reply,
    };

    let stats = match ctx.store.user_stats(&target.user_id).await {
        Ok(s) => s,
        Err(e) => return storage_failure(e),
    };

    let title = format!("{}'s Stats", target.name);
    let mut summary = format!(
        "Total Points: {} 🏆\nCompleted Challenges: {} 🏁",
        stats.total_points,
        stats.completed.len()
    );
    if stats.available_points > 0 {
        let ratio = stats.completion_ratio();
        summary.push_str(&format!(
            "\nProgress: {} {:.0}% of all points",
            progress_light(ratio),
            ratio * 100.0
        ));
    }

    let Some(ref recent) = stats.most_recent else {
        return Reply::Text(format!(
            "*{title}*\n\n{summary}\n\nNo completed challenges 🙁"
        ));
    };
    summary.push_str(&format!(
        "\nMost Recent Challenge Completed: {} ({} points) 🎉",
        recent.name, recent.points
    ));

    if !detail {
        return Reply::Text(format!("*{title}*\n\n{summary}"));
    }

    let rows = stats
        .completed
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {} ({} points)", i + 1, c.name, c.points))
        .collect();
    Reply::Pages(
        PagedReply::new(title, rows, "No completed challenges 🙁").with_note(summary),
    )
}

pub(super) async fn handle_leaderboard(ctx: &CommandContext<'_>) -> Reply {
    let board = match ctx.store.leaderboard().await {
        Ok(b) => b,
        Err(e) => return storage_failure(e),
    };

    let mut rows = Vec::with_capacity(board.len());
    for (i, entry) in board.iter().enumerate() {
        let name = ctx.name_of(&entry.user_id).await;
        rows.push(format!(
            "{} *{name}*: {} points",
            rank_emoji(i + 1),
            entry.total_points
        ));
    }
    Reply::Pages(PagedReply::new(
        "Leaderboard",
        rows,
        "The leaderboard is empty.",
    ))
}

pub(super) async fn handle_progress(ctx: &CommandContext<'_>) -> Reply {
    let handles: Vec<&str> = ctx.args().split_whitespace().collect();
    let mut targets = Vec::with_capacity(handles.len().max(1));
    if handles.is_empty() {
        targets.push(ctx.sender());
    }
    for handle in handles {
        match ctx.resolve(Some(handle)).await {
            Ok(t) => targets.push(t),
            Err(reply) => return reply,
        }
    }

    let ids: Vec<String> = targets.iter().map(|t| t.user_id.clone()).collect();
    let report = match ctx.store.progress_report(&ids).await {
        Ok(r) => r,
        Err(e) => return storage_failure(e),
    };
    let name_of = |user_id: &str| {
        targets
            .iter()
            .find(|t| t.user_id == user_id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| user_id.to_string())
    };

    let mut out = String::from("*Progress Report*\n");
    for entry in &report.entries {
        out.push_str(&format!(
            "\n*{}*\n🏅 {} pts\n🎯 {}/{} challenges\n📈 {} %\n",
            name_of(&entry.user_id),
            entry.total_points,
            entry.completed_count,
            report.total_challenges,
            entry.percent
        ));
    }

    match report.outcome {
        ProgressOutcome::Solo => {}
        ProgressOutcome::Tie => out.push_str("\nResult: It's a tie!"),
        ProgressOutcome::Winner(ref user_id) => {
            if let Some(winner) = report.entries.iter().find(|e| &e.user_id == user_id) {
                out.push_str(&format!(
                    "\n🏆 Winner: *{}*\n🏅 {} pts\n🎯 {}/{} challenges",
                    name_of(user_id),
                    winner.total_points,
                    winner.completed_count,
                    report.total_challenges
                ));
            }
        }
    }
    Reply::Text(out.trim_end().to_string())
}
