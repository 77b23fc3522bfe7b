//! Bot commands: parse chat text, call the store, render replies.

mod challenges;
mod help;
mod progress;


use questlog_core::{config::SearchConfig, error::QuestError, pager::Page};
use questlog_store::Store;
use tracing::error;

/// Shown when the store fails; details go to the log.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again later.";

/// Grouped context for command execution.
pub struct CommandContext<'a> {
    pub store: &'a Store,
    pub sender_id: &'a str,
    pub sender_name: &'a str,
    pub is_admin: bool,
    pub text: &'a str,
    pub search: &'a SearchConfig,
}

impl CommandContext<'_> {
    /// Everything after the command word.
    pub fn args(&self) -> &str {
        let text = self.text.trim_start();
        match text.find(char::is_whitespace) {
            Some(i) => text[i..].trim(),
            None => "",
        }
    }
}

/// Known bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    AddChallenge,
    DeleteChallenge,
    Search,
    AllChallenges,
    UserStats,
    RandomChallenge,
    Complete,
    Leaderboard,
    Progress,
    Remaining,
    Help,
}

impl Command {
    /// Parse a command from message text.
    ///
    /// Accepts a `/` or `!` prefix, any letter case, and an `@botname` suffix.
    /// Returns `None` for ordinary chat and unknown commands.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        let word = first
            .strip_prefix('/')
            .or_else(|| first.strip_prefix('!'))?;
        // Strip @botname suffix (e.g. "/help@questlog_bot" → "help").
        let word = word.split('@').next().unwrap_or(word).to_lowercase();
        match word.as_str() {
            "add_challenge" | "newchallenge" => Some(Self::AddChallenge),
            "delete_challenge" | "removechallenge" | "discardchallenge" => {
                Some(Self::DeleteChallenge)
            }
            "search" | "findchallenge" => Some(Self::Search),
            "all_challenges" | "showallchallenges" => Some(Self::AllChallenges),
            "user_stats" | "getuserstats" => Some(Self::UserStats),
            "random_challenge" | "surpriseme" => Some(Self::RandomChallenge),
            "complete" | "finishchallenge" => Some(Self::Complete),
            "leaderboard" | "showrankings" => Some(Self::Leaderboard),
            "progress" | "checkprogress" => Some(Self::Progress),
            "remaining" | "pendingchallenges" => Some(Self::Remaining),
            "help" | "start" => Some(Self::Help),
            _ => None,
        }
    }
}

/// What a command hands back to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Pages(PagedReply),
}

/// Rows to show a page at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedReply {
    /// Heading shown above every page.
    pub title: String,
    /// Pre-formatted rows, numbered across the whole list.
    pub rows: Vec<String>,
    /// Sent instead when there are no rows.
    pub empty: String,
    /// Shown under the rows on every page.
    pub note: Option<String>,
}

impl PagedReply {
    pub fn new(title: impl Into<String>, rows: Vec<String>, empty: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows,
            empty: empty.into(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Text of one page.
    pub fn render(&self, page: &Page<'_, String>) -> String {
        let mut out = format!("*{}*\n\n", self.title);
        for row in page.rows {
            out.push_str(row);
            out.push('\n');
        }
        if let Some(ref note) = self.note {
            out.push('\n');
            out.push_str(note);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&page.footer());
        out
    }
}

/// A user a command acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Target {
    pub user_id: String,
    pub name: String,
}

impl CommandContext<'_> {
    fn sender(&self) -> Target {
        Target {
            user_id: self.sender_id.to_string(),
            name: self.sender_name.to_string(),
        }
    }

    /// Resolve `@handle` to a known member, or the sender when absent.
    async fn resolve(&self, handle: Option<&str>) -> Result<Target, Reply> {
        let Some(handle) = handle else {
            return Ok(self.sender());
        };
        match self.store.find_member(handle).await {
            Ok(Some(member)) => Ok(Target {
                user_id: member.user_id,
                name: member.display_name,
            }),
            Ok(None) => Err(Reply::Text(format!(
                "I don't know {handle} yet. They need to send me a message first."
            ))),
            Err(e) => Err(storage_failure(e)),
        }
    }

    /// Name to show for a user id: the member directory, else the raw id.
    async fn name_of(&self, user_id: &str) -> String {
        if user_id == self.sender_id {
            return self.sender_name.to_string();
        }
        match self.store.display_name(user_id).await {
            Ok(Some(name)) => name,
            Ok(None) => user_id.to_string(),
            Err(e) => {
                error!("display name lookup for {user_id} failed: {e}");
                user_id.to_string()
            }
        }
    }
}

/// Log a store failure and produce the user-facing reply.
pub(crate) fn storage_failure(e: QuestError) -> Reply {
    error!("command failed: {e}");
    Reply::Text(GENERIC_FAILURE.to_string())
}

/// Split a leading `@handle` off the arguments.
pub(crate) fn split_handle(args: &str) -> (Option<&str>, &str) {
    let args = args.trim();
    if !args.starts_with('@') {
        return (None, args);
    }
    match args.find(char::is_whitespace) {
        Some(i) => (Some(&args[..i]), args[i..].trim()),
        None => (Some(args), ""),
    }
}

/// Handle a command and return the reply.
pub async fn handle(cmd: Command, ctx: &CommandContext<'_>) -> Reply {
    match cmd {
        Command::AddChallenge => challenges::handle_add(ctx).await,
        Command::DeleteChallenge => challenges::handle_delete(ctx).await,
        Command::Search => challenges::handle_search(ctx).await,
        Command::AllChallenges => challenges::handle_all(ctx).await,
        Command::UserStats => progress::handle_user_stats(ctx).await,
        Command::RandomChallenge => progress::handle_random(ctx).await,
        Command::Complete => progress::handle_complete(ctx).await,
        Command::Leaderboard => progress::handle_leaderboard(ctx).await,
        Command::Progress => progress::handle_progress(ctx).await,
        Command::Remaining => progress::handle_remaining(ctx).await,
        Command::Help => Reply::Text(help::help_text()),
    }
}
