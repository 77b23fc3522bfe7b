//! Outbound Bot API calls: send, edit, button acknowledgement, command menu.

use super::types::{TgResponse, TgSentMessage};
use super::{TelegramChannel, MAX_MESSAGE_LEN};
use questlog_core::{error::QuestError, pager::PageAction};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Commands shown in the Telegram autocomplete menu.
const MENU: &[(&str, &str)] = &[
    ("help", "Show available commands"),
    ("add_challenge", "Add challenges: names, points"),
    ("delete_challenge", "Delete a challenge"),
    ("all_challenges", "List every challenge"),
    ("search", "Find challenges by keyword"),
    ("complete", "Mark challenges as done"),
    ("remaining", "Challenges you have not done"),
    ("random_challenge", "Pick a random unfinished challenge"),
    ("user_stats", "Points and completed challenges"),
    ("leaderboard", "Top players by points"),
    ("progress", "Compare progress between users"),
];

/// Inline keyboard with Previous/Next buttons.
pub(crate) fn pager_keyboard() -> Value {
    json!({
        "inline_keyboard": [[
            { "text": "◀️ Previous", "callback_data": PageAction::Previous.as_token() },
            { "text": "Next ▶️", "callback_data": PageAction::Next.as_token() },
        ]]
    })
}

impl TelegramChannel {
    /// Send text to a chat, split to fit Telegram's limit.
    ///
    /// With `pager`, the keyboard goes on the last chunk. Returns the id of
    /// the last message sent.
    pub(crate) async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        pager: bool,
    ) -> Result<Option<i64>, QuestError> {
        let chunks = split_message(text, MAX_MESSAGE_LEN);
        let last = chunks.len().saturating_sub(1);
        let mut sent_id = None;

        for (i, chunk) in chunks.into_iter().enumerate() {
            let mut body = json!({
                "chat_id": chat_id,
                "text": chunk,
            });
            if pager && i == last {
                body["reply_markup"] = pager_keyboard();
            }
            sent_id = self.call_with_markdown("sendMessage", body).await?;
        }

        Ok(sent_id)
    }

    /// Replace the text of a sent message. Without `pager` the keyboard is removed.
    pub(crate) async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        pager: bool,
    ) -> Result<(), QuestError> {
        let text = split_message(text, MAX_MESSAGE_LEN)
            .into_iter()
            .next()
            .unwrap_or_default();
        let mut body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
        });
        if pager {
            body["reply_markup"] = pager_keyboard();
        }
        self.call_with_markdown("editMessageText", body).await?;
        Ok(())
    }

    /// Stop the client-side spinner on a pressed button.
    pub(crate) async fn answer_callback(&self, callback_id: &str) -> Result<(), QuestError> {
        let url = format!("{}/answerCallbackQuery", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&json!({ "callback_query_id": callback_id }))
            .send()
            .await
            .map_err(|e| QuestError::Channel(format!("telegram answerCallbackQuery failed: {e}")))?;
        let status = resp.status();
        let raw = resp.text().await.unwrap_or_default();
        check_response("answerCallbackQuery", status, &raw)?;
        Ok(())
    }

    /// Post `body` with Markdown parsing; on an entity parse error, retry as
    /// plain text. Returns the message id when the API reports one.
    async fn call_with_markdown(
        &self,
        method: &str,
        mut body: Value,
    ) -> Result<Option<i64>, QuestError> {
        let url = format!("{}/{method}", self.base_url);
        body["parse_mode"] = json!("Markdown");

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| QuestError::Channel(format!("telegram {method} failed: {e}")))?;

        let status = resp.status();
        let raw = resp.text().await.unwrap_or_default();

        if !status.is_success() && raw.contains("can't parse entities") {
            debug!("Markdown parse failed, retrying as plain text");
            if let Some(obj) = body.as_object_mut() {
                obj.remove("parse_mode");
            }
            let resp = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| QuestError::Channel(format!("telegram {method} (plain) failed: {e}")))?;
            let status = resp.status();
            let raw = resp.text().await.unwrap_or_default();
            return check_response(method, status, &raw);
        }

        check_response(method, status, &raw)
    }

    /// Register bot commands with Telegram so users see an autocomplete menu.
    /// Best-effort: logs failures but does not propagate errors.
    pub(crate) async fn register_commands(&self) {
        let commands: Vec<Value> = MENU
            .iter()
            .map(|(command, description)| json!({ "command": command, "description": description }))
            .collect();

        let url = format!("{}/setMyCommands", self.base_url);
        match self
            .client
            .post(&url)
            .json(&json!({ "commands": commands }))
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                info!("registered Telegram bot commands");
            }
            Ok(resp) => {
                let body = resp.text().await.unwrap_or_default();
                warn!("failed to register Telegram bot commands: {body}");
            }
            Err(e) => {
                warn!("failed to register Telegram bot commands: {e}");
            }
        }
    }
}

/// Turn a Bot API reply into the sent message id or an error.
///
/// Editing a message to identical content is reported by Telegram as a 400;
/// that one is not a failure.
pub(crate) fn check_response(
    method: &str,
    status: StatusCode,
    raw: &str,
) -> Result<Option<i64>, QuestError> {
    if status.is_success() {
        return Ok(sent_message_id(raw));
    }
    if raw.contains("message is not modified") {
        debug!("telegram {method}: message unchanged");
        return Ok(None);
    }
    Err(QuestError::Channel(format!(
        "telegram {method} got {status}: {raw}"
    )))
}

/// Extract `result.message_id` from a send/edit response body.
///
/// `editMessageText` returns the edited message too; inline edits return `true`.
pub(crate) fn sent_message_id(raw: &str) -> Option<i64> {
    serde_json::from_str::<TgResponse<TgSentMessage>>(raw)
        .ok()
        .filter(|r| r.ok)
        .and_then(|r| r.result)
        .map(|m| m.message_id)
}

/// Split a long message into chunks that respect Telegram's limit.
///
/// Breaks after the last newline inside the window when there is one, and
/// never inside a UTF-8 character.
pub(crate) fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    if text.len() <= max_len {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let break_at = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .map(|i| start + i + 1)
                .unwrap_or(end)
        } else {
            end
        };
        chunks.push(&text[start..break_at]);
        start = break_at;
    }

    chunks
}
