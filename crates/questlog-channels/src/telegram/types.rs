//! Telegram Bot API deserialization types.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct TgResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TgUpdate {
    pub update_id: i64,
    pub message: Option<TgMessage>,
    pub callback_query: Option<TgCallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TgMessage {
    pub message_id: i64,
    pub from: Option<TgUser>,
    pub chat: TgChat,
    pub text: Option<String>,
}

/// An inline keyboard button press.
#[derive(Debug, Deserialize)]
pub(crate) struct TgCallbackQuery {
    pub id: String,
    pub from: TgUser,
    /// The message the keyboard is attached to. Absent for very old messages.
    pub message: Option<TgMessage>,
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TgUser {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl TgUser {
    /// "First Last", or just the first name.
    pub fn full_name(&self) -> String {
        match self.last_name {
            Some(ref ln) if !ln.is_empty() => format!("{} {ln}", self.first_name),
            _ => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TgChat {
    pub id: i64,
}

/// Result of `sendMessage`; only the id is needed to edit it later.
#[derive(Debug, Deserialize)]
pub(crate) struct TgSentMessage {
    pub message_id: i64,
}
