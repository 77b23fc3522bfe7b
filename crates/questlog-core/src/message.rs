use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pager::PageAction;

/// Anything a channel hands to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Incoming {
    /// A text message (possibly a command).
    Message(IncomingMessage),
    /// A Previous/Next press on a paged message.
    Button(ButtonPress),
}

/// An incoming message from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Channel name (e.g. "telegram").
    pub channel: String,
    /// Platform-specific user ID.
    pub sender_id: String,
    /// Human-readable sender name.
    pub sender_name: Option<String>,
    /// Platform handle without the leading `@`, when the user has one.
    #[serde(default)]
    pub sender_username: Option<String>,
    /// Message text content.
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Platform-specific target for routing the response (e.g. Telegram chat_id).
    #[serde(default)]
    pub reply_target: Option<String>,
    /// Whether the sender may run admin-only commands.
    #[serde(default)]
    pub is_admin: bool,
}

impl IncomingMessage {
    /// Name to show for the sender, falling back to the raw id.
    pub fn display_name(&self) -> String {
        self.sender_name
            .clone()
            .unwrap_or_else(|| self.sender_id.clone())
    }
}

/// A paging button press.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonPress {
    pub channel: String,
    /// Platform id of the acknowledgement handle (Telegram callback_query id).
    pub callback_id: String,
    /// Who pressed the button.
    pub sender_id: String,
    /// Chat the pressed message lives in.
    pub reply_target: String,
    /// Platform id of the pressed message.
    pub message_ref: String,
    pub action: PageAction,
}

/// An outgoing message to send back through a channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub text: String,
    /// Platform-specific target for routing (e.g. Telegram chat_id).
    #[serde(default)]
    pub reply_target: Option<String>,
    /// Attach Previous/Next controls.
    #[serde(default)]
    pub pager: bool,
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>, reply_target: Option<String>) -> Self {
        Self {
            text: text.into(),
            reply_target,
            pager: false,
        }
    }
}
