use serde::{Deserialize, Serialize};

/// Channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelConfig {
    pub telegram: Option<TelegramConfig>,
}

/// Telegram bot config.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bot_token: String,
    /// Users allowed to talk to the bot. Empty = allow all.
    #[serde(default)]
    pub allowed_users: Vec<i64>,
    /// Users allowed to delete challenges. Empty = anyone.
    #[serde(default)]
    pub admin_users: Vec<i64>,
}

impl TelegramConfig {
    pub fn is_allowed(&self, user_id: i64) -> bool {
        self.allowed_users.is_empty() || self.allowed_users.contains(&user_id)
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_users.is_empty() || self.admin_users.contains(&user_id)
    }
}
