mod channels;
mod defaults;

#[cfg(test)]
mod tests;

pub use channels::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::QuestError;
use crate::pager::PagePolicy;
use defaults::*;

/// Environment variable consulted when the Telegram token is left empty.
pub const TELEGRAM_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Top-level questlog configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub questlog: QuestlogConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub pager: PagerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    /// File the settings came from; `None` when running on defaults.
    #[serde(skip)]
    pub loaded_from: Option<PathBuf>,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestlogConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for QuestlogConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Database location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Paged reply settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagerConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// How long a paged message accepts Previous/Next presses after the last one.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default)]
    pub policy: PagePolicy,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            idle_timeout_secs: default_idle_timeout_secs(),
            policy: PagePolicy::default(),
        }
    }
}

/// Fuzzy search tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Minimum similarity (0-100) a name needs to show up in results.
    #[serde(default = "default_min_score")]
    pub min_score: u8,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            limit: default_search_limit(),
        }
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist; `loaded_from` tells
/// which happened, since this runs before logging is set up. An empty
/// Telegram token is filled from `TELEGRAM_BOT_TOKEN` when that variable is set.
pub fn load(path: &str) -> Result<Config, QuestError> {
    let path = Path::new(path);
    let mut config = if !path.exists() {
        Config::default()
    } else {
        let content = std::fs::read_to_string(path).map_err(|e| {
            QuestError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let mut config = parse(&content)?;
        config.loaded_from = Some(path.to_path_buf());
        config
    };

    if let Ok(token) = std::env::var(TELEGRAM_TOKEN_ENV) {
        apply_token_override(&mut config, &token);
    }

    config.validate()?;
    Ok(config)
}

/// Parse configuration from TOML text.
pub fn parse(content: &str) -> Result<Config, QuestError> {
    toml::from_str(content).map_err(|e| QuestError::Config(format!("failed to parse config: {e}")))
}

fn apply_token_override(config: &mut Config, token: &str) {
    if token.is_empty() {
        return;
    }
    let tg = config
        .channel
        .telegram
        .get_or_insert_with(TelegramConfig::default);
    if tg.bot_token.is_empty() {
        tg.bot_token = token.to_string();
    }
}

impl Config {
    /// Reject settings that would make the bot misbehave at runtime.
    pub fn validate(&self) -> Result<(), QuestError> {
        if self.pager.page_size == 0 {
            return Err(QuestError::Config("pager.page_size must be at least 1".into()));
        }
        if self.pager.idle_timeout_secs == 0 {
            return Err(QuestError::Config(
                "pager.idle_timeout_secs must be at least 1".into(),
            ));
        }
        if self.search.min_score > 100 {
            return Err(QuestError::Config(
                "search.min_score must be between 0 and 100".into(),
            ));
        }
        if self.search.limit == 0 {
            return Err(QuestError::Config("search.limit must be at least 1".into()));
        }
        Ok(())
    }
}
