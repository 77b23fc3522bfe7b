//! Long-polling update loop and Channel trait implementation.

use super::types::{TgResponse, TgUpdate};
use super::TelegramChannel;
use async_trait::async_trait;
use questlog_core::{
    config::TelegramConfig,
    error::QuestError,
    message::{ButtonPress, Incoming, IncomingMessage, OutgoingMessage},
    pager::PageAction,
    traits::Channel,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<mpsc::Receiver<Incoming>, QuestError> {
        self.register_commands().await;

        let (tx, rx) = mpsc::channel(64);
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let config = self.config.clone();
        let last_update_id = self.last_update_id.clone();

        info!("Telegram channel starting long polling...");

        tokio::spawn(async move {
            let mut backoff_secs: u64 = 1;

            loop {
                let last = last_update_id.lock().await;
                let offset = last.map(|id| id + 1);
                drop(last);

                let mut url = format!("{base_url}/getUpdates?timeout=30");
                if let Some(off) = offset {
                    url.push_str(&format!("&offset={off}"));
                }

                let resp = match client
                    .get(&url)
                    .timeout(std::time::Duration::from_secs(35))
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        error!("telegram poll error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                let body: TgResponse<Vec<TgUpdate>> = match resp.json().await {
                    Ok(b) => b,
                    Err(e) => {
                        error!("telegram parse error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                if !body.ok {
                    error!(
                        "telegram API error (retry in {backoff_secs}s): {}",
                        body.description.unwrap_or_default()
                    );
                    tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                    backoff_secs = (backoff_secs * 2).min(60);
                    continue;
                }

                // Successful poll -- reset backoff.
                backoff_secs = 1;

                let updates = body.result.unwrap_or_default();

                if let Some(last_update) = updates.last() {
                    *last_update_id.lock().await = Some(last_update.update_id);
                }

                for update in updates {
                    let Some(incoming) = to_incoming(update, &config) else {
                        continue;
                    };
                    if tx.send(incoming).await.is_err() {
                        info!("telegram channel receiver dropped, stopping poll");
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<Option<String>, QuestError> {
        let chat_id = chat_id_of(&message)?;
        let sent = self.send_text(chat_id, &message.text, message.pager).await?;
        Ok(sent.map(|id| id.to_string()))
    }

    async fn edit(&self, message_ref: &str, message: OutgoingMessage) -> Result<(), QuestError> {
        let chat_id = chat_id_of(&message)?;
        let message_id: i64 = message_ref.parse().map_err(|e| {
            QuestError::Channel(format!("invalid telegram message_id '{message_ref}': {e}"))
        })?;
        self.edit_text(chat_id, message_id, &message.text, message.pager)
            .await
    }

    async fn acknowledge(&self, press: &ButtonPress) -> Result<(), QuestError> {
        self.answer_callback(&press.callback_id).await
    }

    async fn stop(&self) -> Result<(), QuestError> {
        info!("Telegram channel stopped");
        Ok(())
    }
}

fn chat_id_of(message: &OutgoingMessage) -> Result<i64, QuestError> {
    let target = message
        .reply_target
        .as_deref()
        .ok_or_else(|| QuestError::Channel("no reply_target on outgoing message".into()))?;
    target
        .parse()
        .map_err(|e| QuestError::Channel(format!("invalid telegram chat_id '{target}': {e}")))
}

/// Turn a raw update into a gateway event, dropping what the bot ignores:
/// non-text messages, unauthorized senders, and unknown button data.
pub(super) fn to_incoming(update: TgUpdate, config: &TelegramConfig) -> Option<Incoming> {
    if let Some(query) = update.callback_query {
        if !config.is_allowed(query.from.id) {
            warn!("ignoring button press from unauthorized user {}", query.from.id);
            return None;
        }
        let Some(action) = query.data.as_deref().and_then(PageAction::from_token) else {
            debug!("telegram: ignoring callback data {:?}", query.data);
            return None;
        };
        let message = query.message?;
        return Some(Incoming::Button(ButtonPress {
            channel: "telegram".to_string(),
            callback_id: query.id,
            sender_id: query.from.id.to_string(),
            reply_target: message.chat.id.to_string(),
            message_ref: message.message_id.to_string(),
            action,
        }));
    }

    let msg = update.message?;
    let text = msg.text?;
    let user = msg.from?;

    // Auth check.
    if !config.is_allowed(user.id) {
        warn!("ignoring message from unauthorized user {}", user.id);
        return None;
    }

    Some(Incoming::Message(IncomingMessage {
        id: Uuid::new_v4(),
        channel: "telegram".to_string(),
        sender_id: user.id.to_string(),
        sender_name: Some(user.full_name()),
        sender_username: user.username.clone(),
        text,
        timestamp: chrono::Utc::now(),
        reply_target: Some(msg.chat.id.to_string()),
        is_admin: config.is_admin(user.id),
    }))
}
