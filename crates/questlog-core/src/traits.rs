use crate::{
    error::QuestError,
    message::{ButtonPress, Incoming, OutgoingMessage},
};
use async_trait::async_trait;

/// Messaging Channel trait.
///
/// Every messaging platform implements this trait to receive commands and
/// button presses and to send and edit replies.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Start listening for incoming events.
    /// Returns a receiver that yields messages and button presses.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<Incoming>, QuestError>;

    /// Send a message. Returns the platform id of the sent message when the
    /// platform reports one (needed to edit it later).
    async fn send(&self, message: OutgoingMessage) -> Result<Option<String>, QuestError>;

    /// Replace the content of a previously sent message.
    async fn edit(&self, message_ref: &str, message: OutgoingMessage) -> Result<(), QuestError>;

    /// Acknowledge a button press so the client stops its spinner.
    async fn acknowledge(&self, _press: &ButtonPress) -> Result<(), QuestError> {
        Ok(())
    }

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), QuestError>;
}
