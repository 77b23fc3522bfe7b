//! Gateway: the main event loop connecting channels to commands.
//!
//! Each incoming event runs on its own task. Paged replies get a pager
//! session that lives until its idle timeout; see `pages`.

mod pages;


use crate::commands::{self, Command, CommandContext};
use pages::{Session, SessionKey};
use questlog_core::{
    config::{PagerConfig, SearchConfig},
    message::{Incoming, IncomingMessage, OutgoingMessage},
    traits::Channel,
};
use questlog_store::Store;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

/// How long shutdown waits for each pager session to close its message.
const SESSION_CLOSE_GRACE: Duration = Duration::from_secs(5);

/// The central gateway that routes events between channels and the store.
pub struct Gateway {
    pub(super) channels: HashMap<String, Arc<dyn Channel>>,
    pub(super) store: Store,
    pub(super) pager: PagerConfig,
    pub(super) search: SearchConfig,
    /// Live pager sessions, one per paged message.
    pub(super) sessions: Mutex<HashMap<SessionKey, Session>>,
}

impl Gateway {
    /// Create a new gateway.
    pub fn new(
        channels: HashMap<String, Arc<dyn Channel>>,
        store: Store,
        pager: PagerConfig,
        search: SearchConfig,
    ) -> Self {
        Self {
            channels,
            store,
            pager,
            search,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Run the main event loop.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        info!(
            "Questlog gateway running | channels: {} | page size: {} | idle timeout: {}s",
            self.channels.keys().cloned().collect::<Vec<_>>().join(", "),
            self.pager.page_size,
            self.pager.idle_timeout_secs,
        );

        let (tx, mut rx) = mpsc::channel::<Incoming>(256);

        for (name, channel) in &self.channels {
            let mut channel_rx = channel
                .start()
                .await
                .map_err(|e| anyhow::anyhow!("failed to start channel {name}: {e}"))?;
            let tx = tx.clone();
            let channel_name = name.clone();

            tokio::spawn(async move {
                while let Some(event) = channel_rx.recv().await {
                    if tx.send(event).await.is_err() {
                        info!("gateway receiver dropped, stopping {channel_name} forwarder");
                        break;
                    }
                }
            });

            info!("Channel started: {name}");
        }

        drop(tx);

        // Main event loop with graceful shutdown.
        loop {
            tokio::select! {
                Some(incoming) = rx.recv() => {
                    let gw = self.clone();
                    tokio::spawn(async move {
                        gw.dispatch(incoming).await;
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    pub(super) async fn dispatch(self: Arc<Self>, incoming: Incoming) {
        match incoming {
            Incoming::Message(msg) => self.handle_message(msg).await,
            Incoming::Button(press) => self.handle_button(press).await,
        }
    }

    /// Run a command message and deliver its reply.
    async fn handle_message(self: Arc<Self>, msg: IncomingMessage) {
        let display_name = msg.display_name();
        if let Err(e) = self
            .store
            .remember_member(&msg.sender_id, &display_name, msg.sender_username.as_deref())
            .await
        {
            warn!("failed to remember member {}: {e}", msg.sender_id);
        }

        let Some(cmd) = Command::parse(&msg.text) else {
            debug!("ignoring non-command message from {}", msg.sender_id);
            return;
        };
        info!("[{}] {} ran {cmd:?}", msg.channel, msg.sender_id);

        let ctx = CommandContext {
            store: &self.store,
            sender_id: &msg.sender_id,
            sender_name: &display_name,
            is_admin: msg.is_admin,
            text: &msg.text,
            search: &self.search,
        };
        let reply = commands::handle(cmd, &ctx).await;
        self.deliver(&msg, reply).await;
    }

    /// Graceful shutdown: close pager sessions, stop channels.
    async fn shutdown(&self) {
        info!("Shutting down...");

        // Dropping each session's input ends it; it then removes its keyboard.
        let tasks: Vec<_> = self
            .sessions
            .lock()
            .await
            .drain()
            .map(|(_, session)| session.task)
            .collect();
        for task in tasks {
            if tokio::time::timeout(SESSION_CLOSE_GRACE, task).await.is_err() {
                warn!("pager session did not close in time");
            }
        }

        // Stop all channels.
        for (name, channel) in &self.channels {
            if let Err(e) = channel.stop().await {
                warn!("failed to stop channel {name}: {e}");
            }
        }

        info!("Shutdown complete.");
    }

    /// Send a plain text message back to the sender's chat.
    pub(super) async fn send_text(&self, incoming: &IncomingMessage, text: &str) {
        let msg = OutgoingMessage::text(text, incoming.reply_target.clone());

        if let Some(channel) = self.channels.get(&incoming.channel) {
            if let Err(e) = channel.send(msg).await {
                error!("failed to send message: {e}");
            }
        }
    }
}
