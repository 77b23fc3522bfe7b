//! Paged replies: first render, live sessions, and button routing.

use super::Gateway;
use crate::commands::{PagedReply, Reply};
use async_trait::async_trait;
use questlog_core::{
    error::QuestError,
    message::{ButtonPress, IncomingMessage, OutgoingMessage},
    pager::{self, Page, PageInput, PageSink, Paginator},
    traits::Channel,
};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Buffered paging inputs per session; presses beyond this are dropped.
const SESSION_INPUT_BUFFER: usize = 16;

/// Identifies a paged message: channel, chat, platform message id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct SessionKey {
    pub channel: String,
    pub chat: String,
    pub message: String,
}

/// A live pager session.
pub(crate) struct Session {
    pub input: mpsc::Sender<PageInput>,
    pub task: JoinHandle<()>,
}

/// Renders pages by editing the paged message in place.
struct ChannelPageSink {
    channel: Arc<dyn Channel>,
    chat: String,
    message_ref: String,
    reply: PagedReply,
}

impl ChannelPageSink {
    async fn render(&self, page: Page<'_, String>, pager: bool) -> Result<(), QuestError> {
        let msg = OutgoingMessage {
            text: self.reply.render(&page),
            reply_target: Some(self.chat.clone()),
            pager,
        };
        self.channel.edit(&self.message_ref, msg).await
    }
}

#[async_trait]
impl PageSink for ChannelPageSink {
    async fn show(&mut self, page: Page<'_, String>) -> Result<(), QuestError> {
        self.render(page, true).await
    }

    async fn close(&mut self, page: Page<'_, String>) -> Result<(), QuestError> {
        self.render(page, false).await
    }
}

impl Gateway {
    /// Send a command reply. Multi-page replies start a pager session.
    pub(super) async fn deliver(self: &Arc<Self>, incoming: &IncomingMessage, reply: Reply) {
        let mut paged = match reply {
            Reply::Text(text) => return self.send_text(incoming, &text).await,
            Reply::Pages(paged) => paged,
        };

        let page_size = NonZeroUsize::new(self.pager.page_size).unwrap_or(NonZeroUsize::MIN);
        let rows = std::mem::take(&mut paged.rows);
        let Some(paginator) = Paginator::new(rows, page_size, self.pager.policy) else {
            return self.send_text(incoming, &paged.empty).await;
        };

        let first = paged.render(&paginator.current_page());
        if paginator.total_pages() == 1 {
            return self.send_text(incoming, &first).await;
        }

        let Some(channel) = self.channels.get(&incoming.channel).cloned() else {
            return;
        };
        let Some(chat) = incoming.reply_target.clone() else {
            warn!("paged reply without a reply target, dropping");
            return;
        };
        let sent = channel
            .send(OutgoingMessage {
                text: first,
                reply_target: Some(chat.clone()),
                pager: true,
            })
            .await;
        let message_ref = match sent {
            Ok(Some(message_ref)) => message_ref,
            Ok(None) => {
                warn!("channel returned no message id, paging disabled for this reply");
                return;
            }
            Err(e) => {
                warn!("failed to send paged reply: {e}");
                return;
            }
        };

        let key = SessionKey {
            channel: incoming.channel.clone(),
            chat: chat.clone(),
            message: message_ref.clone(),
        };
        let sink = ChannelPageSink {
            channel,
            chat,
            message_ref,
            reply: paged,
        };
        self.start_session(key, incoming.sender_id.clone(), paginator, sink)
            .await;
    }

    async fn start_session(
        self: &Arc<Self>,
        key: SessionKey,
        requester: String,
        paginator: Paginator<String>,
        mut sink: ChannelPageSink,
    ) {
        let (input, inputs) = mpsc::channel(SESSION_INPUT_BUFFER);
        let idle = Duration::from_secs(self.pager.idle_timeout_secs);
        let gw = self.clone();
        let task_key = key.clone();

        info!(
            "pager session started for {requester} ({} pages)",
            paginator.total_pages()
        );
        let task = tokio::spawn(async move {
            match pager::drive(paginator, &requester, inputs, idle, &mut sink).await {
                Ok(end) => debug!("pager session for {requester} ended: {end:?}"),
                Err(e) => warn!("pager session for {requester} failed: {e}"),
            }
            gw.sessions.lock().await.remove(&task_key);
        });

        self.sessions.lock().await.insert(key, Session { input, task });
    }

    /// Route a Previous/Next press to its session.
    pub(super) async fn handle_button(self: Arc<Self>, press: ButtonPress) {
        if let Some(channel) = self.channels.get(&press.channel) {
            if let Err(e) = channel.acknowledge(&press).await {
                debug!("failed to acknowledge button press: {e}");
            }
        }

        let key = SessionKey {
            channel: press.channel.clone(),
            chat: press.reply_target.clone(),
            message: press.message_ref.clone(),
        };
        let sessions = self.sessions.lock().await;
        let Some(session) = sessions.get(&key) else {
            debug!("button press on {key:?} with no live session");
            return;
        };
        let input = PageInput {
            sender_id: press.sender_id,
            action: press.action,
        };
        if let Err(e) = session.input.try_send(input) {
            debug!("dropping page input for {key:?}: {e}");
        }
    }
}
