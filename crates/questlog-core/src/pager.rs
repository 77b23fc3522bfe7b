//! Page windowing over ordered result rows, and the session driver that
//! moves a rendered page in response to Previous/Next input.
//!
//! The [`Paginator`] is a pure state machine: states are page indices
//! `0..total_pages`, transitions are [`PageAction`]s. An empty row set has
//! no paginator at all; callers render an empty-state message instead.
//!
//! [`drive`] binds a paginator to one rendered message and one requester.
//! Input arrives over an mpsc channel so any transport can feed it.

use crate::error::QuestError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

/// What happens when paging past either end.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PagePolicy {
    /// Next on the last page goes to the first, Previous on the first goes to the last.
    #[default]
    Wrap,
    /// Stay put at either end.
    Clamp,
}

/// A paging request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageAction {
    Next,
    Previous,
}

impl PageAction {
    /// Wire token used in button payloads.
    pub fn as_token(self) -> &'static str {
        match self {
            Self::Next => "page:next",
            Self::Previous => "page:prev",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "page:next" => Some(Self::Next),
            "page:prev" => Some(Self::Previous),
            _ => None,
        }
    }
}

/// One window of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page<'a, T> {
    /// 0-based page index.
    pub index: usize,
    pub rows: &'a [T],
    pub total_pages: usize,
    /// Absolute position of `rows[0]` in the full sequence.
    pub offset: usize,
}

impl<T> Page<'_, T> {
    /// "Page 2 of 5".
    pub fn footer(&self) -> String {
        format!("Page {} of {}", self.index + 1, self.total_pages)
    }
}

/// Windowing state over a fixed, non-empty row sequence.
#[derive(Debug, Clone)]
pub struct Paginator<T> {
    rows: Vec<T>,
    page_size: NonZeroUsize,
    current: usize,
    policy: PagePolicy,
}

impl<T> Paginator<T> {
    /// Start at page 0. Returns `None` for an empty sequence.
    pub fn new(rows: Vec<T>, page_size: NonZeroUsize, policy: PagePolicy) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        Some(Self {
            rows,
            page_size,
            current: 0,
            policy,
        })
    }

    pub fn total_pages(&self) -> usize {
        self.rows.len().div_ceil(self.page_size.get())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false: an empty paginator cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn current_page(&self) -> Page<'_, T> {
        let start = self.current * self.page_size.get();
        let end = (start + self.page_size.get()).min(self.rows.len());
        Page {
            index: self.current,
            rows: &self.rows[start..end],
            total_pages: self.total_pages(),
            offset: start,
        }
    }

    /// Advance one page. Returns whether the page changed.
    pub fn next(&mut self) -> bool {
        let last = self.total_pages() - 1;
        let target = if self.current < last {
            self.current + 1
        } else {
            match self.policy {
                PagePolicy::Wrap => 0,
                PagePolicy::Clamp => last,
            }
        };
        self.move_to(target)
    }

    /// Go back one page. Returns whether the page changed.
    pub fn previous(&mut self) -> bool {
        let target = if self.current > 0 {
            self.current - 1
        } else {
            match self.policy {
                PagePolicy::Wrap => self.total_pages() - 1,
                PagePolicy::Clamp => 0,
            }
        };
        self.move_to(target)
    }

    pub fn apply(&mut self, action: PageAction) -> bool {
        match action {
            PageAction::Next => self.next(),
            PageAction::Previous => self.previous(),
        }
    }

    fn move_to(&mut self, target: usize) -> bool {
        let changed = target != self.current;
        self.current = target;
        changed
    }
}

/// A paging request from a specific user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInput {
    pub sender_id: String,
    pub action: PageAction,
}

/// Where a session renders its pages.
#[async_trait]
pub trait PageSink: Send {
    /// Re-render after the page changed.
    async fn show(&mut self, page: Page<'_, String>) -> Result<(), QuestError>;

    /// Final render once the session ends: same page, no paging controls.
    async fn close(&mut self, page: Page<'_, String>) -> Result<(), QuestError>;
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// No input from the requester within the idle window.
    TimedOut,
    /// The input channel was dropped.
    Closed,
}

/// Drive a paginator from `inputs` until `idle` passes without a valid input.
///
/// The first page is assumed to be rendered already. Inputs from anyone
/// other than `requester` are ignored and do not extend the deadline.
pub async fn drive<S>(
    mut paginator: Paginator<String>,
    requester: &str,
    mut inputs: mpsc::Receiver<PageInput>,
    idle: Duration,
    sink: &mut S,
) -> Result<SessionEnd, QuestError>
where
    S: PageSink + ?Sized,
{
    let mut deadline = Instant::now() + idle;
    loop {
        match tokio::time::timeout_at(deadline, inputs.recv()).await {
            Err(_) => {
                sink.close(paginator.current_page()).await?;
                return Ok(SessionEnd::TimedOut);
            }
            Ok(None) => {
                sink.close(paginator.current_page()).await?;
                return Ok(SessionEnd::Closed);
            }
            Ok(Some(input)) => {
                if input.sender_id != requester {
                    debug!(
                        "pager: ignoring input from {} (session owned by {requester})",
                        input.sender_id
                    );
                    continue;
                }
                deadline = Instant::now() + idle;
                if paginator.apply(input.action) {
                    sink.show(paginator.current_page()).await?;
                }
            }
        }
    }
}
