//! Change Feeds
//!
//! Row-change events delivered by a backend for one table and filter.
//! A feed owns its registration: dropping or closing it releases the
//! underlying subscription exactly once.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use super::query::Filter;
use crate::domain::Table;
use crate::error::BackendResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub table: Table,
    pub record: Option<Value>,
    pub old_record: Option<Value>,
}

impl ChangeEvent {
    /// Whether the new or old row satisfies `filter`
    pub fn concerns(&self, filter: &Filter) -> bool {
        self.record.as_ref().map(|r| filter.matches(r)).unwrap_or(false)
            || self.old_record.as_ref().map(|r| filter.matches(r)).unwrap_or(false)
    }
}

pub type ChangeSender = mpsc::UnboundedSender<ChangeEvent>;

/// Receiving end of a change subscription
pub struct ChangeFeed {
    events: mpsc::UnboundedReceiver<ChangeEvent>,
    on_close: Option<Box<dyn FnOnce()>>,
}

impl ChangeFeed {
    /// A feed plus the sender a backend pushes events into
    pub fn channel() -> (ChangeSender, ChangeFeed) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            tx,
            ChangeFeed {
                events: rx,
                on_close: None,
            },
        )
    }

    /// Run `release` when the feed is closed or dropped
    pub fn on_close(mut self, release: impl FnOnce() + 'static) -> Self {
        self.on_close = Some(Box::new(release));
        self
    }

    /// Next event, or `None` once the feed is closed
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    pub fn close(&mut self) {
        self.events.close();
        if let Some(release) = self.on_close.take() {
            release();
        }
    }
}

impl fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("closed", &self.events.is_closed())
            .field("releases", &self.on_close.is_some())
            .finish()
    }
}

impl Drop for ChangeFeed {
    fn drop(&mut self) {
        self.close();
    }
}

/// Push-based realtime transport the hosted backend delegates to
pub trait ChangeSource {
    fn subscribe(
        &self,
        table: Table,
        filter: &Filter,
        access_token: Option<String>,
    ) -> BackendResult<ChangeFeed>;
}
