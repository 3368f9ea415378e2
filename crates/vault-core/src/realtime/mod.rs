//! Realtime Thread Subscription
//!
//! A live view of one memory's threads. Every change event on the memory
//! triggers a full re-fetch, so consumers only ever see complete ordered
//! snapshots. The subscription is an explicit object: callers pull
//! snapshots with `next_snapshot` and release it through `dispose`.

pub mod protocol;

use std::rc::Rc;
use std::sync::Arc;

use tokio::sync::watch;

use crate::api::{list_threads, ApiResponse};
use crate::domain::{Table, Thread};
use crate::error::BackendResult;
use crate::repository::{Backend, ChangeFeed, Filter};

/// Thread-safe disposer for a subscription; cloning shares the same switch
#[derive(Clone)]
pub struct DisposeHandle {
    switch: Arc<watch::Sender<bool>>,
}

impl DisposeHandle {
    fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { switch: Arc::new(tx) }, rx)
    }

    pub fn dispose(&self) {
        self.switch.send_replace(true);
    }

    pub fn is_disposed(&self) -> bool {
        *self.switch.borrow()
    }
}

pub struct ThreadSubscription {
    backend: Rc<dyn Backend>,
    memory_id: String,
    feed: ChangeFeed,
    handle: DisposeHandle,
    disposed: watch::Receiver<bool>,
}

impl ThreadSubscription {
    /// Register for thread changes on `memory_id`
    pub fn open(backend: Rc<dyn Backend>, memory_id: &str) -> BackendResult<Self> {
        let feed = backend.changes(Table::Threads, Filter::eq("memory_id", memory_id))?;
        let (handle, disposed) = DisposeHandle::new();
        tracing::debug!(memory_id, "thread subscription opened");
        Ok(Self {
            backend,
            memory_id: memory_id.to_string(),
            feed,
            handle,
            disposed,
        })
    }

    pub fn memory_id(&self) -> &str {
        &self.memory_id
    }

    pub fn dispose_handle(&self) -> DisposeHandle {
        self.handle.clone()
    }

    /// The current ordered thread list, without waiting for a change
    pub async fn snapshot(&self) -> ApiResponse<Vec<Thread>> {
        list_threads(self.backend.as_ref(), &self.memory_id).await
    }

    /// Wait for the next change of any kind and return the re-fetched list.
    /// `None` once disposed or when the underlying feed ends.
    pub async fn next_snapshot(&mut self) -> Option<ApiResponse<Vec<Thread>>> {
        if self.handle.is_disposed() {
            self.feed.close();
            return None;
        }

        let event = tokio::select! {
            biased;
            _ = self.disposed.wait_for(|disposed| *disposed) => None,
            event = self.feed.next() => event,
        };
        let Some(event) = event else {
            self.feed.close();
            return None;
        };

        tracing::debug!(memory_id = %self.memory_id, kind = ?event.kind, "thread change received");
        let snapshot = self.snapshot().await;
        if self.handle.is_disposed() {
            self.feed.close();
            return None;
        }
        Some(snapshot)
    }

    /// Release the subscription now
    pub fn dispose(mut self) {
        self.handle.dispose();
        self.feed.close();
    }
}

impl Drop for ThreadSubscription {
    fn drop(&mut self) {
        tracing::debug!(memory_id = %self.memory_id, "thread subscription released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryBackend;
    use serde_json::json;

    fn thread(id: &str, created_at: &str) -> serde_json::Value {
        json!({
            "id": id,
            "memory_id": "m1",
            "created_by": "u1",
            "content": "hello",
            "created_at": created_at
        })
    }

    #[tokio::test]
    async fn test_snapshot_after_insert() {
        let backend = Rc::new(InMemoryBackend::new());
        let mut subscription = ThreadSubscription::open(backend.clone(), "m1").unwrap();

        backend
            .insert(Table::Threads, thread("t2", "2024-01-02T00:00:00Z"))
            .await
            .unwrap();
        let snapshot = subscription.next_snapshot().await.unwrap().into_result().unwrap();
        assert_eq!(snapshot.len(), 1);

        backend
            .insert(Table::Threads, thread("t1", "2024-01-01T00:00:00Z"))
            .await
            .unwrap();
        let snapshot = subscription.next_snapshot().await.unwrap().into_result().unwrap();
        let ids: Vec<_> = snapshot.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
    }

    #[tokio::test]
    async fn test_dispose_handle_ends_stream() {
        let backend = Rc::new(InMemoryBackend::new());
        let mut subscription = ThreadSubscription::open(backend.clone(), "m1").unwrap();
        let handle = subscription.dispose_handle();
        assert_eq!(backend.subscriber_count(), 1);

        handle.dispose();
        handle.dispose();
        assert!(subscription.next_snapshot().await.is_none());
        assert_eq!(backend.subscriber_count(), 0);
    }
}
