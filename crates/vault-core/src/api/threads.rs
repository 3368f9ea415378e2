//! Thread data access

use super::{respond, sort_oldest_first, to_row, ApiResponse};
use crate::domain::{validate_content, NewThread, Record, Table, Thread, ThreadPatch};
use crate::error::{ApiError, BackendError};
use crate::repository::{Backend, Direction, Filter, Query};

/// Threads on a memory in discussion order (oldest first)
pub async fn list_threads(backend: &dyn Backend, memory_id: &str) -> ApiResponse<Vec<Thread>> {
    respond("list_threads", threads_on(backend, memory_id).await)
}

pub(crate) async fn threads_on(backend: &dyn Backend, memory_id: &str) -> Result<Vec<Thread>, ApiError> {
    let rows = backend
        .select(
            Query::from(Table::Threads)
                .eq("memory_id", memory_id)
                .order("created_at", Direction::Ascending),
        )
        .await?;
    let mut threads = Thread::from_rows(rows)?;
    sort_oldest_first(&mut threads, |t| t.created_at);
    Ok(threads)
}

pub async fn create_thread(backend: &dyn Backend, thread: NewThread) -> ApiResponse<Thread> {
    respond("create_thread", insert_thread(backend, thread).await)
}

async fn insert_thread(backend: &dyn Backend, mut thread: NewThread) -> Result<Thread, ApiError> {
    thread.content = validate_content(&thread.content)?;
    let stored = backend.insert(Table::Threads, to_row(&thread)?).await?;
    Ok(Thread::from_row(stored)?)
}

/// Apply an edit; the stored thread comes back marked as edited
pub async fn update_thread(backend: &dyn Backend, thread_id: &str, patch: ThreadPatch) -> ApiResponse<Thread> {
    respond("update_thread", patch_thread(backend, thread_id, patch).await)
}

async fn patch_thread(backend: &dyn Backend, thread_id: &str, mut patch: ThreadPatch) -> Result<Thread, ApiError> {
    patch.content = validate_content(&patch.content)?;
    let row = backend
        .update(Table::Threads, vec![Filter::eq("id", thread_id)], to_row(&patch)?)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::NotFound(format!("threads {}", thread_id)))?;
    Ok(Thread::from_row(row)?)
}

pub async fn delete_thread(backend: &dyn Backend, thread_id: &str) -> ApiResponse<()> {
    respond("delete_thread", remove_thread(backend, thread_id).await)
}

async fn remove_thread(backend: &dyn Backend, thread_id: &str) -> Result<(), ApiError> {
    backend
        .delete(Table::Threads, vec![Filter::eq("id", thread_id)])
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryBackend, Operation};
    use chrono::Utc;
    use serde_json::json;

    fn thread(id: &str, created_at: &str) -> serde_json::Value {
        json!({
            "id": id,
            "memory_id": "m1",
            "created_by": "u1",
            "content": format!("comment {}", id),
            "created_at": created_at
        })
    }

    #[tokio::test]
    async fn test_chronological_regardless_of_insert_order() {
        let backend = InMemoryBackend::new();
        backend.seed(
            Table::Threads,
            vec![
                thread("t3", "2024-01-03T00:00:00Z"),
                thread("t1", "2024-01-01T00:00:00Z"),
                thread("t2", "2024-01-02T00:00:00Z"),
            ],
        );
        let threads = list_threads(&backend, "m1").await.into_result().unwrap();
        let ids: Vec<_> = threads.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2", "t3"]);
    }

    #[tokio::test]
    async fn test_overlong_content_issues_no_call() {
        let backend = InMemoryBackend::new();
        let response = create_thread(
            &backend,
            NewThread {
                memory_id: "m1".into(),
                created_by: "u1".into(),
                content: "x".repeat(1001),
                parent_id: None,
            },
        )
        .await;
        assert!(!response.is_ok());
        assert_eq!(backend.count(Operation::Insert, Table::Threads), 0);
    }

    #[tokio::test]
    async fn test_update_marks_edited() {
        let backend = InMemoryBackend::new();
        backend.seed(Table::Threads, vec![thread("t1", "2024-01-01T00:00:00Z")]);
        let updated = update_thread(&backend, "t1", ThreadPatch::content("fixed typo", Utc::now()))
            .await
            .into_result()
            .unwrap();
        assert!(updated.is_edited);
        assert_eq!(updated.content, "fixed typo");
        assert!(updated.updated_at.is_some());

        let missing = update_thread(&backend, "nope", ThreadPatch::content("x", Utc::now())).await;
        assert!(missing.error().unwrap().starts_with("not found"));
    }

    #[tokio::test]
    async fn test_delete() {
        let backend = InMemoryBackend::new();
        backend.seed(Table::Threads, vec![thread("t1", "2024-01-01T00:00:00Z")]);
        assert!(delete_thread(&backend, "t1").await.is_ok());
        assert!(backend.rows(Table::Threads).is_empty());
    }
}
