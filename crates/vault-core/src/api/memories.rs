//! Memory data access

use super::{fetch_by_id, respond, sort_newest_first, to_row, ApiResponse};
use crate::domain::{Memory, NewMemory, Record, Table};
use crate::error::{ApiError, ValidationError};
use crate::repository::{Backend, Direction, Query};

/// Memories in a vault, newest first
pub async fn list_memories(backend: &dyn Backend, vault_id: &str) -> ApiResponse<Vec<Memory>> {
    respond("list_memories", memories_in(backend, vault_id).await)
}

async fn memories_in(backend: &dyn Backend, vault_id: &str) -> Result<Vec<Memory>, ApiError> {
    let rows = backend
        .select(
            Query::from(Table::Memories)
                .eq("vault_id", vault_id)
                .order("created_at", Direction::Descending),
        )
        .await?;
    let mut memories = Memory::from_rows(rows)?;
    sort_newest_first(&mut memories, |m| m.created_at);
    Ok(memories)
}

pub async fn get_memory(backend: &dyn Backend, memory_id: &str) -> ApiResponse<Memory> {
    respond("get_memory", fetch_by_id(backend, memory_id).await)
}

pub async fn create_memory(backend: &dyn Backend, memory: NewMemory) -> ApiResponse<Memory> {
    respond("create_memory", insert_memory(backend, &memory).await)
}

async fn insert_memory(backend: &dyn Backend, memory: &NewMemory) -> Result<Memory, ApiError> {
    if memory.title.trim().is_empty() {
        return Err(ValidationError::new("title", "Title is required").into());
    }
    let stored = backend.insert(Table::Memories, to_row(memory)?).await?;
    let memory = Memory::from_row(stored)?;
    tracing::info!(memory_id = %memory.id, vault_id = %memory.vault_id, kind = memory.kind.as_str(), "memory created");
    Ok(memory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MemoryType;
    use crate::repository::InMemoryBackend;
    use serde_json::json;

    fn row(id: &str, vault: &str, created_at: &str) -> serde_json::Value {
        json!({
            "id": id,
            "vault_id": vault,
            "title": id,
            "story": "",
            "type": "text",
            "created_by": "u1",
            "tags": [],
            "created_at": created_at
        })
    }

    #[tokio::test]
    async fn test_newest_first() {
        let backend = InMemoryBackend::new();
        backend.seed(
            Table::Memories,
            vec![
                row("first", "v1", "2024-01-01T00:00:00Z"),
                row("second", "v1", "2024-01-02T00:00:00Z"),
                row("elsewhere", "v2", "2024-01-03T00:00:00Z"),
            ],
        );
        let memories = list_memories(&backend, "v1").await.into_result().unwrap();
        let ids: Vec<_> = memories.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_malformed_row_is_an_error() {
        let backend = InMemoryBackend::new();
        backend.seed(Table::Memories, vec![json!({"id": "m1", "vault_id": "v1"})]);
        let response = list_memories(&backend, "v1").await;
        assert!(response.error().unwrap().starts_with("malformed memories row"));
    }

    #[tokio::test]
    async fn test_create_memory() {
        let backend = InMemoryBackend::new();
        let memory = create_memory(
            &backend,
            NewMemory {
                vault_id: "v1".into(),
                title: "First Day of School".into(),
                story: "Backpack bigger than she was.".into(),
                kind: MemoryType::Photo,
                media_url: Some("https://cdn.example/p.png".into()),
                created_by: "u1".into(),
                tags: vec!["school".into()],
                unlock_date: None,
            },
        )
        .await
        .into_result()
        .unwrap();
        assert_eq!(memory.kind, MemoryType::Photo);
        assert_eq!(get_memory(&backend, &memory.id).await.into_result().unwrap(), memory);
    }
}
