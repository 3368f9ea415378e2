//! Vault data access

use super::{fetch_by_id, respond, sort_newest_first, to_row, ApiResponse};
use crate::domain::{Member, NewMember, NewVault, Record, Role, Table, Vault};
use crate::error::{ApiError, ValidationError};
use crate::repository::{Backend, Direction, Filter, Query};

/// Vaults the user is a member of, newest first
pub async fn list_vaults_for_user(backend: &dyn Backend, user_id: &str) -> ApiResponse<Vec<Vault>> {
    respond("list_vaults_for_user", vaults_for_user(backend, user_id).await)
}

async fn vaults_for_user(backend: &dyn Backend, user_id: &str) -> Result<Vec<Vault>, ApiError> {
    let memberships = Member::from_rows(
        backend
            .select(Query::from(Table::Members).eq("user_id", user_id))
            .await?,
    )?;
    if memberships.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = memberships.into_iter().map(|m| m.vault_id).collect();
    let rows = backend
        .select(
            Query::from(Table::Vaults)
                .filter(Filter::is_in("id", ids))
                .order("created_at", Direction::Descending),
        )
        .await?;
    let mut vaults = Vault::from_rows(rows)?;
    sort_newest_first(&mut vaults, |v| v.created_at);
    Ok(vaults)
}

pub async fn get_vault(backend: &dyn Backend, vault_id: &str) -> ApiResponse<Vault> {
    respond("get_vault", fetch_by_id(backend, vault_id).await)
}

/// Insert the vault, then the creator's owner membership.
///
/// The two inserts are independent: if the membership insert fails the
/// vault row stays behind without an owner and the error is returned.
pub async fn create_vault(backend: &dyn Backend, new_vault: NewVault) -> ApiResponse<Vault> {
    respond("create_vault", insert_vault(backend, new_vault).await)
}

async fn insert_vault(backend: &dyn Backend, new_vault: NewVault) -> Result<Vault, ApiError> {
    if new_vault.name.trim().is_empty() {
        return Err(ValidationError::new("name", "Vault name required").into());
    }
    let stored = backend.insert(Table::Vaults, to_row(&new_vault)?).await?;
    let vault = Vault::from_row(stored)?;

    let owner = NewMember {
        vault_id: vault.id.clone(),
        user_id: new_vault.creator_id.clone(),
        role: Role::Owner,
    };
    if let Err(e) = backend.insert(Table::Members, to_row(&owner)?).await {
        tracing::error!(
            vault_id = %vault.id,
            user_id = %owner.user_id,
            error = %e,
            "orphaned vault: owner membership insert failed"
        );
        return Err(e.into());
    }

    tracing::info!(vault_id = %vault.id, name = %vault.name, "vault created");
    Ok(vault)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::repository::{InMemoryBackend, Operation};
    use serde_json::json;

    #[tokio::test]
    async fn test_list_only_member_vaults() {
        let backend = InMemoryBackend::new();
        backend.seed(
            Table::Vaults,
            vec![
                json!({"id": "v1", "name": "Old", "creator_id": "u1", "created_at": "2024-01-01T00:00:00Z"}),
                json!({"id": "v2", "name": "New", "creator_id": "u2", "created_at": "2024-02-01T00:00:00Z"}),
                json!({"id": "v3", "name": "Other", "creator_id": "u3", "created_at": "2024-03-01T00:00:00Z"}),
            ],
        );
        backend.seed(
            Table::Members,
            vec![
                json!({"id": "m1", "vault_id": "v1", "user_id": "u1", "role": "owner"}),
                json!({"id": "m2", "vault_id": "v2", "user_id": "u1", "role": "viewer"}),
            ],
        );

        let vaults = list_vaults_for_user(&backend, "u1").await.into_result().unwrap();
        let names: Vec<_> = vaults.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["New", "Old"]);

        let none = list_vaults_for_user(&backend, "nobody").await.into_result().unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_orphaned_vault_is_reported() {
        let backend = InMemoryBackend::new();
        backend.fail_next(
            Operation::Insert,
            Some(Table::Members),
            BackendError::PermissionDenied("rls".into()),
        );
        let response = create_vault(&backend, NewVault::new("Family Stories", "u1")).await;
        assert_eq!(response.error(), Some("permission denied: rls"));
        // no rollback
        assert_eq!(backend.rows(Table::Vaults).len(), 1);
        assert!(backend.rows(Table::Members).is_empty());
    }

    #[tokio::test]
    async fn test_blank_name_issues_no_call() {
        let backend = InMemoryBackend::new();
        let response = create_vault(&backend, NewVault::new("   ", "u1")).await;
        assert!(!response.is_ok());
        assert!(backend.calls().is_empty());
    }
}
