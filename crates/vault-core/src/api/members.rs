//! Membership data access

use super::{respond, to_row, ApiResponse};
use crate::domain::{Member, NewMember, Record, Role, Table};
use crate::error::ApiError;
use crate::repository::{Backend, Query};

pub async fn list_members(backend: &dyn Backend, vault_id: &str) -> ApiResponse<Vec<Member>> {
    respond("list_members", members_of(backend, vault_id).await)
}

async fn members_of(backend: &dyn Backend, vault_id: &str) -> Result<Vec<Member>, ApiError> {
    let rows = backend
        .select(Query::from(Table::Members).eq("vault_id", vault_id))
        .await?;
    Ok(Member::from_rows(rows)?)
}

/// The user's role in the vault, `None` when they are not a member
pub async fn get_vault_role(backend: &dyn Backend, vault_id: &str, user_id: &str) -> ApiResponse<Option<Role>> {
    respond("get_vault_role", vault_role(backend, vault_id, user_id).await)
}

async fn vault_role(backend: &dyn Backend, vault_id: &str, user_id: &str) -> Result<Option<Role>, ApiError> {
    let rows = backend
        .select(
            Query::from(Table::Members)
                .eq("vault_id", vault_id)
                .eq("user_id", user_id)
                .limit(1),
        )
        .await?;
    match rows.into_iter().next() {
        Some(row) => Ok(Some(Member::from_row(row)?.role)),
        None => Ok(None),
    }
}

pub async fn add_member(backend: &dyn Backend, member: NewMember) -> ApiResponse<Member> {
    respond("add_member", insert_member(backend, &member).await)
}

async fn insert_member(backend: &dyn Backend, member: &NewMember) -> Result<Member, ApiError> {
    let stored = backend.insert(Table::Members, to_row(member)?).await?;
    Ok(Member::from_row(stored)?)
}
