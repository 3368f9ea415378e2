//! Data Access Layer
//!
//! One async function per entity operation. Every function takes the
//! shared `&dyn Backend` handle and returns an `ApiResponse`, so callers
//! branch on one envelope regardless of what went wrong underneath.

mod auth;
mod listing;
mod members;
mod memories;
mod storage;
mod threads;
mod users;
mod vaults;

use std::fmt::Display;

use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::Value;

use crate::domain::{Record, Timestamp};
use crate::error::{ApiError, BackendError};
use crate::repository::{Backend, Query};

pub use auth::{restore_session, sign_out, start_demo_session};
pub use listing::{fetch_vault_listing, LISTING_FAILED};
pub use members::{add_member, get_vault_role, list_members};
pub use memories::{create_memory, get_memory, list_memories};
pub use storage::{object_path, upload_file};
pub use threads::{create_thread, delete_thread, list_threads, update_thread};
pub use users::{create_user_profile, get_user_profile, update_user_profile};
pub use vaults::{create_vault, get_vault, list_vaults_for_user};

/// Uniform result envelope: exactly one of data or error.
/// Serialises as `{ "data": ..., "error": ... }` with the other side null.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    Ok(T),
    Err(String),
}

impl<T> ApiResponse<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            ApiResponse::Ok(data) => Some(data),
            ApiResponse::Err(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ApiResponse::Ok(_) => None,
            ApiResponse::Err(message) => Some(message),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ApiResponse::Ok(_))
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            ApiResponse::Ok(data) => Ok(data),
            ApiResponse::Err(message) => Err(message),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        match self {
            ApiResponse::Ok(data) => ApiResponse::Ok(f(data)),
            ApiResponse::Err(message) => ApiResponse::Err(message),
        }
    }
}

impl<T, E: Display> From<Result<T, E>> for ApiResponse<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => ApiResponse::Ok(data),
            Err(e) => ApiResponse::Err(e.to_string()),
        }
    }
}

impl<T: Serialize> Serialize for ApiResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut envelope = serializer.serialize_struct("ApiResponse", 2)?;
        envelope.serialize_field("data", &self.data())?;
        envelope.serialize_field("error", &self.error())?;
        envelope.end()
    }
}

/// Flatten an operation's result into the envelope, logging failures
pub(crate) fn respond<T>(operation: &'static str, result: Result<T, ApiError>) -> ApiResponse<T> {
    match result {
        Ok(data) => ApiResponse::Ok(data),
        Err(e) => {
            tracing::warn!(operation, error = %e, "data access failed");
            ApiResponse::Err(e.to_string())
        }
    }
}

pub(crate) fn to_row<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| BackendError::from(e).into())
}

/// Fetch one record by id; a missing row is `NotFound`
pub(crate) async fn fetch_by_id<R: Record>(backend: &dyn Backend, id: &str) -> Result<R, ApiError> {
    let row = backend
        .select(Query::from(R::TABLE).eq("id", id).limit(1))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::NotFound(format!("{} {}", R::TABLE, id)))?;
    Ok(R::from_row(row)?)
}

/// Stable sort, latest timestamp first
pub(crate) fn sort_newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> Timestamp) {
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}

/// Stable sort, earliest timestamp first
pub(crate) fn sort_oldest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> Timestamp) {
    items.sort_by_key(|item| created_at(item));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_serialises_one_side() {
        let ok: ApiResponse<u32> = ApiResponse::Ok(7);
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"data": 7, "error": null}));

        let err: ApiResponse<u32> = ApiResponse::Err("permission denied: rls".into());
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"data": null, "error": "permission denied: rls"})
        );
    }

    #[test]
    fn test_envelope_from_result() {
        let response: ApiResponse<()> = Err::<(), _>(BackendError::Network("offline".into())).into();
        assert_eq!(response.error(), Some("network error: offline"));
        assert!(!response.is_ok());
    }
}
