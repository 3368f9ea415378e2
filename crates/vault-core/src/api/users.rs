//! User profile data access

use super::{fetch_by_id, respond, to_row, ApiResponse};
use crate::domain::{NewUser, ProfileUpdate, Record, Table, User};
use crate::error::{ApiError, BackendError};
use crate::repository::{Backend, Filter};

pub async fn get_user_profile(backend: &dyn Backend, user_id: &str) -> ApiResponse<User> {
    respond("get_user_profile", fetch_by_id(backend, user_id).await)
}

/// Create the profile row for a freshly signed-up account
pub async fn create_user_profile(backend: &dyn Backend, user: NewUser) -> ApiResponse<User> {
    respond("create_user_profile", insert_user(backend, &user).await)
}

pub(super) async fn insert_user(backend: &dyn Backend, user: &NewUser) -> Result<User, ApiError> {
    user.validate()?;
    let stored = backend.insert(Table::Users, to_row(user)?).await?;
    Ok(User::from_row(stored)?)
}

pub async fn update_user_profile(backend: &dyn Backend, user_id: &str, update: ProfileUpdate) -> ApiResponse<User> {
    respond("update_user_profile", patch_user(backend, user_id, &update).await)
}

async fn patch_user(backend: &dyn Backend, user_id: &str, update: &ProfileUpdate) -> Result<User, ApiError> {
    let row = backend
        .update(Table::Users, vec![Filter::eq("id", user_id)], to_row(update)?)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::NotFound(format!("users {}", user_id)))?;
    Ok(User::from_row(row)?)
}
