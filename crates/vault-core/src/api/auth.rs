//! Session start and end

use super::users::{create_user_profile, get_user_profile, insert_user};
use super::{fetch_by_id, respond, ApiResponse};
use crate::domain::{NewUser, User};
use crate::error::{ApiError, BackendError};
use crate::repository::{Backend, SupabaseBackend};
use crate::session::{demo_user, Session};

/// Validate a stored or redirect access token and load the user's profile.
/// A first sign-in creates the profile row. On failure the token is dropped.
pub async fn restore_session(backend: &SupabaseBackend, access_token: &str) -> ApiResponse<Session> {
    backend.set_access_token(Some(access_token.to_string()));
    let result = session_for_token(backend, access_token).await;
    if result.is_err() {
        backend.set_access_token(None);
    }
    respond("restore_session", result)
}

async fn session_for_token(backend: &SupabaseBackend, access_token: &str) -> Result<Session, ApiError> {
    let account = backend.fetch_auth_user().await?;
    let user = match fetch_by_id::<User>(backend, &account.id).await {
        Ok(user) => user,
        Err(ApiError::Backend(BackendError::NotFound(_))) => {
            tracing::info!(user_id = %account.id, "creating profile on first sign-in");
            let profile = NewUser {
                id: account.id.clone(),
                email: account.email.clone().unwrap_or_default(),
                name: account.display_name(),
            };
            insert_user(backend, &profile).await?
        }
        Err(err) => return Err(err),
    };
    Ok(Session::new(user, Some(access_token.to_string())))
}

/// Start a session for the local demo user, creating its profile if needed
pub async fn start_demo_session(backend: &dyn Backend) -> ApiResponse<Session> {
    let user = demo_user();
    match get_user_profile(backend, &user.id).await {
        ApiResponse::Ok(stored) => ApiResponse::Ok(Session::new(stored, None)),
        ApiResponse::Err(_) => create_user_profile(
            backend,
            NewUser {
                id: user.id,
                email: user.email,
                name: user.name,
            },
        )
        .await
        .map(|stored| Session::new(stored, None)),
    }
}

pub async fn sign_out(backend: &SupabaseBackend) -> ApiResponse<()> {
    respond("sign_out", backend.sign_out().await.map_err(|e: BackendError| e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Table;
    use crate::repository::InMemoryBackend;
    use crate::session::DEMO_USER_ID;

    #[tokio::test]
    async fn test_demo_session_is_idempotent() {
        let backend = InMemoryBackend::new();
        let first = start_demo_session(&backend).await.into_result().unwrap();
        let second = start_demo_session(&backend).await.into_result().unwrap();
        assert_eq!(first.user_id(), DEMO_USER_ID);
        assert_eq!(first, second);
        assert_eq!(backend.rows(Table::Users).len(), 1);
    }
}
