//! User Session
//!
//! The signed-in user is an explicit value handed to every page and form
//! that needs it. There is no ambient auth context to read from.

use crate::domain::User;

/// Local-storage key the browser keeps the access token under
pub const ACCESS_TOKEN_KEY: &str = "memory-vault.access_token";

pub const DEMO_USER_ID: &str = "00000000-0000-4000-8000-000000000001";

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: User,
    pub access_token: Option<String>,
}

impl Session {
    pub fn new(user: User, access_token: Option<String>) -> Self {
        Self { user, access_token }
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

/// Profile used when running against the in-memory backend
pub fn demo_user() -> User {
    User {
        id: DEMO_USER_ID.to_string(),
        name: "Demo User".to_string(),
        email: "demo@memory-vault.local".to_string(),
        avatar_url: None,
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// Startup: a stored token is being checked
    #[default]
    Restoring,
    SignedIn(Session),
    SignedOut,
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::SignedIn(session) => Some(session),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.session().map(|s| &s.user)
    }

    pub fn is_restoring(&self) -> bool {
        matches!(self, SessionState::Restoring)
    }
}

/// Access token from an auth redirect fragment (`#access_token=...&...`)
pub fn token_from_fragment(fragment: &str) -> Option<String> {
    let fragment = fragment.trim_start_matches('#');
    url::form_urlencoded::parse(fragment.as_bytes())
        .find(|(key, _)| key == "access_token")
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_from_fragment() {
        assert_eq!(
            token_from_fragment("#access_token=abc.def&expires_in=3600&token_type=bearer"),
            Some("abc.def".to_string())
        );
        assert_eq!(token_from_fragment("#error=access_denied"), None);
        assert_eq!(token_from_fragment(""), None);
    }

    #[test]
    fn test_state_accessors() {
        assert!(SessionState::default().is_restoring());
        assert!(SessionState::SignedOut.user().is_none());
        let state = SessionState::SignedIn(Session::new(demo_user(), None));
        assert_eq!(state.session().unwrap().user_id(), DEMO_USER_ID);
    }
}
