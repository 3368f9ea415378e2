//! User Entity
//!
//! Public profile row for a signed-in account.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::entity::{null_as_default, require_non_empty, Record, Table};
use crate::error::{SchemaError, ValidationError};

pub const MIN_NAME_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    /// Empty for phone and some OAuth accounts
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl User {
    /// Uppercase first letter of the name, for avatar placeholders
    pub fn initial(&self) -> String {
        self.name
            .trim()
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "?".to_string())
    }
}

impl Record for User {
    const TABLE: Table = Table::Users;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), SchemaError> {
        require_non_empty("users", "id", &self.id)
    }
}

/// Insert shape for `users`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl NewUser {
    /// Reject a profile row that would not read back as a `User`
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::new("id", "Account id is required"));
        }
        Ok(())
    }
}

/// Update shape for `users`, produced by `ProfileUpdate::parse`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"))
}

impl ProfileUpdate {
    /// Validate raw profile input, collecting one error per bad field
    pub fn parse(name: &str, email: &str, avatar_url: &str) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let name = name.trim();
        if name.chars().count() < MIN_NAME_CHARS {
            errors.push(ValidationError::new(
                "name",
                format!("Name must be at least {} characters", MIN_NAME_CHARS),
            ));
        }

        let email = email.trim();
        if !email_pattern().is_match(email) {
            errors.push(ValidationError::new("email", "Enter a valid email address"));
        }

        let avatar_url = avatar_url.trim();
        let avatar_url = if avatar_url.is_empty() {
            None
        } else {
            match url::Url::parse(avatar_url) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Some(avatar_url.to_string()),
                _ => {
                    errors.push(ValidationError::new("avatar_url", "Avatar URL must be an http(s) link"));
                    None
                }
            }
        };

        if errors.is_empty() {
            Ok(Self {
                name: name.to_string(),
                email: email.to_string(),
                avatar_url,
            })
        } else {
            Err(errors)
        }
    }
}
