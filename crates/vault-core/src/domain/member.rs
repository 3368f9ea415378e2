//! Member Entity
//!
//! A user's role within one vault.

use serde::{Deserialize, Serialize};

use super::entity::{require_non_empty, Record, Table};
use crate::error::SchemaError;

/// Permission tier within a vault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Editor,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }

    /// Owners and editors may add memories and threads
    pub fn can_write(&self) -> bool {
        matches!(self, Role::Owner | Role::Editor)
    }
}

/// `can_write` for a role that may not exist (non-members cannot write)
pub fn can_write(role: Option<Role>) -> bool {
    role.map(|r| r.can_write()).unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub vault_id: String,
    pub user_id: String,
    pub role: Role,
}

impl Record for Member {
    const TABLE: Table = Table::Members;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), SchemaError> {
        require_non_empty("members", "vault_id", &self.vault_id)?;
        require_non_empty("members", "user_id", &self.user_id)
    }
}

/// Insert shape for `members`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMember {
    pub vault_id: String,
    pub user_id: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_permissions() {
        assert!(Role::Owner.can_write());
        assert!(Role::Editor.can_write());
        assert!(!Role::Viewer.can_write());
        assert!(!can_write(None));
    }

    #[test]
    fn test_unknown_role_is_malformed() {
        let err = Member::from_row(json!({
            "id": "m1",
            "vault_id": "v1",
            "user_id": "u1",
            "role": "admin"
        }))
        .unwrap_err();
        assert!(matches!(err, SchemaError::Malformed { table: "members", .. }));
    }
}
