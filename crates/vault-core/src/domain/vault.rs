//! Vault Entity
//!
//! A named collection of memories shared by its members.

use serde::{Deserialize, Serialize};

use super::entity::{null_as_default, require_non_empty, Record, Table, Timestamp};
use crate::error::SchemaError;

/// Theme applied to new vaults when none is chosen
pub const DEFAULT_THEME: &str = "sepia";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vault {
    pub id: String,
    pub name: String,
    pub creator_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub theme: Vec<String>,
    pub created_at: Timestamp,
}

impl Vault {
    /// CSS background class for the first theme tag the UI knows about
    pub fn background_class(&self) -> &'static str {
        for tag in &self.theme {
            match tag.as_str() {
                "sepia" => return "vault-bg-sepia",
                "sage" => return "vault-bg-sage",
                "parchment" => return "vault-bg-parchment",
                "midnight" => return "vault-bg-midnight",
                "pearl" => return "vault-bg-pearl",
                "dusk" => return "vault-bg-dusk",
                _ => {}
            }
        }
        "vault-bg-cream"
    }
}

impl Record for Vault {
    const TABLE: Table = Table::Vaults;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), SchemaError> {
        require_non_empty("vaults", "name", &self.name)?;
        require_non_empty("vaults", "creator_id", &self.creator_id)
    }
}

/// Insert shape for `vaults`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewVault {
    pub name: String,
    pub creator_id: String,
    pub theme: Vec<String>,
}

impl NewVault {
    pub fn new(name: impl Into<String>, creator_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            creator_id: creator_id.into(),
            theme: vec![DEFAULT_THEME.to_string()],
        }
    }

    pub fn with_theme(mut self, theme: Vec<String>) -> Self {
        self.theme = theme;
        self
    }
}
