//! Memory Entity
//!
//! A single user-authored item inside a vault, optionally time-locked.

use serde::{Deserialize, Serialize};

use super::entity::{null_as_default, require_non_empty, Record, Table, Timestamp};
use crate::error::SchemaError;

/// Memory type determines which media the memory carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    #[default]
    Text,
    Photo,
    /// Recorded or uploaded audio (stored rows may still say "audio")
    #[serde(alias = "audio")]
    Voice,
}

impl MemoryType {
    pub const ALL: [MemoryType; 3] = [MemoryType::Text, MemoryType::Photo, MemoryType::Voice];

    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryType::Text => "text",
            MemoryType::Photo => "photo",
            MemoryType::Voice => "voice",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "photo" => MemoryType::Photo,
            "voice" | "audio" => MemoryType::Voice,
            _ => MemoryType::Text,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MemoryType::Text => "Text",
            MemoryType::Photo => "Photo",
            MemoryType::Voice => "Voice",
        }
    }

    /// Storage bucket for this type's attachment, if it has one
    pub fn bucket(&self) -> Option<&'static str> {
        match self {
            MemoryType::Text => None,
            MemoryType::Photo => Some("photos"),
            MemoryType::Voice => Some("audio"),
        }
    }

    pub fn has_media(&self) -> bool {
        self.bucket().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub vault_id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub story: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: MemoryType,
    #[serde(default)]
    pub media_url: Option<String>,
    pub created_by: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub unlock_date: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Memory {
    /// Future-dated memories are hidden until their unlock date passes.
    /// Display gating only; the row itself is readable.
    pub fn is_locked(&self, now: Timestamp) -> bool {
        self.unlock_date.map(|date| date > now).unwrap_or(false)
    }
}

impl Record for Memory {
    const TABLE: Table = Table::Memories;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), SchemaError> {
        require_non_empty("memories", "vault_id", &self.vault_id)?;
        require_non_empty("memories", "title", &self.title)?;
        require_non_empty("memories", "created_by", &self.created_by)
    }
}

/// Insert shape for `memories`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMemory {
    pub vault_id: String,
    pub title: String,
    pub story: String,
    #[serde(rename = "type")]
    pub kind: MemoryType,
    pub media_url: Option<String>,
    pub created_by: String,
    pub tags: Vec<String>,
    pub unlock_date: Option<Timestamp>,
}

/// Split comma-separated tag input, trimming and dropping empties
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
