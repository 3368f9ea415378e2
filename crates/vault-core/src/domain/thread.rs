//! Thread Entity
//!
//! A comment attached to a memory. `parent_id` allows replies but the UI
//! renders threads as a flat chronological list.

use serde::{Deserialize, Serialize};

use super::entity::{null_as_default, require_non_empty, Record, Table, Timestamp};
use crate::error::{SchemaError, ValidationError};

pub const MAX_THREAD_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub memory_id: String,
    pub created_by: String,
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_edited: bool,
}

impl Thread {
    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.created_by == user_id
    }
}

impl Record for Thread {
    const TABLE: Table = Table::Threads;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), SchemaError> {
        require_non_empty("threads", "memory_id", &self.memory_id)?;
        require_non_empty("threads", "created_by", &self.created_by)?;
        validate_content(&self.content)
            .map(|_| ())
            .map_err(|e| SchemaError::Invalid {
                table: "threads",
                field: "content",
                message: e.message,
            })
    }
}

/// Insert shape for `threads`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewThread {
    pub memory_id: String,
    pub created_by: String,
    pub content: String,
    pub parent_id: Option<String>,
}

/// Update shape for `threads`; every edit marks the thread as edited
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadPatch {
    pub content: String,
    pub is_edited: bool,
    pub updated_at: Timestamp,
}

impl ThreadPatch {
    pub fn content(content: impl Into<String>, now: Timestamp) -> Self {
        Self {
            content: content.into(),
            is_edited: true,
            updated_at: now,
        }
    }
}

/// Check thread content: non-blank and at most `MAX_THREAD_CHARS` characters.
/// Returns the content trimmed of surrounding whitespace.
pub fn validate_content(content: &str) -> Result<String, ValidationError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("content", "Thread content is required"));
    }
    if trimmed.chars().count() > MAX_THREAD_CHARS {
        return Err(ValidationError::new(
            "content",
            format!("Thread content must be at most {} characters", MAX_THREAD_CHARS),
        ));
    }
    Ok(trimmed.to_string())
}
