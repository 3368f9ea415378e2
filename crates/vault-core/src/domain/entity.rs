//! Domain Layer - Core Record Trait
//!
//! Every persisted record names its table, exposes its id and validates
//! itself after deserialisation. Rows from the backend only become typed
//! records through `Record::from_row`.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::SchemaError;

pub type Timestamp = DateTime<Utc>;

/// Named record collections on the hosted service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Vaults,
    Members,
    Memories,
    Threads,
    Users,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Vaults => "vaults",
            Table::Members => "members",
            Table::Memories => "memories",
            Table::Threads => "threads",
            Table::Users => "users",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "vaults" => Some(Table::Vaults),
            "members" => Some(Table::Members),
            "memories" => Some(Table::Memories),
            "threads" => Some(Table::Threads),
            "users" => Some(Table::Users),
            _ => None,
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Core trait for all persisted records
pub trait Record: Sized + Clone + Serialize + DeserializeOwned {
    const TABLE: Table;

    fn id(&self) -> &str;

    /// Check invariants serde cannot express
    fn validate(&self) -> Result<(), SchemaError>;

    /// Decode and validate one backend row
    fn from_row(row: Value) -> Result<Self, SchemaError> {
        let record: Self = serde_json::from_value(row).map_err(|e| SchemaError::Malformed {
            table: Self::TABLE.name(),
            message: e.to_string(),
        })?;
        record.validate()?;
        Ok(record)
    }

    /// Decode a list of rows, failing on the first bad one
    fn from_rows(rows: Vec<Value>) -> Result<Vec<Self>, SchemaError> {
        rows.into_iter().map(Self::from_row).collect()
    }
}

/// Decode an explicit `null` column as the field's default.
/// Use with `#[serde(default, deserialize_with = "null_as_default")]`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn require_non_empty(
    table: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), SchemaError> {
    if value.trim().is_empty() {
        return Err(SchemaError::Invalid {
            table,
            field,
            message: "must not be empty".to_string(),
        });
    }
    Ok(())
}
