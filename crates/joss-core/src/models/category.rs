//! Custom category model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::RecordKind;

/// A unique identifier for a custom category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(Uuid);

impl CategoryId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for CategoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CategoryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A user-defined income or expense category beyond the built-ins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomCategory {
    pub id: CategoryId,
    pub name: String,
    /// Which ledger side the category applies to
    pub kind: RecordKind,
    /// Display color as `#RRGGBB`
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: i64,
}

fn default_color() -> String {
    "#909399".to_string()
}

impl CustomCategory {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
            kind,
            color: default_color(),
            description: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}
