//! Reminder model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A unique identifier for a reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReminderId(Uuid);

impl ReminderId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ReminderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReminderId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A dated reminder (festival preparation, bill due, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: ReminderId,
    pub title: String,
    /// When the reminder fires (Unix ms)
    pub due_at: i64,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Reminder {
    #[must_use]
    pub fn new(title: impl Into<String>, due_at: i64) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: ReminderId::new(),
            title: title.into(),
            due_at,
            done: false,
            note: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the reminder is due at the given instant and still open
    #[must_use]
    pub const fn is_due(&self, now_ms: i64) -> bool {
        !self.done && self.due_at <= now_ms
    }
}
