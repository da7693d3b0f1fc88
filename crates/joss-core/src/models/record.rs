//! Financial record model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A unique identifier for a financial record, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Create a new unique record ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Whether a record books money coming in or going out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Income,
    Expense,
}

impl RecordKind {
    /// Signed multiplier for balance arithmetic
    #[must_use]
    pub const fn sign(self) -> i64 {
        match self {
            Self::Income => 1,
            Self::Expense => -1,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => write!(f, "income"),
            Self::Expense => write!(f, "expense"),
        }
    }
}

/// A single donation or expense entry in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialRecord {
    /// Unique identifier
    pub id: RecordId,
    /// Income or expense
    pub kind: RecordKind,
    /// Category name (built-in or custom)
    pub category: String,
    /// Amount in the smallest currency unit
    pub amount: i64,
    /// When the donation/expense happened (Unix ms)
    pub date: i64,
    /// Optional reference to a believer (donor) id string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub believer_id: Option<String>,
    /// Optional free-form note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl FinancialRecord {
    /// Create a new record dated now
    #[must_use]
    pub fn new(kind: RecordKind, category: impl Into<String>, amount: i64) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: RecordId::new(),
            kind,
            category: category.into(),
            amount,
            date: now,
            believer_id: None,
            note: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Amount with the record kind's sign applied
    #[must_use]
    pub const fn signed_amount(&self) -> i64 {
        self.amount * self.kind.sign()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_unique() {
        let id1 = RecordId::new();
        let id2 = RecordId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_record_id_parse() {
        let id = RecordId::new();
        let parsed: RecordId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_new_record() {
        let record = FinancialRecord::new(RecordKind::Income, "incense", 600);
        assert_eq!(record.category, "incense");
        assert_eq!(record.amount, 600);
        assert_eq!(record.created_at, record.updated_at);
        assert!(record.believer_id.is_none());
    }

    #[test]
    fn test_signed_amount() {
        let income = FinancialRecord::new(RecordKind::Income, "incense", 600);
        let expense = FinancialRecord::new(RecordKind::Expense, "supplies", 250);
        assert_eq!(income.signed_amount(), 600);
        assert_eq!(expense.signed_amount(), -250);
    }

    #[test]
    fn test_camel_case_wire_format() {
        let mut record = FinancialRecord::new(RecordKind::Expense, "repairs", 1200);
        record.believer_id = Some("believer-1".to_string());

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"believerId\""));
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"kind\":\"expense\""));
    }
}
