//! Sync envelope and remote row shapes

use serde::{Deserialize, Serialize};

use crate::models::{
    Believer, CustomCategory, FinancialRecord, InventoryItem, Reminder, StockMovement, TempleEvent,
};

/// Envelope wire-format version.
///
/// Matches the last data format shipped by the browser app so exports
/// remain importable across the rewrite boundary.
pub const ENVELOPE_VERSION: &str = "3.0";

/// Full snapshot of one device's local data.
///
/// Constructed fresh on every sync; the transport treats it as an opaque
/// blob. Collections absent from an incoming payload deserialize to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncEnvelope {
    pub device_id: String,
    /// Most recent mutation to any contained collection (Unix ms)
    pub last_modified: i64,
    pub version: String,
    pub records: Vec<FinancialRecord>,
    pub believers: Vec<Believer>,
    pub reminders: Vec<Reminder>,
    pub inventory: Vec<InventoryItem>,
    pub stock_movements: Vec<StockMovement>,
    pub events: Vec<TempleEvent>,
    pub custom_categories: Vec<CustomCategory>,
}

impl SyncEnvelope {
    /// Total number of entries across all collections
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.records.len()
            + self.believers.len()
            + self.reminders.len()
            + self.inventory.len()
            + self.stock_movements.len()
            + self.events.len()
            + self.custom_categories.len()
    }
}

/// One row in the remote sync table; upsert semantics keyed by `device_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub device_id: String,
    pub data: SyncEnvelope,
    pub last_modified: i64,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl RemoteRecord {
    /// Wrap an envelope into the row shape pushed to the remote table
    #[must_use]
    pub fn from_envelope(envelope: SyncEnvelope) -> Self {
        Self {
            device_id: envelope.device_id.clone(),
            last_modified: envelope.last_modified,
            version: envelope.version.clone(),
            data: envelope,
            created_at: None,
            updated_at: None,
        }
    }
}
