//! Local collection store over the kv table.
//!
//! Mirrors the browser app's local-storage layout: each domain collection
//! is one JSON array under a fixed string key, alongside device identity,
//! sync markers, rolling backups, and the fallback transport's cloud rows.

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{
    Believer, ConflictEntry, CustomCategory, FinancialRecord, InventoryItem, Reminder,
    StockMovement, TempleEvent,
};
use crate::sync::envelope::{SyncEnvelope, ENVELOPE_VERSION};
use crate::util::unix_timestamp_ms;

use super::Database;

/// Fixed persistence keys, one per collection or marker
pub mod keys {
    pub const RECORDS: &str = "records";
    pub const BELIEVERS: &str = "believers";
    pub const REMINDERS: &str = "reminders";
    pub const INVENTORY: &str = "inventory";
    pub const STOCK_MOVEMENTS: &str = "stock-movements";
    pub const EVENTS: &str = "events";
    pub const CUSTOM_CATEGORIES: &str = "custom-categories";
    pub const CONFLICT_LOG: &str = "conflict-log";
    pub const DEVICE_ID: &str = "device-id";
    pub const LAST_SYNC: &str = "last-sync";
    pub const LAST_MODIFIED: &str = "last-modified";
    pub const BACKUP_PREFIX: &str = "backup-";
    pub const CLOUD_PREFIX: &str = "cloud-";
}

/// How many rolling backups survive rotation
pub const BACKUP_RETENTION: usize = 5;

/// How many resolved conflicts the log retains
const CONFLICT_LOG_RETENTION: usize = 50;

/// Thread-safe handle to the local collection store
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Database>,
}

impl LocalStore {
    /// Open the store at the given filesystem path, creating parents as needed
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::open(path).await?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Open an in-memory store (primarily for tests)
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self { db: Arc::new(db) })
    }

    // ------------------------------------------------------------------
    // kv primitives
    // ------------------------------------------------------------------

    pub(crate) async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .db
            .connection()
            .query("SELECT value FROM kv WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            let value: String = row.get(0)?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    pub(crate) async fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .connection()
            .execute(
                "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?, ?, ?)",
                libsql::params![key, value, unix_timestamp_ms()],
            )
            .await?;
        Ok(())
    }

    pub(crate) async fn remove_raw(&self, key: &str) -> Result<()> {
        self.db
            .connection()
            .execute("DELETE FROM kv WHERE key = ?", [key])
            .await?;
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut rows = self
            .db
            .connection()
            .query(
                "SELECT key FROM kv WHERE key LIKE ? ORDER BY key ASC",
                [format!("{prefix}%")],
            )
            .await?;

        let mut matched = Vec::new();
        while let Some(row) = rows.next().await? {
            let key: String = row.get(0)?;
            matched.push(key);
        }
        Ok(matched)
    }

    // ------------------------------------------------------------------
    // typed collections
    // ------------------------------------------------------------------

    async fn get_collection<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        match self.get_raw(key).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Persist a collection and advance the last-modified marker
    async fn put_collection<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        self.write_collection(key, items).await?;
        self.set_last_modified(unix_timestamp_ms()).await
    }

    /// Persist a collection without touching the last-modified marker
    async fn write_collection<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let serialized = serde_json::to_string(items)?;
        self.set_raw(key, &serialized).await
    }

    // ------------------------------------------------------------------
    // device identity & sync markers
    // ------------------------------------------------------------------

    /// Stable device identifier, generated on first access and never rotated
    pub async fn device_id(&self) -> Result<String> {
        if let Some(existing) = self.get_raw(keys::DEVICE_ID).await? {
            return Ok(existing);
        }

        let generated = format!("device-{}", Uuid::now_v7());
        self.set_raw(keys::DEVICE_ID, &generated).await?;
        Ok(generated)
    }

    pub async fn last_sync(&self) -> Result<Option<i64>> {
        self.get_marker(keys::LAST_SYNC).await
    }

    pub async fn set_last_sync(&self, timestamp_ms: i64) -> Result<()> {
        self.set_raw(keys::LAST_SYNC, &timestamp_ms.to_string())
            .await
    }

    pub async fn last_modified(&self) -> Result<Option<i64>> {
        self.get_marker(keys::LAST_MODIFIED).await
    }

    pub async fn set_last_modified(&self, timestamp_ms: i64) -> Result<()> {
        self.set_raw(keys::LAST_MODIFIED, &timestamp_ms.to_string())
            .await
    }

    async fn get_marker(&self, key: &str) -> Result<Option<i64>> {
        let Some(raw) = self.get_raw(key).await? else {
            return Ok(None);
        };
        raw.parse()
            .map(Some)
            .map_err(|_| Error::InvalidInput(format!("marker '{key}' is not a timestamp: {raw}")))
    }

    // ------------------------------------------------------------------
    // financial records
    // ------------------------------------------------------------------

    pub async fn records(&self) -> Result<Vec<FinancialRecord>> {
        self.get_collection(keys::RECORDS).await
    }

    pub async fn save_records(&self, records: &[FinancialRecord]) -> Result<()> {
        self.put_collection(keys::RECORDS, records).await
    }

    pub async fn add_record(&self, record: FinancialRecord) -> Result<()> {
        let mut records = self.records().await?;
        records.push(record);
        self.save_records(&records).await
    }

    // ------------------------------------------------------------------
    // believers
    // ------------------------------------------------------------------

    pub async fn believers(&self) -> Result<Vec<Believer>> {
        self.get_collection(keys::BELIEVERS).await
    }

    pub async fn save_believers(&self, believers: &[Believer]) -> Result<()> {
        self.put_collection(keys::BELIEVERS, believers).await
    }

    pub async fn add_believer(&self, believer: Believer) -> Result<()> {
        let mut believers = self.believers().await?;
        believers.push(believer);
        self.save_believers(&believers).await
    }

    // ------------------------------------------------------------------
    // reminders
    // ------------------------------------------------------------------

    pub async fn reminders(&self) -> Result<Vec<Reminder>> {
        self.get_collection(keys::REMINDERS).await
    }

    pub async fn save_reminders(&self, reminders: &[Reminder]) -> Result<()> {
        self.put_collection(keys::REMINDERS, reminders).await
    }

    pub async fn add_reminder(&self, reminder: Reminder) -> Result<()> {
        let mut reminders = self.reminders().await?;
        reminders.push(reminder);
        self.save_reminders(&reminders).await
    }

    /// Mark a reminder as done by id string
    pub async fn complete_reminder(&self, reminder_id: &str) -> Result<()> {
        let mut reminders = self.reminders().await?;
        let Some(reminder) = reminders
            .iter_mut()
            .find(|reminder| reminder.id.as_str() == reminder_id)
        else {
            return Err(Error::InvalidInput(format!(
                "unknown reminder: {reminder_id}"
            )));
        };

        reminder.done = true;
        reminder.updated_at = unix_timestamp_ms();
        self.save_reminders(&reminders).await
    }

    // ------------------------------------------------------------------
    // inventory
    // ------------------------------------------------------------------

    pub async fn inventory(&self) -> Result<Vec<InventoryItem>> {
        self.get_collection(keys::INVENTORY).await
    }

    pub async fn save_inventory(&self, items: &[InventoryItem]) -> Result<()> {
        self.put_collection(keys::INVENTORY, items).await
    }

    pub async fn add_item(&self, item: InventoryItem) -> Result<()> {
        let mut items = self.inventory().await?;
        items.push(item);
        self.save_inventory(&items).await
    }

    pub async fn stock_movements(&self) -> Result<Vec<StockMovement>> {
        self.get_collection(keys::STOCK_MOVEMENTS).await
    }

    pub async fn save_stock_movements(&self, movements: &[StockMovement]) -> Result<()> {
        self.put_collection(keys::STOCK_MOVEMENTS, movements).await
    }

    /// Record a movement and adjust the referenced item's quantity
    pub async fn record_movement(&self, movement: StockMovement) -> Result<()> {
        let mut items = self.inventory().await?;
        let Some(item) = items.iter_mut().find(|item| item.id == movement.item_id) else {
            return Err(Error::InvalidInput(format!(
                "unknown inventory item: {}",
                movement.item_id
            )));
        };

        item.quantity += movement.signed_quantity();
        item.updated_at = unix_timestamp_ms();

        let mut movements = self.stock_movements().await?;
        movements.push(movement);

        self.write_collection(keys::INVENTORY, &items).await?;
        self.put_collection(keys::STOCK_MOVEMENTS, &movements).await
    }

    // ------------------------------------------------------------------
    // events & custom categories
    // ------------------------------------------------------------------

    pub async fn events(&self) -> Result<Vec<TempleEvent>> {
        self.get_collection(keys::EVENTS).await
    }

    pub async fn save_events(&self, events: &[TempleEvent]) -> Result<()> {
        self.put_collection(keys::EVENTS, events).await
    }

    pub async fn add_event(&self, event: TempleEvent) -> Result<()> {
        let mut events = self.events().await?;
        events.push(event);
        self.save_events(&events).await
    }

    pub async fn custom_categories(&self) -> Result<Vec<CustomCategory>> {
        self.get_collection(keys::CUSTOM_CATEGORIES).await
    }

    pub async fn save_custom_categories(&self, categories: &[CustomCategory]) -> Result<()> {
        self.put_collection(keys::CUSTOM_CATEGORIES, categories)
            .await
    }

    pub async fn add_custom_category(&self, category: CustomCategory) -> Result<()> {
        let mut categories = self.custom_categories().await?;
        categories.push(category);
        self.save_custom_categories(&categories).await
    }

    // ------------------------------------------------------------------
    // conflict log
    // ------------------------------------------------------------------

    pub async fn conflicts(&self) -> Result<Vec<ConflictEntry>> {
        self.get_collection(keys::CONFLICT_LOG).await
    }

    /// Append a resolved conflict, keeping the most recent entries only
    pub async fn append_conflict(&self, entry: ConflictEntry) -> Result<()> {
        let mut log: Vec<ConflictEntry> = self.get_collection(keys::CONFLICT_LOG).await?;
        log.push(entry);
        if log.len() > CONFLICT_LOG_RETENTION {
            let excess = log.len() - CONFLICT_LOG_RETENTION;
            log.drain(..excess);
        }
        self.write_collection(keys::CONFLICT_LOG, &log).await
    }

    // ------------------------------------------------------------------
    // snapshot & envelope application
    // ------------------------------------------------------------------

    /// Collect all collections into a fresh envelope.
    ///
    /// `last_modified` carries the store's marker so it reflects the most
    /// recent collection mutation, not the snapshot instant.
    pub async fn snapshot(&self) -> Result<SyncEnvelope> {
        let last_modified = match self.last_modified().await? {
            Some(marker) => marker,
            None => unix_timestamp_ms(),
        };

        Ok(SyncEnvelope {
            device_id: self.device_id().await?,
            last_modified,
            version: ENVELOPE_VERSION.to_string(),
            records: self.records().await?,
            believers: self.believers().await?,
            reminders: self.reminders().await?,
            inventory: self.inventory().await?,
            stock_movements: self.stock_movements().await?,
            events: self.events().await?,
            custom_categories: self.custom_categories().await?,
        })
    }

    /// Replace every collection with the envelope's contents.
    ///
    /// The current state is backed up first; collections absent from the
    /// envelope become empty. The last-modified marker is aligned with the
    /// envelope so an automatic sync does not immediately push back.
    pub async fn apply_envelope(&self, envelope: &SyncEnvelope) -> Result<()> {
        self.backup_local_data().await?;

        self.write_collection(keys::RECORDS, &envelope.records)
            .await?;
        self.write_collection(keys::BELIEVERS, &envelope.believers)
            .await?;
        self.write_collection(keys::REMINDERS, &envelope.reminders)
            .await?;
        self.write_collection(keys::INVENTORY, &envelope.inventory)
            .await?;
        self.write_collection(keys::STOCK_MOVEMENTS, &envelope.stock_movements)
            .await?;
        self.write_collection(keys::EVENTS, &envelope.events)
            .await?;
        self.write_collection(keys::CUSTOM_CATEGORIES, &envelope.custom_categories)
            .await?;

        self.set_last_modified(envelope.last_modified).await
    }

    // ------------------------------------------------------------------
    // rolling backups
    // ------------------------------------------------------------------

    /// Snapshot the current state under a timestamped backup key and
    /// evict the oldest entries beyond the retention bound
    pub async fn backup_local_data(&self) -> Result<String> {
        let snapshot = self.snapshot().await?;
        let key = format!(
            "{}{:013}",
            keys::BACKUP_PREFIX,
            unix_timestamp_ms().max(0)
        );
        self.set_raw(&key, &serde_json::to_string(&snapshot)?)
            .await?;

        let backups = self.backup_keys().await?;
        if backups.len() > BACKUP_RETENTION {
            for stale in &backups[..backups.len() - BACKUP_RETENTION] {
                self.remove_raw(stale).await?;
            }
        }

        Ok(key)
    }

    /// Backup keys ordered oldest first
    pub async fn backup_keys(&self) -> Result<Vec<String>> {
        self.keys_with_prefix(keys::BACKUP_PREFIX).await
    }

    /// Load a backup envelope by key
    pub async fn backup(&self, key: &str) -> Result<SyncEnvelope> {
        let Some(raw) = self.get_raw(key).await? else {
            return Err(Error::InvalidInput(format!("unknown backup: {key}")));
        };
        Ok(serde_json::from_str(&raw)?)
    }
}
