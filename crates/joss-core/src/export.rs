//! Envelope export and import helpers shared by all clients.

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::store::LocalStore;
use crate::sync::envelope::SyncEnvelope;
use crate::util::unix_timestamp_ms;

/// Render an envelope as pretty-printed JSON.
pub fn render_envelope_export(envelope: &SyncEnvelope) -> serde_json::Result<String> {
    serde_json::to_string_pretty(envelope)
}

/// Parse a user-supplied export file back into an envelope.
///
/// Collections missing from the payload come back empty; anything that is
/// not an envelope-shaped JSON document is a format error.
pub fn parse_envelope_import(payload: &str) -> Result<SyncEnvelope> {
    serde_json::from_str(payload).map_err(|error| Error::Format(error.to_string()))
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(date: NaiveDate) -> String {
    format!("joss-export-{}.json", date.format("%Y-%m-%d"))
}

/// Snapshot the store and render it for download.
pub async fn export_envelope(store: &LocalStore) -> Result<String> {
    let envelope = store.snapshot().await?;
    Ok(render_envelope_export(&envelope)?)
}

/// Import an export file: parse, back up current state, overwrite local
/// collections, and advance the last-sync marker.
///
/// Returns the applied envelope so callers can report entry counts.
pub async fn import_envelope(store: &LocalStore, payload: &str) -> Result<SyncEnvelope> {
    let envelope = parse_envelope_import(payload)?;
    store.apply_envelope(&envelope).await?;
    store.set_last_sync(unix_timestamp_ms()).await?;
    Ok(envelope)
}
