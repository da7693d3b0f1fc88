//! Sync conflict log entry model

use serde::{Deserialize, Serialize};

/// Recorded sync conflict resolved by user choice during a push
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictEntry {
    /// Remote row's timestamp when the conflict was detected
    pub remote_last_modified: i64,
    /// Local snapshot's timestamp at the same moment
    pub local_last_modified: i64,
    /// Resolution timestamp (unix ms)
    pub resolved_at: i64,
    /// Resolution choice name ("overwrite-remote" or "load-remote")
    pub choice: String,
}
