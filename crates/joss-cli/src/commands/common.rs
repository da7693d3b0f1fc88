use std::env;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use joss_core::models::{ConflictEntry, FinancialRecord, RecordKind};
use joss_core::sync::{
    ConflictChoice, ConflictContext, ConflictResolver, SyncCoordinator, Transport,
};
use joss_core::LocalStore;

use crate::cli::{ConflictPreference, RecordKindArg};
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

/// Coordinator type every sync command operates on
pub type CliCoordinator = SyncCoordinator<Transport, CliConflictResolver>;

#[derive(Debug, Serialize)]
pub struct RecordListItem {
    pub id: String,
    pub kind: String,
    pub category: String,
    pub amount: i64,
    pub date: i64,
    pub relative_time: String,
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConflictItem {
    pub remote_last_modified: i64,
    pub local_last_modified: i64,
    pub resolved_at: i64,
    pub resolved_at_iso: String,
    pub choice: String,
}

/// Resolves push conflicts per the user's `--prefer` flag, prompting on
/// stdin by default
pub enum CliConflictResolver {
    Prompt,
    PreferLocal,
    PreferRemote,
}

impl From<ConflictPreference> for CliConflictResolver {
    fn from(preference: ConflictPreference) -> Self {
        match preference {
            ConflictPreference::Ask => Self::Prompt,
            ConflictPreference::Local => Self::PreferLocal,
            ConflictPreference::Remote => Self::PreferRemote,
        }
    }
}

impl ConflictResolver for CliConflictResolver {
    fn resolve(&self, context: &ConflictContext) -> ConflictChoice {
        match self {
            Self::PreferLocal => ConflictChoice::OverwriteRemote,
            Self::PreferRemote => ConflictChoice::LoadRemote,
            Self::Prompt => prompt_conflict(context),
        }
    }
}

/// Blocking stdin prompt for the push conflict choice.
///
/// Anything other than an explicit overwrite keeps the remote state, so
/// the safe answer is also the default.
fn prompt_conflict(context: &ConflictContext) -> ConflictChoice {
    println!("Cloud data is newer than this device's data.");
    println!(
        "  cloud last modified: {}",
        format_sync_timestamp(context.remote_last_modified)
    );
    println!(
        "  local last modified: {}",
        format_sync_timestamp(context.local_last_modified)
    );
    print!("Overwrite cloud data? [y = overwrite / N = load cloud] ");
    let _ = io::stdout().flush();

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return ConflictChoice::LoadRemote;
    }
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => ConflictChoice::OverwriteRemote,
        _ => ConflictChoice::LoadRemote,
    }
}

/// Simple yes/no confirmation, defaulting to no
pub fn prompt_yes_no(question: &str) -> io::Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

pub async fn open_store(db_path: &Path) -> Result<LocalStore, CliError> {
    Ok(LocalStore::open(db_path).await?)
}

/// Open the store and assemble a coordinator over the selected transport
pub async fn open_coordinator(
    db_path: &Path,
    profile: Option<&str>,
    preference: ConflictPreference,
) -> Result<CliCoordinator, CliError> {
    let store = open_store(db_path).await?;

    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile);
    let remote_config = match config.profile(&profile_name) {
        Some(profile) => profile.remote_config().map_err(CliError::Config)?,
        None => None,
    };
    if remote_config.is_some() {
        tracing::info!("Remote sync configured via profile '{profile_name}'");
    }

    let transport = Transport::select(remote_config, &store).await?;
    Ok(SyncCoordinator::new(store, transport, preference.into()))
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("JOSS_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| panic!("Failed to resolve CLI data directory"))
        .join("joss")
        .join("joss.db")
}

pub const fn record_kind(arg: RecordKindArg) -> RecordKind {
    match arg {
        RecordKindArg::Income => RecordKind::Income,
        RecordKindArg::Expense => RecordKind::Expense,
    }
}

/// Parse a whole positive currency amount
pub fn parse_amount(raw: &str) -> Result<i64, CliError> {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(amount) if amount > 0 => Ok(amount),
        _ => Err(CliError::InvalidAmount(raw.to_string())),
    }
}

pub fn record_to_list_item(record: &FinancialRecord) -> RecordListItem {
    let now_ms = Utc::now().timestamp_millis();
    RecordListItem {
        id: record.id.to_string(),
        kind: record.kind.to_string(),
        category: record.category.clone(),
        amount: record.amount,
        date: record.date,
        relative_time: format_relative_time(record.date, now_ms),
        note: record.note.clone(),
    }
}

pub fn format_record_lines(records: &[FinancialRecord]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    records
        .iter()
        .map(|record| {
            let id = record.id.to_string();
            let short_id = id.chars().take(13).collect::<String>();
            let signed = record.signed_amount();
            let amount = format!("{signed:+}");
            let relative_time = format_relative_time(record.date, now_ms);

            match record.note.as_deref() {
                Some(note) => format!(
                    "{short_id:<13}  {amount:>10}  {:<16}  {relative_time:<10}  {note}",
                    record.category
                ),
                None => format!(
                    "{short_id:<13}  {amount:>10}  {:<16}  {relative_time}",
                    record.category
                ),
            }
        })
        .collect()
}

pub fn conflict_to_item(conflict: &ConflictEntry) -> ConflictItem {
    ConflictItem {
        remote_last_modified: conflict.remote_last_modified,
        local_last_modified: conflict.local_last_modified,
        resolved_at: conflict.resolved_at,
        resolved_at_iso: format_sync_timestamp(conflict.resolved_at),
        choice: conflict.choice.clone(),
    }
}

pub fn format_conflict_lines(conflicts: &[ConflictEntry]) -> Vec<String> {
    conflicts
        .iter()
        .map(|conflict| {
            format!(
                "{}  {:<16}  remote={} local={}",
                format_sync_timestamp(conflict.resolved_at),
                conflict.choice,
                conflict.remote_last_modified,
                conflict.local_last_modified
            )
        })
        .collect()
}

pub fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}
