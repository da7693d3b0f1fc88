use std::path::Path;

use joss_core::handshake::{parse_share_url, share_url};
use joss_core::sync::{SyncAction, SyncReport};

use crate::cli::ConflictPreference;
use crate::commands::common::{
    conflict_to_item, format_conflict_lines, format_sync_timestamp, open_coordinator, open_store,
    prompt_yes_no, ConflictItem,
};
use crate::error::CliError;

pub async fn run_sync_push(
    preference: ConflictPreference,
    profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let coordinator = open_coordinator(db_path, profile, preference).await?;
    let report = coordinator.sync_to_cloud().await?;
    print_report(&report);
    Ok(())
}

pub async fn run_sync_pull(
    device: Option<&str>,
    profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let coordinator = open_coordinator(db_path, profile, ConflictPreference::Ask).await?;
    let report = coordinator.sync_from_cloud(device).await?;
    print_report(&report);
    Ok(())
}

pub async fn run_sync_status(profile: Option<&str>, db_path: &Path) -> Result<(), CliError> {
    let coordinator = open_coordinator(db_path, profile, ConflictPreference::Ask).await?;
    let status = coordinator.status().await?;

    println!("device    {}", status.device_id);
    println!("provider  {}", status.provider);
    println!(
        "last sync {}",
        status
            .last_sync
            .map_or_else(|| "never".to_string(), format_sync_timestamp)
    );
    Ok(())
}

pub async fn run_sync_auto(profile: Option<&str>, db_path: &Path) -> Result<(), CliError> {
    let coordinator = open_coordinator(db_path, profile, ConflictPreference::Ask).await?;
    if coordinator.auto_sync().await {
        println!("Pushed local changes");
    } else {
        println!("Nothing to sync");
    }
    Ok(())
}

pub async fn run_sync_share(
    base_url: &str,
    profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let coordinator = open_coordinator(db_path, profile, ConflictPreference::Ask).await?;
    let status = coordinator.status().await?;
    let url = share_url(base_url, &status.device_id, status.provider)?;
    println!("{url}");
    Ok(())
}

pub async fn run_sync_link(
    url: &str,
    assume_yes: bool,
    profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let Some(handshake) = parse_share_url(url)? else {
        return Err(CliError::MissingHandshake);
    };

    let coordinator = open_coordinator(db_path, profile, ConflictPreference::Ask).await?;
    let own_device = coordinator.status().await?.device_id;
    if !handshake.is_foreign(&own_device) {
        return Err(CliError::OwnDeviceHandshake);
    }

    if !assume_yes {
        let confirmed = prompt_yes_no(&format!(
            "Pull data from device '{}'? This overwrites local data (a backup is kept first).",
            handshake.device_id
        ))?;
        if !confirmed {
            println!("Aborted");
            return Ok(());
        }
    }

    let report = coordinator
        .sync_from_cloud(Some(&handshake.device_id))
        .await?;
    print_report(&report);
    Ok(())
}

pub async fn run_sync_conflicts(
    limit: usize,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let mut conflicts = store.conflicts().await?;
    conflicts.reverse(); // newest first
    conflicts.truncate(limit);

    if as_json {
        let items = conflicts
            .iter()
            .map(conflict_to_item)
            .collect::<Vec<ConflictItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if conflicts.is_empty() {
        println!("No sync conflicts recorded.");
        return Ok(());
    }

    for line in format_conflict_lines(&conflicts) {
        println!("{line}");
    }
    Ok(())
}

fn print_report(report: &SyncReport) {
    let verb = match report.action {
        SyncAction::Created => "Created cloud data",
        SyncAction::Updated => "Updated cloud data",
        SyncAction::Loaded => "Loaded cloud data",
    };
    println!(
        "{verb} via {} ({} records, {} believers)",
        report.provider, report.record_count, report.believer_count
    );
}
