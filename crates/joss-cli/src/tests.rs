use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use joss_core::models::RecordKind;
use joss_core::LocalStore;
use pretty_assertions::assert_eq;

use crate::cli::{CompletionShell, ConflictPreference, RecordKindArg};
use crate::commands::add::run_add;
use crate::commands::common::{
    format_relative_time, format_sync_timestamp, parse_amount, record_kind,
};
use crate::commands::completions::run_completions;
use crate::commands::export::run_export;
use crate::commands::import::run_import;
use crate::commands::sync::{run_sync_pull, run_sync_push};
use crate::error::CliError;

#[test]
fn parse_amount_accepts_positive_integers() {
    assert_eq!(parse_amount(" 600 ").unwrap(), 600);
    assert!(matches!(
        parse_amount("0"),
        Err(CliError::InvalidAmount(_))
    ));
    assert!(matches!(
        parse_amount("-5"),
        Err(CliError::InvalidAmount(_))
    ));
    assert!(matches!(
        parse_amount("6.5"),
        Err(CliError::InvalidAmount(_))
    ));
}

#[test]
fn record_kind_maps_cli_args() {
    assert_eq!(record_kind(RecordKindArg::Income), RecordKind::Income);
    assert_eq!(record_kind(RecordKindArg::Expense), RecordKind::Expense);
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
}

#[test]
fn format_sync_timestamp_renders_utc() {
    assert_eq!(format_sync_timestamp(0), "1970-01-01 00:00:00 UTC");
}

#[tokio::test(flavor = "multi_thread")]
async fn add_persists_a_record() {
    let db_path = unique_test_db_path();

    run_add(
        RecordKindArg::Income,
        "incense",
        "600",
        None,
        Some("morning box".to_string()),
        &db_path,
    )
    .await
    .unwrap();

    let store = LocalStore::open(&db_path).await.unwrap();
    let records = store.records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].category, "incense");
    assert_eq!(records[0].amount, 600);
    assert_eq!(records[0].note.as_deref(), Some("morning box"));

    cleanup_db_files(&db_path);
}

#[tokio::test(flavor = "multi_thread")]
async fn add_rejects_blank_category() {
    let db_path = unique_test_db_path();

    let error = run_add(RecordKindArg::Income, "  ", "600", None, None, &db_path)
        .await
        .unwrap_err();
    assert!(matches!(error, CliError::EmptyCategory));

    cleanup_db_files(&db_path);
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_push_then_pull_round_trips_via_local_fallback() {
    let db_path = unique_test_db_path();

    run_add(RecordKindArg::Expense, "supplies", "250", None, None, &db_path)
        .await
        .unwrap();

    run_sync_push(ConflictPreference::Local, None, &db_path)
        .await
        .unwrap();
    run_sync_pull(None, None, &db_path).await.unwrap();

    let store = LocalStore::open(&db_path).await.unwrap();
    let records = store.records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].category, "supplies");

    cleanup_db_files(&db_path);
}

#[tokio::test(flavor = "multi_thread")]
async fn export_writes_envelope_file_and_import_reads_it_back() {
    let db_path = unique_test_db_path();

    run_add(RecordKindArg::Income, "donation", "8800", None, None, &db_path)
        .await
        .unwrap();

    let output_path = std::env::temp_dir().join(format!(
        "joss-export-test-{}.json",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_nanos())
    ));
    run_export(Some(&output_path), &db_path).await.unwrap();

    let exported = std::fs::read_to_string(&output_path).unwrap();
    assert!(exported.contains("\"donation\""));
    assert!(exported.contains("\"deviceId\""));

    let other_db_path = unique_test_db_path();
    run_import(&output_path, &other_db_path).await.unwrap();

    let other = LocalStore::open(&other_db_path).await.unwrap();
    assert_eq!(other.records().await.unwrap().len(), 1);

    let _ = std::fs::remove_file(output_path);
    cleanup_db_files(&db_path);
    cleanup_db_files(&other_db_path);
}

#[tokio::test(flavor = "multi_thread")]
async fn import_tolerates_missing_collections() {
    let db_path = unique_test_db_path();

    let payload_path = std::env::temp_dir().join(format!(
        "joss-import-test-{}.json",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_nanos())
    ));
    std::fs::write(
        &payload_path,
        r#"{"records": [], "believers": []}"#,
    )
    .unwrap();

    run_import(&payload_path, &db_path).await.unwrap();

    let store = LocalStore::open(&db_path).await.unwrap();
    assert!(store.reminders().await.unwrap().is_empty());

    let _ = std::fs::remove_file(payload_path);
    cleanup_db_files(&db_path);
}

#[test]
fn run_completions_writes_bash_script_file() {
    let output_path = std::env::temp_dir().join(format!(
        "joss-completions-test-{}.bash",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_nanos())
    ));

    run_completions(CompletionShell::Bash, Some(&output_path)).unwrap();

    let script = std::fs::read_to_string(&output_path).unwrap();
    assert!(script.contains("_joss()"));
    assert!(script.contains("complete -F _joss"));

    let _ = std::fs::remove_file(output_path);
}

fn unique_test_db_path() -> PathBuf {
    static NEXT_TEST_DB_ID: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    let sequence = NEXT_TEST_DB_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("joss-cli-test-{timestamp}-{sequence}.db"))
}

fn cleanup_db_files(path: &PathBuf) {
    let _ = std::fs::remove_file(path);
    let _ = std::fs::remove_file(path.with_extension("db-shm"));
    let _ = std::fs::remove_file(path.with_extension("db-wal"));
}
