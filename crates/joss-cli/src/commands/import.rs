use std::path::Path;

use joss_core::export::import_envelope;

use crate::commands::common::open_store;
use crate::error::CliError;

pub async fn run_import(path: &Path, db_path: &Path) -> Result<(), CliError> {
    let payload = std::fs::read_to_string(path)?;

    let store = open_store(db_path).await?;
    let envelope = import_envelope(&store, &payload).await?;

    println!(
        "Imported {} entries ({} records, {} believers)",
        envelope.entry_count(),
        envelope.records.len(),
        envelope.believers.len()
    );
    Ok(())
}
