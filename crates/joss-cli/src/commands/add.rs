use std::path::Path;

use joss_core::models::FinancialRecord;
use joss_core::util::normalize_text_option;

use crate::cli::RecordKindArg;
use crate::commands::common::{open_store, parse_amount, record_kind};
use crate::error::CliError;

pub async fn run_add(
    kind: RecordKindArg,
    category: &str,
    amount: &str,
    believer: Option<String>,
    note: Option<String>,
    db_path: &Path,
) -> Result<(), CliError> {
    let category = category.trim();
    if category.is_empty() {
        return Err(CliError::EmptyCategory);
    }
    let amount = parse_amount(amount)?;

    let mut record = FinancialRecord::new(record_kind(kind), category, amount);
    record.believer_id = normalize_text_option(believer);
    record.note = normalize_text_option(note);

    let store = open_store(db_path).await?;
    let record_id = record.id;
    store.add_record(record).await?;

    println!("{record_id}");
    Ok(())
}
