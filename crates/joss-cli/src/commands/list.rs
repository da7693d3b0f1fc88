use std::path::Path;

use joss_core::models::{FinancialRecord, RecordKind};

use crate::cli::RecordKindArg;
use crate::commands::common::{
    format_record_lines, open_store, record_kind, record_to_list_item, RecordListItem,
};
use crate::error::CliError;

pub async fn run_list(
    limit: usize,
    kind: Option<RecordKindArg>,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let mut records = store.records().await?;

    if let Some(kind) = kind {
        let wanted = record_kind(kind);
        records.retain(|record| record.kind == wanted);
    }
    records.sort_by(|a, b| b.date.cmp(&a.date));
    records.truncate(limit);

    if as_json {
        let items = records
            .iter()
            .map(record_to_list_item)
            .collect::<Vec<RecordListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No records yet.");
        return Ok(());
    }

    for line in format_record_lines(&records) {
        println!("{line}");
    }

    let (income, expense) = totals(&records);
    println!();
    println!("income {income}  expense {expense}  balance {:+}", income - expense);
    Ok(())
}

fn totals(records: &[FinancialRecord]) -> (i64, i64) {
    records.iter().fold((0, 0), |(income, expense), record| {
        match record.kind {
            RecordKind::Income => (income + record.amount, expense),
            RecordKind::Expense => (income, expense + record.amount),
        }
    })
}
