use std::path::Path;

use chrono::Utc;

use joss_core::export::{export_envelope, suggested_export_file_name};

use crate::commands::common::open_store;
use crate::error::CliError;

pub async fn run_export(output_path: Option<&Path>, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let rendered = export_envelope(&store).await?;

    match output_path {
        Some(path) if path.is_dir() => {
            let file_name = suggested_export_file_name(Utc::now().date_naive());
            let target = path.join(file_name);
            std::fs::write(&target, rendered)?;
            println!("{}", target.display());
        }
        Some(path) => {
            std::fs::write(path, rendered)?;
            println!("{}", path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}
