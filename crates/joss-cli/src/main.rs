//! Joss CLI - temple ledger from the terminal
//!
//! Record donations and expenses, keep devices in sync, and move data
//! between installations with export/import or the QR handshake.

mod cli;
mod commands;
mod config_profiles;
mod error;
#[cfg(test)]
mod tests;

use clap::Parser;

use crate::cli::{Cli, Commands, ConfigCommands, SyncCommands};
use crate::commands::add::run_add;
use crate::commands::common::resolve_db_path;
use crate::commands::completions::run_completions;
use crate::commands::config::{run_config_init, run_config_show, ConfigInitArgs};
use crate::commands::export::run_export;
use crate::commands::import::run_import;
use crate::commands::list::run_list;
use crate::commands::sync::{
    run_sync_auto, run_sync_conflicts, run_sync_link, run_sync_pull, run_sync_push,
    run_sync_share, run_sync_status,
};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("joss_core=info".parse().unwrap())
                .add_directive("joss_cli=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path.clone());
    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::Add {
            kind,
            category,
            amount,
            believer,
            note,
        } => run_add(kind, &category, &amount, believer, note, &db_path).await?,
        Commands::List { limit, kind, json } => run_list(limit, kind, json, &db_path).await?,
        Commands::Sync { command } => match command {
            SyncCommands::Push { prefer } => run_sync_push(prefer, profile, &db_path).await?,
            SyncCommands::Pull { device } => {
                run_sync_pull(device.as_deref(), profile, &db_path).await?;
            }
            SyncCommands::Status => run_sync_status(profile, &db_path).await?,
            SyncCommands::Auto => run_sync_auto(profile, &db_path).await?,
            SyncCommands::Share { base_url } => {
                run_sync_share(&base_url, profile, &db_path).await?;
            }
            SyncCommands::Link { url, yes } => {
                run_sync_link(&url, yes, profile, &db_path).await?;
            }
            SyncCommands::Conflicts { limit, json } => {
                run_sync_conflicts(limit, json, &db_path).await?;
            }
        },
        Commands::Export { output } => run_export(output.as_deref(), &db_path).await?,
        Commands::Import { path } => run_import(&path, &db_path).await?,
        Commands::Config { command } => match command {
            ConfigCommands::Init {
                profile: init_profile,
                remote_url,
                api_key,
                table,
                no_activate,
            } => run_config_init(ConfigInitArgs {
                profile: init_profile.or_else(|| profile.map(ToString::to_string)),
                remote_url,
                api_key,
                table,
                no_activate,
            })?,
            ConfigCommands::Show {
                profile: show_profile,
            } => run_config_show(show_profile.as_deref().or(profile))?,
        },
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref())?,
    }

    Ok(())
}
