use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "joss")]
#[command(about = "Temple donation and expense ledger with multi-device sync")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, value_name = "PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// CLI profile name for remote sync configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a donation or expense
    #[command(alias = "new")]
    Add {
        /// Income or expense
        #[arg(value_enum)]
        kind: RecordKindArg,
        /// Category name
        category: String,
        /// Amount in whole currency units
        amount: String,
        /// Optional believer (donor) id
        #[arg(long, value_name = "ID")]
        believer: Option<String>,
        /// Optional free-form note
        #[arg(long)]
        note: Option<String>,
    },
    /// List ledger records, newest first
    List {
        /// Number of records to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Filter by record kind
        #[arg(long, value_enum)]
        kind: Option<RecordKindArg>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Synchronize with the configured backend
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
    /// Export the full ledger as a JSON envelope
    Export {
        /// Output path (stdout when omitted; directories get a dated file name)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Import a previously exported JSON envelope
    Import {
        /// Path to the export file
        path: PathBuf,
    },
    /// Configure CLI sync profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum RecordKindArg {
    Income,
    Expense,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ConflictPreference {
    /// Ask interactively (default)
    Ask,
    /// Keep local state, overwriting the newer remote row
    Local,
    /// Load the newer remote state, discarding the push
    Remote,
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Push local state to the backend
    Push {
        /// How to resolve a newer remote row
        #[arg(long, value_enum, default_value_t = ConflictPreference::Ask)]
        prefer: ConflictPreference,
    },
    /// Pull an envelope from the backend and overwrite local state
    Pull {
        /// Pull another device's data instead of this device's
        #[arg(long, value_name = "DEVICE_ID")]
        device: Option<String>,
    },
    /// Show sync status
    Status,
    /// Push automatically if local changes are newer than the last sync
    Auto,
    /// Print this device's share URL for the QR handshake
    Share {
        /// Base URL the share link points at
        #[arg(long, value_name = "URL", default_value = "https://joss.page")]
        base_url: String,
    },
    /// Accept a share URL from another device and pull its data
    Link {
        /// Shared URL (scanned from a QR code)
        url: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// List recently resolved sync conflicts
    Conflicts {
        /// Number of conflicts to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update a sync profile
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Remote backend project URL
        #[arg(long, value_name = "URL")]
        remote_url: Option<String>,
        /// Remote backend publishable API key
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,
        /// Remote sync table name
        #[arg(long, value_name = "NAME")]
        table: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Show the resolved profile
    Show {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
}
