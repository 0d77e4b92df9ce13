use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use tally_core::{RecordKind, Resolution};

use crate::commands::common::{parse_amount, parse_date, parse_kind};

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Track income and expenses offline, sync when you can")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Record service base URL (overrides TALLY_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a new income or expense
    #[command(alias = "new")]
    Add(AddArgs),
    /// List cached records, newest first
    List {
        /// Number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Only show one kind of record
        #[arg(short, long, value_parser = parse_kind)]
        kind: Option<RecordKind>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change fields of an existing record
    Edit(EditArgs),
    /// Delete a record
    Delete {
        /// Record ID
        id: String,
    },
    /// Show local changes waiting to be pushed
    Queue {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Pull from and push to the record service once
    Sync {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show connectivity, pending changes and last sync time
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Inspect and resolve sync conflicts
    Conflicts {
        #[command(subcommand)]
        command: ConflictCommands,
    },
    /// Keep syncing in the background until Ctrl-C
    Watch,
}

#[derive(Args)]
pub struct AddArgs {
    /// Amount, e.g. 12.50
    #[arg(value_parser = parse_amount)]
    pub amount: Decimal,
    /// income or expense
    #[arg(short, long, default_value = "expense", value_parser = parse_kind)]
    pub kind: RecordKind,
    /// Occurrence date (YYYY-MM-DD, defaults to today)
    #[arg(short, long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
    /// Category ID
    #[arg(short, long)]
    pub category: Option<String>,
    /// Free-form note
    #[arg(short, long)]
    pub note: Option<String>,
    /// Owning user ID
    #[arg(long, default_value = "1")]
    pub user: String,
}

#[derive(Args)]
pub struct EditArgs {
    /// Record ID
    pub id: String,
    /// New amount
    #[arg(short, long, value_parser = parse_amount)]
    pub amount: Option<Decimal>,
    /// New kind
    #[arg(short, long, value_parser = parse_kind)]
    pub kind: Option<RecordKind>,
    /// New occurrence date (YYYY-MM-DD)
    #[arg(short, long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
    /// New category ID
    #[arg(short, long)]
    pub category: Option<String>,
    /// New note (empty string clears it)
    #[arg(short, long)]
    pub note: Option<String>,
}

#[derive(Subcommand)]
pub enum ConflictCommands {
    /// List conflicts (unresolved only unless --all)
    List {
        /// Include resolved conflicts
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Settle a conflict by keeping one version
    Resolve {
        /// Conflict ID
        id: String,
        /// Version to keep
        #[arg(long = "use", value_enum)]
        keep: KeepVersion,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum KeepVersion {
    Local,
    Server,
}

impl From<KeepVersion> for Resolution {
    fn from(keep: KeepVersion) -> Self {
        match keep {
            KeepVersion::Local => Self::UseLocal,
            KeepVersion::Server => Self::UseServer,
        }
    }
}
