//! Tally CLI - track income and expenses from the terminal
//!
//! Every write lands in the local store first and syncs when the record
//! service is reachable.

mod cli;
mod commands;
mod error;
mod remote;

#[cfg(test)]
mod tests;

use clap::Parser;

use crate::cli::{Cli, Commands, ConflictCommands};
use crate::commands::add::run_add;
use crate::commands::common::{resolve_db_path, resolve_settings, Context};
use crate::commands::conflicts::{run_conflicts_list, run_conflicts_resolve};
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::list::run_list;
use crate::commands::queue::run_queue;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::commands::watch::run_watch;
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

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "tally=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);
    let settings = resolve_settings(cli.api_url);
    let ctx = Context::open(&db_path, settings).await?;

    match cli.command {
        Commands::Add(args) => {
            run_add(&ctx, args).await?;
        }
        Commands::List { limit, kind, json } => run_list(&ctx, limit, kind, json).await?,
        Commands::Edit(args) => run_edit(&ctx, args).await?,
        Commands::Delete { id } => run_delete(&ctx, &id).await?,
        Commands::Queue { json } => run_queue(&ctx, json).await?,
        Commands::Sync { json } => {
            run_sync(&ctx, json).await?;
        }
        Commands::Status { json } => run_status(&ctx, json).await?,
        Commands::Conflicts { command } => match command {
            ConflictCommands::List { all, json } => run_conflicts_list(&ctx, all, json).await?,
            ConflictCommands::Resolve { id, keep } => {
                run_conflicts_resolve(&ctx, &id, keep.into()).await?;
            }
        },
        Commands::Watch => run_watch(&ctx).await?,
    }

    Ok(())
}
