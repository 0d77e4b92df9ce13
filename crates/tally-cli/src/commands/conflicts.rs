use chrono::Utc;
use tally_core::{ConflictRecord, Resolution};

use crate::commands::common::{format_conflict_lines, Context};
use crate::error::CliError;

pub async fn run_conflicts_list(ctx: &Context, all: bool, as_json: bool) -> Result<(), CliError> {
    let filter = if all { None } else { Some(false) };
    let conflicts = ctx.engine.ledger().list(filter).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&conflicts)?);
        return Ok(());
    }

    if conflicts.is_empty() {
        println!("No sync conflicts recorded.");
        return Ok(());
    }

    for line in format_conflict_lines(&conflicts, Utc::now()) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_conflicts_resolve(
    ctx: &Context,
    id: &str,
    resolution: Resolution,
) -> Result<ConflictRecord, CliError> {
    ctx.require_remote()?;
    let resolved = ctx.engine.resolve_conflict(id.trim(), resolution).await?;
    println!("{} resolved ({resolution})", resolved.id);
    Ok(resolved)
}
