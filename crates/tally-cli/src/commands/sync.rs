use tally_core::{SyncOutcome, SyncReport};

use crate::commands::common::Context;
use crate::error::CliError;

pub async fn run_sync(ctx: &Context, as_json: bool) -> Result<SyncOutcome, CliError> {
    ctx.require_remote()?;
    let outcome = ctx.engine.sync_now().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(outcome);
    }

    match &outcome {
        SyncOutcome::Completed(report) => println!("{}", format_report(report)),
        SyncOutcome::Skipped { reason } => println!("Sync skipped: {reason}"),
    }
    Ok(outcome)
}

pub fn format_report(report: &SyncReport) -> String {
    let mut line = format!(
        "Sync completed: pulled {} records, {} categories; pushed {}",
        report.records_pulled, report.categories_pulled, report.pushed
    );
    if report.conflicts > 0 {
        line.push_str(&format!(
            "; {} conflicts (see `tally conflicts list`)",
            report.conflicts
        ));
    }
    if report.retried > 0 {
        line.push_str(&format!("; {} will retry", report.retried));
    }
    if report.dropped > 0 {
        line.push_str(&format!("; {} dropped after repeated failures", report.dropped));
    }
    line
}
