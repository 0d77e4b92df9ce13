use chrono::Utc;

use crate::commands::common::{format_queue_lines, queue_entry_to_item, Context, QueueItem};
use crate::error::CliError;

pub async fn run_queue(ctx: &Context, as_json: bool) -> Result<(), CliError> {
    let entries = ctx.engine.queue().list().await?;

    if as_json {
        let json_items = entries
            .iter()
            .map(queue_entry_to_item)
            .collect::<Vec<QueueItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Nothing waiting to sync.");
        return Ok(());
    }

    for line in format_queue_lines(&entries, Utc::now()) {
        println!("{line}");
    }
    Ok(())
}
