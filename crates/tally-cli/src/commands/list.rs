use tally_core::{Record, RecordKind};

use crate::commands::common::{format_record_lines, Context};
use crate::error::CliError;

pub async fn list_records(
    ctx: &Context,
    limit: usize,
    kind: Option<RecordKind>,
) -> Result<Vec<Record>, CliError> {
    let mut records: Vec<Record> = match kind {
        Some(kind) => {
            ctx.engine
                .store()
                .get_all_by_index("kind", kind.as_str().to_string())
                .await?
        }
        None => ctx.engine.store().get_all().await?,
    };
    records.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.created_at.cmp(&a.created_at)));
    records.truncate(limit);
    Ok(records)
}

pub async fn run_list(
    ctx: &Context,
    limit: usize,
    kind: Option<RecordKind>,
    as_json: bool,
) -> Result<(), CliError> {
    let records = list_records(ctx, limit, kind).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        println!("No records yet.");
    } else {
        for line in format_record_lines(&records) {
            println!("{line}");
        }
    }

    Ok(())
}
