use chrono::Local;
use tally_core::{EntityId, Record};

use crate::cli::AddArgs;
use crate::commands::common::{parse_entity_id, Context};
use crate::error::CliError;

pub async fn run_add(ctx: &Context, args: AddArgs) -> Result<EntityId, CliError> {
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let mut record = Record::new(parse_entity_id(&args.user), args.amount, args.kind, date);
    if let Some(category) = args.category.as_deref() {
        record = record.with_category(parse_entity_id(category));
    }
    if let Some(note) = args.note {
        record = record.with_note(note);
    }

    let id = record.id.clone();
    ctx.engine.queue_create(record).await?;

    println!("{id}");
    Ok(id)
}
