use tally_core::Record;

use crate::cli::EditArgs;
use crate::commands::common::{parse_entity_id, Context};
use crate::error::CliError;

/// Apply the requested field changes; returns `None` when nothing would change
pub fn apply_edits(record: &Record, args: &EditArgs) -> Option<Record> {
    let mut updated = record.clone();
    if let Some(amount) = args.amount {
        updated.amount = amount;
    }
    if let Some(kind) = args.kind {
        updated.kind = kind;
    }
    if let Some(date) = args.date {
        updated.date = date;
    }
    if let Some(category) = args.category.as_deref() {
        updated.category_id = Some(parse_entity_id(category));
    }
    if let Some(note) = args.note.as_deref() {
        let note = note.trim();
        updated.note = (!note.is_empty()).then(|| note.to_string());
    }

    (updated != *record).then_some(updated)
}

pub async fn run_edit(ctx: &Context, args: EditArgs) -> Result<(), CliError> {
    let id = parse_entity_id(&args.id);
    let record = ctx.find_record(&id).await?;

    let Some(updated) = apply_edits(&record, &args) else {
        return Err(CliError::NothingToUpdate);
    };

    ctx.engine.queue_update(id.clone(), updated).await?;
    println!("{id}");
    Ok(())
}
