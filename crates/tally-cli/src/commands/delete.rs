use crate::commands::common::{parse_entity_id, Context};
use crate::error::CliError;

pub async fn run_delete(ctx: &Context, id: &str) -> Result<(), CliError> {
    let id = parse_entity_id(id);
    let record = ctx.find_record(&id).await?;

    ctx.engine.queue_delete(record.id.clone()).await?;
    println!("{}", record.id);
    Ok(())
}
