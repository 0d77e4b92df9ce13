use chrono::Utc;

use crate::commands::common::{format_status_line, Context, StatusItem};
use crate::error::CliError;
use crate::remote::CliRemote;

pub async fn run_status(ctx: &Context, as_json: bool) -> Result<(), CliError> {
    ctx.engine.refresh_status().await;
    let status = ctx.engine.status();
    let api_url = match ctx.remote.as_ref() {
        CliRemote::Http(service) => Some(service.base_url().to_string()),
        CliRemote::Unconfigured => None,
    };

    if as_json {
        let item = StatusItem {
            state: status.state(),
            status,
            api_url,
        };
        println!("{}", serde_json::to_string_pretty(&item)?);
        return Ok(());
    }

    println!("{}", format_status_line(&status, Utc::now()));
    match api_url {
        Some(url) => println!("record service: {url}"),
        None => println!("record service: not configured (local only)"),
    }
    Ok(())
}
