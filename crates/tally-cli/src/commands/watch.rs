use std::sync::Arc;

use chrono::Utc;
use tally_core::spawn_reachability_probe;
use tokio_util::sync::CancellationToken;

use crate::commands::common::{format_status_line, Context};
use crate::error::CliError;

pub async fn run_watch(ctx: &Context) -> Result<(), CliError> {
    ctx.require_remote()?;

    let probe_token = CancellationToken::new();
    let probe = spawn_reachability_probe(
        Arc::clone(&ctx.remote),
        ctx.engine.connectivity().clone(),
        ctx.engine.settings().probe_interval,
        probe_token.clone(),
    );
    let auto_sync = ctx.engine.start_auto_sync();
    let mut status = ctx.engine.subscribe();

    println!("{}", format_status_line(&ctx.engine.status(), Utc::now()));
    println!("Watching for changes; press Ctrl-C to stop.");

    let result = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => break signal.map_err(CliError::from),
            changed = status.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let snapshot = status.borrow_and_update().clone();
                println!("{}", format_status_line(&snapshot, Utc::now()));
            }
        }
    };

    auto_sync.cancel();
    probe_token.cancel();
    probe.await?;
    result
}
