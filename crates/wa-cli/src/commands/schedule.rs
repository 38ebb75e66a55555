//! Long-running scheduled mode.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::info;

use wa_engine::Scheduler;

use crate::app::App;

/// Starts the daily trigger and blocks until interrupted.
pub async fn run(app: App) -> Result<()> {
    let sweep = app.limiter.start_sweep(app.sweep_period);

    let scheduler = Arc::new(Scheduler::with_rule(
        Arc::clone(&app.engine),
        app.rule.clone(),
    ));
    let Some(trigger) = scheduler.start() else {
        bail!("schedule failed to start, check the cron rule: {}", app.rule.cron);
    };

    println!("Schedule running ({}), press Ctrl-C to stop", app.rule.cron);
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    info!("shutdown requested");
    trigger.abort();
    sweep.stop();
    Ok(())
}
