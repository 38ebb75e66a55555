//! On-demand reconciliation pass.

use anyhow::Result;
use chrono::Utc;

use wa_core::day::{is_weekend, target_day};

use crate::app::{App, RUN_ACTION};

/// Runs one reconciliation batch for the day `days_ago` days back.
///
/// Unlike the schedule, whose weekday range never lands on a weekend
/// target, an on-demand run can point at one, so the day is checked
/// here before any tracker traffic.
pub async fn run(app: &App, actor: &str, days_ago: u32) -> Result<()> {
    app.limiter.check(actor, RUN_ACTION)?;

    let day = target_day(Utc::now(), app.rule.utc_offset, days_ago);
    if is_weekend(day) {
        println!("{day} is a weekend, nothing to reconcile");
        return Ok(());
    }

    let delivered = app.engine.run_batch(day, days_ago).await;
    println!("Reconciled {delivered} user(s) for {day}");
    Ok(())
}
