//! Resilience state report.

use crate::app::App;

/// Prints circuit breaker and rate limiter state.
pub fn run(app: &App) {
    let breaker = app.engine.reconciler().breaker().stats();
    println!(
        "Circuit breaker: {}",
        if breaker.open { "open" } else { "closed" }
    );
    println!("  consecutive failures: {}", breaker.consecutive_failures);
    if let Some(remaining) = breaker.recovery_remaining {
        println!("  next probe in: {}s", remaining.as_secs());
    }

    let limiter = app.limiter.statistics();
    println!("Rate limiter: {} rule(s)", limiter.rules);
    println!("  tracked records: {}", limiter.tracked_records);
    println!("  currently blocked: {}", limiter.currently_blocked);
}
