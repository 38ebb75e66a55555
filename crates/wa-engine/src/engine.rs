//! Batch runner: one pass over every active config.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info};

use wa_core::UserOutcome;

use crate::reconcile::Reconciler;
use crate::sink::ResultSink;
use crate::store::ConfigStore;

/// Wires the orchestrator to its collaborators.
pub struct Engine {
    reconciler: Reconciler,
    store: Arc<dyn ConfigStore>,
    sink: Arc<dyn ResultSink>,
}

impl Engine {
    pub fn new(
        reconciler: Reconciler,
        store: Arc<dyn ConfigStore>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            reconciler,
            store,
            sink,
        }
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Reconciles every active config for `day` and delivers one outcome
    /// per user to the sink.
    ///
    /// Users run sequentially to cap the aggregate request rate against
    /// the shared tracker. A failure for one user is folded into that
    /// user's outcome and never aborts the batch; carries no state
    /// between runs. Returns the number of outcomes delivered.
    pub async fn run_batch(&self, day: NaiveDate, days_ago: u32) -> usize {
        let configs = match self.store.enumerate_active().await {
            Ok(configs) => configs,
            Err(err) => {
                error!(error = %err, "failed to enumerate configurations");
                return 0;
            }
        };
        info!(%day, users = configs.len(), "reconciliation batch starting");

        let mut delivered = 0;
        for config in configs {
            let outcome = self.reconciler.reconcile(&config, day, days_ago).await;
            let record = UserOutcome {
                user_id: config.user_id.clone(),
                guild_id: config.guild_id.clone(),
                day,
                outcome,
            };
            if let Err(err) = self.sink.deliver(&record).await {
                error!(user_id = %record.user_id, error = %err, "result sink delivery failed");
            }
            delivered += 1;
        }
        info!(%day, delivered, "reconciliation batch finished");
        delivered
    }
}
