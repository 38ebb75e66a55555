//! Result sink seam.

use async_trait::async_trait;
use tracing::info;

use wa_core::UserOutcome;

/// Consumes one structured outcome per user after a pass.
///
/// The chat-platform notification layer implements this outside the
/// engine; a sink failure is logged by the caller and never fails the
/// batch.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn deliver(&self, outcome: &UserOutcome) -> anyhow::Result<()>;
}

/// Sink that writes outcomes to the log, used by the CLI.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl ResultSink for LogSink {
    async fn deliver(&self, outcome: &UserOutcome) -> anyhow::Result<()> {
        info!(
            user_id = %outcome.user_id,
            guild_id = %outcome.guild_id,
            day = %outcome.day,
            outcome = outcome.outcome.label(),
            "reconciliation outcome"
        );
        Ok(())
    }
}
