use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::use_cases::premium::PremiumUseCases;

/// Re-verifies every user's premium flag on a fixed interval, bounding how
/// stale the cached flag can get without a sign-in. Runs until the task is
/// dropped; a failed sweep is logged and retried on the next tick.
pub async fn run_reconcile_loop(premium_use_cases: Arc<PremiumUseCases>, every: Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        "Premium reconciliation started (sweeping every {}s)",
        every.as_secs()
    );

    loop {
        ticker.tick().await;

        match premium_use_cases.reconcile_all().await {
            Ok(summary) => {
                info!(
                    checked = summary.checked,
                    premium = summary.premium,
                    changed = summary.changed,
                    skipped = summary.skipped,
                    "Premium reconciliation sweep finished"
                );
            }
            Err(e) => {
                error!(error = %e, "Premium reconciliation sweep failed");
            }
        }
    }
}
