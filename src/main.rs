use dotenvy::dotenv;
use tracing::info;

use premium_sync::infra::{
    config::AppConfig,
    reconcile_worker::run_reconcile_loop,
    setup::{init_app_state, init_tracing},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(config.log_file.as_deref())?;

    let reconcile_every = config.reconcile_interval;
    let app_state = init_app_state(config).await?;

    // Spawn premium reconciliation (after tracing is initialized)
    let premium_use_cases = app_state.premium_use_cases.clone();
    let worker = tokio::spawn(async move {
        run_reconcile_loop(premium_use_cases, reconcile_every).await;
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping reconciliation");
    worker.abort();

    Ok(())
}
