use std::fs::File;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::identity::IdentityToolkitClient,
    application::ports::{document_store::DocumentStore, identity_provider::IdentityProvider},
    infra::{config::AppConfig, error::InfraError, postgres_document_store},
    use_cases::{account::AccountUseCases, premium::PremiumUseCases},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub premium_use_cases: Arc<PremiumUseCases>,
    pub account_use_cases: Arc<AccountUseCases>,
}

pub async fn init_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn DocumentStore> = Arc::new(
        postgres_document_store(&config.database_url, config.database_max_connections).await?,
    );
    let identity: Arc<dyn IdentityProvider> = Arc::new(IdentityToolkitClient::new(
        config.identity_base_url.clone(),
        config.identity_api_key.clone(),
    ));

    let premium_use_cases = PremiumUseCases::new(store.clone(), identity.clone());
    let account_use_cases = AccountUseCases::new(identity, store, premium_use_cases.clone());

    Ok(AppState {
        config: Arc::new(config),
        premium_use_cases: Arc::new(premium_use_cases),
        account_use_cases: Arc::new(account_use_cases),
    })
}

/// Console logs always; structured JSON logs too when `log_file` is set.
pub fn init_tracing(log_file: Option<&str>) -> Result<(), InfraError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "premium_sync=info,sqlx=warn".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs)
    let json_layer = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(|source| InfraError::LogFile {
                path: path.to_string(),
                source,
            })?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(file)
                    .with_current_span(true)
                    .with_span_list(true)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();

    Ok(())
}
