use std::time::Duration;

use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

use crate::{adapters::identity::identity_toolkit::DEFAULT_BASE_URL, infra::error::InfraError};

pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub identity_api_key: SecretString,
    /// Base of the identity REST API. Point it at a local emulator in development.
    pub identity_base_url: Url,
    /// How often the background sweep re-verifies every user's premium flag.
    pub reconcile_interval: Duration,
    /// Optional path for structured JSON logs next to the console output.
    pub log_file: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let database_url: String = get_env("DATABASE_URL");
        let database_max_connections: u32 = get_env_default("DATABASE_MAX_CONNECTIONS", 5);
        let identity_api_key = SecretString::new(get_env::<String>("IDENTITY_API_KEY").into());

        let raw_base_url: String =
            get_env_default("IDENTITY_BASE_URL", DEFAULT_BASE_URL.to_string());
        let identity_base_url =
            Url::parse(&raw_base_url).map_err(|source| InfraError::ConfigInvalid {
                var: "IDENTITY_BASE_URL",
                source,
            })?;

        let reconcile_interval_secs: u64 = get_env_default("RECONCILE_INTERVAL_SECS", 3600);
        let log_file: Option<String> = std::env::var("LOG_FILE")
            .ok()
            .filter(|path| !path.trim().is_empty());

        Ok(Self {
            database_url,
            database_max_connections,
            identity_api_key,
            identity_base_url,
            reconcile_interval: Duration::from_secs(reconcile_interval_secs.max(1)),
            log_file,
        })
    }
}
