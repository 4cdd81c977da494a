use thiserror::Error;

/// Infrastructure errors that can occur during startup.
///
/// Display messages are safe for logs. Debug output includes the #[source]
/// chain, which may contain connection strings; log with `%e`, not `?e`.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("Database connection failed. Check DATABASE_URL and ensure the database is running.")]
    DatabaseConnection(#[source] sqlx::Error),

    #[error("Schema setup failed")]
    Schema(#[source] sqlx::Error),

    #[error("Configuration error: {var} is invalid")]
    ConfigInvalid {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("Cannot open log file {path}")]
    LogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<sqlx::Error> for InfraError {
    fn from(e: sqlx::Error) -> Self {
        InfraError::DatabaseConnection(e)
    }
}
