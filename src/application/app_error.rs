use thiserror::Error;

use crate::application::ports::identity_provider::ProviderError;

/// Failures raised to the caller. Each variant maps to a stable [`ErrorCode`]
/// so callers can branch without inspecting provider-specific codes.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Email address is already registered")]
    EmailAlreadyInUse,

    #[error("Invalid email or password")]
    InvalidLogin,

    #[error("No authenticated user found")]
    NoSession,

    #[error("Not found")]
    NotFound,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Identity provider error: {0}")]
    Identity(#[from] ProviderError),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    DatabaseError,
    EmailAlreadyInUse,
    InvalidLogin,
    NoSession,
    NotFound,
    InvalidInput,
    IdentityError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DatabaseError => "database-error",
            ErrorCode::EmailAlreadyInUse => "email-already-in-use",
            ErrorCode::InvalidLogin => "invalid-login",
            ErrorCode::NoSession => "no-session",
            ErrorCode::NotFound => "not-found",
            ErrorCode::InvalidInput => "invalid-input",
            ErrorCode::IdentityError => "identity-error",
            ErrorCode::InternalError => "internal-error",
        }
    }
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::EmailAlreadyInUse => ErrorCode::EmailAlreadyInUse,
            AppError::InvalidLogin => ErrorCode::InvalidLogin,
            AppError::NoSession => ErrorCode::NoSession,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::Identity(_) => ErrorCode::IdentityError,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Failures of a reconciliation run. These are logged by whoever triggered the
/// run and never abort the enclosing operation.
#[derive(Error, Debug)]
pub enum AdvisoryError {
    #[error("User not found")]
    UserNotFound,

    #[error("User email not found")]
    EmailMissing,

    #[error(transparent)]
    Store(#[from] AppError),
}
