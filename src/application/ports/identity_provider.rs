use async_trait::async_trait;
use thiserror::Error;

/// Provider error codes the account use cases branch on.
pub mod codes {
    pub const EMAIL_ALREADY_IN_USE: &str = "auth/email-already-in-use";
    pub const INVALID_CREDENTIAL: &str = "auth/invalid-credential";
    pub const WEAK_PASSWORD: &str = "auth/weak-password";
    pub const INVALID_EMAIL: &str = "auth/invalid-email";
    pub const TOO_MANY_REQUESTS: &str = "auth/too-many-requests";
    pub const USER_DISABLED: &str = "auth/user-disabled";
    pub const NO_CURRENT_USER: &str = "auth/no-current-user";
    pub const NETWORK_REQUEST_FAILED: &str = "auth/network-request-failed";
    pub const INTERNAL_ERROR: &str = "auth/internal-error";
}

/// Error reported by an identity backend, identified by a provider code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// The currently signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
}

impl From<&Identity> for Session {
    fn from(identity: &Identity) -> Self {
        Self {
            user_id: identity.user_id.clone(),
            email: identity.email.clone(),
        }
    }
}

/// Email/password identity backend.
///
/// `register` and `sign_in` both leave the new identity as the current
/// session; `sign_out` clears it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn register(&self, email: &str, password: &str) -> Result<Identity, ProviderError>;
    async fn set_display_name(&self, identity: &Identity, name: &str)
    -> Result<(), ProviderError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, ProviderError>;
    async fn sign_out(&self) -> Result<(), ProviderError>;
    fn current_session(&self) -> Option<Session>;
}
