//! In-memory implementation of the identity provider port.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::application::ports::identity_provider::{
    Identity, IdentityProvider, ProviderError, Session, codes,
};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    user_id: String,
    email: String,
    password: String,
    display_name: Option<String>,
}

impl Account {
    fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

/// In-memory implementation of IdentityProvider for testing.
///
/// Accounts are keyed by lowercased email, ids are `uid-1`, `uid-2`, ...
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
    session: Mutex<Option<Session>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signs in as `user_id` without an account, for tests that only need a session.
    pub fn with_session(user_id: &str, email: &str) -> Self {
        let provider = Self::default();
        *provider.session.lock().unwrap() = Some(Session {
            user_id: user_id.to_string(),
            email: email.to_string(),
        });
        provider
    }

    pub fn display_name(&self, user_id: &str) -> Option<String> {
        self.accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| a.user_id == user_id)
            .and_then(|a| a.display_name.clone())
    }

    fn start_session(&self, identity: &Identity) {
        *self.session.lock().unwrap() = Some(Session::from(identity));
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn register(&self, email: &str, password: &str) -> Result<Identity, ProviderError> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(ProviderError::new(
                codes::WEAK_PASSWORD,
                "Password should be at least 6 characters",
            ));
        }

        let identity = {
            let mut accounts = self.accounts.lock().unwrap();
            let key = email.to_lowercase();
            if accounts.contains_key(&key) {
                return Err(ProviderError::new(
                    codes::EMAIL_ALREADY_IN_USE,
                    "The email address is already in use by another account.",
                ));
            }
            let account = Account {
                user_id: format!("uid-{}", accounts.len() + 1),
                email: key.clone(),
                password: password.to_string(),
                display_name: None,
            };
            let identity = account.identity();
            accounts.insert(key, account);
            identity
        };

        self.start_session(&identity);
        Ok(identity)
    }

    async fn set_display_name(
        &self,
        identity: &Identity,
        name: &str,
    ) -> Result<(), ProviderError> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .values_mut()
            .find(|a| a.user_id == identity.user_id)
            .ok_or_else(|| ProviderError::new(codes::NO_CURRENT_USER, "unknown user"))?;
        account.display_name = Some(name.to_string());
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, ProviderError> {
        let identity = self
            .accounts
            .lock()
            .unwrap()
            .get(&email.to_lowercase())
            .filter(|a| a.password == password)
            .map(Account::identity)
            .ok_or_else(|| {
                ProviderError::new(codes::INVALID_CREDENTIAL, "invalid login credentials")
            })?;

        self.start_session(&identity);
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        *self.session.lock().unwrap() = None;
        Ok(())
    }

    fn current_session(&self) -> Option<Session> {
        self.session.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_starts_session() {
        let provider = InMemoryIdentityProvider::new();
        let identity = provider.register("Cook@Example.com", "secret1").await.unwrap();

        assert_eq!(identity.email, "cook@example.com");
        assert_eq!(
            provider.current_session().map(|s| s.user_id),
            Some(identity.user_id)
        );
    }

    #[tokio::test]
    async fn test_duplicate_registration_fails() {
        let provider = InMemoryIdentityProvider::new();
        provider.register("cook@example.com", "secret1").await.unwrap();

        let err = provider
            .register("COOK@example.com", "secret2")
            .await
            .unwrap_err();
        assert!(err.is(codes::EMAIL_ALREADY_IN_USE));
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password_fails() {
        let provider = InMemoryIdentityProvider::new();
        provider.register("cook@example.com", "secret1").await.unwrap();
        provider.sign_out().await.unwrap();

        let err = provider
            .sign_in("cook@example.com", "nope")
            .await
            .unwrap_err();
        assert!(err.is(codes::INVALID_CREDENTIAL));
        assert!(provider.current_session().is_none());
    }
}
