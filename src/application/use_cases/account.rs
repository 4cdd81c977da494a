use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::{
            document_store::{DocumentStore, to_document},
            identity_provider::{Identity, IdentityProvider, ProviderError, codes},
        },
        use_cases::premium::PremiumUseCases,
        validators::{is_valid_email, normalize_email},
    },
    domain::entities::{
        collection::Collection,
        timestamp::to_iso,
        user_record::{UserRecord, UserRecordPatch},
    },
};

/// Registration and session operations. Each successful registration or
/// sign-in is followed by a best-effort premium reconciliation.
#[derive(Clone)]
pub struct AccountUseCases {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    premium: PremiumUseCases,
}

impl AccountUseCases {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
        premium: PremiumUseCases,
    ) -> Self {
        Self {
            identity,
            store,
            premium,
        }
    }

    #[instrument(skip(self, password))]
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> AppResult<Identity> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(AppError::InvalidInput("Invalid email address".into()));
        }
        if password.is_empty() {
            return Err(AppError::InvalidInput("Password is required".into()));
        }

        let identity = self
            .identity
            .register(email, password)
            .await
            .map_err(map_register_error)?;
        self.identity.set_display_name(&identity, username).await?;

        let record = UserRecord::registered(username, &normalize_email(email), Utc::now());
        self.store
            .set(Collection::Users, &identity.user_id, to_document(&record)?)
            .await?;

        info!(user_id = %identity.user_id, "User registered");

        if let Err(e) = self
            .premium
            .try_verify_premium_status(&identity.user_id)
            .await
        {
            warn!(user_id = %identity.user_id, error = %e, "Error during initial premium verification");
        }

        Ok(identity)
    }

    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity> {
        let identity = self
            .identity
            .sign_in(email, password)
            .await
            .map_err(map_sign_in_error)?;

        if let Err(e) = self
            .premium
            .try_verify_premium_status(&identity.user_id)
            .await
        {
            warn!(user_id = %identity.user_id, error = %e, "Error during sign-in premium verification");
        }

        Ok(identity)
    }

    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> AppResult<()> {
        self.identity.sign_out().await?;
        Ok(())
    }

    /// Merges the supplied fields into the user record and bumps `updatedAt`.
    #[instrument(skip(self, patch))]
    pub async fn update_user_data(&self, user_id: &str, patch: &UserRecordPatch) -> AppResult<()> {
        let mut doc = to_document(patch)?;
        doc.insert("updatedAt".into(), json!(to_iso(Utc::now())));
        self.store.update(Collection::Users, user_id, doc).await
    }
}

fn map_register_error(err: ProviderError) -> AppError {
    if err.is(codes::EMAIL_ALREADY_IN_USE) {
        AppError::EmailAlreadyInUse
    } else {
        AppError::Identity(err)
    }
}

fn map_sign_in_error(err: ProviderError) -> AppError {
    if err.is(codes::INVALID_CREDENTIAL) {
        AppError::InvalidLogin
    } else {
        AppError::Identity(err)
    }
}
