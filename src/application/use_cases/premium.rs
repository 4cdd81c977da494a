use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::{
    app_error::{AdvisoryError, AppError, AppResult},
    application::{
        ports::{
            document_store::{DocumentStore, Filter, patch, to_document},
            identity_provider::IdentityProvider,
        },
        validators::normalize_email,
    },
    domain::entities::{
        collection::Collection,
        subscription_record::SubscriptionRecord,
        timestamp::{iso_millis, to_iso},
        user_record::UserRecord,
    },
};

/// Outcome of a successful reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    pub is_premium: bool,
    pub last_verified: DateTime<Utc>,
}

/// Reconciliation outcome in reporting form: failures are carried in `error`
/// and always come with `is_premium = false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumStatus {
    pub is_premium: bool,
    #[serde(with = "iso_millis")]
    pub last_verified: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PremiumStatus {
    pub fn from_outcome(outcome: &Result<Verification, AdvisoryError>, now: DateTime<Utc>) -> Self {
        match outcome {
            Ok(v) => Self {
                is_premium: v.is_premium,
                last_verified: v.last_verified,
                error: None,
            },
            Err(e) => Self {
                is_premium: false,
                last_verified: now,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub checked: usize,
    pub premium: usize,
    pub changed: usize,
    pub skipped: usize,
}

/// Keeps `users.isPremium` in line with the `premiumUsers` collection.
///
/// A user is premium iff some subscription record with the same normalized
/// email has both `active` and `stripeSubscriptionActive` set. The flag on the
/// user record is only a cache of that predicate and is refreshed on demand.
#[derive(Clone)]
pub struct PremiumUseCases {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    sweep_page_size: usize,
}

const DEFAULT_SWEEP_PAGE_SIZE: usize = 200;

impl PremiumUseCases {
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            store,
            identity,
            sweep_page_size: DEFAULT_SWEEP_PAGE_SIZE,
        }
    }

    /// Number of user records [`Self::reconcile_all`] loads per store round trip.
    pub fn with_sweep_page_size(mut self, page_size: usize) -> Self {
        self.sweep_page_size = page_size.max(1);
        self
    }

    /// Recomputes the premium flag for `user_id` and writes it back.
    ///
    /// Never writes when the user record is missing or has no email.
    #[instrument(skip(self))]
    pub async fn try_verify_premium_status(
        &self,
        user_id: &str,
    ) -> Result<Verification, AdvisoryError> {
        let doc = self
            .store
            .get(Collection::Users, user_id)
            .await?
            .ok_or(AdvisoryError::UserNotFound)?;
        let user = UserRecord::from_stored(user_id, &doc);
        self.reconcile(user_id, &user).await
    }

    /// Same as [`Self::try_verify_premium_status`], folding failures into the
    /// returned status after logging them.
    pub async fn verify_premium_status(&self, user_id: &str) -> PremiumStatus {
        let outcome = self.try_verify_premium_status(user_id).await;
        if let Err(e) = &outcome {
            warn!(user_id = %user_id, error = %e, "Premium status verification failed");
        }
        PremiumStatus::from_outcome(&outcome, Utc::now())
    }

    /// Grants premium to the signed-in user, using `email` as the join key
    /// into `premiumUsers`.
    ///
    /// The user record's email is replaced by the normalized `email`, so the
    /// next reconciliation joins on the record that was just granted. Returns
    /// the id of the subscription record.
    #[instrument(skip(self))]
    pub async fn grant_premium(&self, email: &str) -> AppResult<String> {
        if email.trim().is_empty() {
            return Err(AppError::InvalidInput("Email is required".into()));
        }
        let normalized = normalize_email(email);

        let session = self.identity.current_session().ok_or(AppError::NoSession)?;
        let user_id = session.user_id;

        let doc = self
            .store
            .get(Collection::Users, &user_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let user = UserRecord::from_stored(&user_id, &doc);
        if let Some(stored) = user.email() {
            if normalize_email(stored) != normalized {
                warn!(
                    user_id = %user_id,
                    stored_email = %stored,
                    granted_email = %normalized,
                    "Granting premium under a different email; user email will be replaced"
                );
            }
        }

        let now = Utc::now();
        let ts = to_iso(now);

        let existing = self
            .store
            .query(
                Collection::PremiumUsers,
                &[Filter::eq_ignore_case("email", &normalized)],
            )
            .await?;

        let premium_doc_id = match existing.into_iter().next() {
            Some(found) => {
                self.store
                    .update(
                        Collection::PremiumUsers,
                        &found.id,
                        patch(json!({
                            "email": normalized,
                            "active": true,
                            "stripeSubscriptionActive": true,
                            "userId": user_id,
                            "updatedAt": ts,
                        })),
                    )
                    .await?;
                found.id
            }
            None => {
                let id = self.store.generate_id();
                let record = SubscriptionRecord::granted(&normalized, &user_id, now);
                self.store
                    .set(Collection::PremiumUsers, &id, to_document(&record)?)
                    .await?;
                id
            }
        };

        self.store
            .update(
                Collection::Users,
                &user_id,
                patch(json!({
                    "isPremium": true,
                    "premiumSince": ts,
                    "email": normalized,
                    "premiumDocId": premium_doc_id,
                    "stripeSubscriptionActive": true,
                    "updatedAt": ts,
                    "lastVerified": ts,
                })),
            )
            .await?;

        info!(user_id = %user_id, premium_doc_id = %premium_doc_id, "Premium granted");

        match self.try_verify_premium_status(&user_id).await {
            Ok(v) if v.is_premium => {}
            Ok(_) => warn!(user_id = %user_id, "Premium status verification failed after grant"),
            Err(e) => warn!(user_id = %user_id, error = %e, "Premium re-verification errored"),
        }

        Ok(premium_doc_id)
    }

    /// Deactivates every subscription record for `email` and reconciles the
    /// users joined to them. Returns how many records were deactivated.
    #[instrument(skip(self))]
    pub async fn revoke_premium(&self, email: &str) -> AppResult<usize> {
        if email.trim().is_empty() {
            return Err(AppError::InvalidInput("Email is required".into()));
        }
        let normalized = normalize_email(email);
        let by_email = [Filter::eq_ignore_case("email", &normalized)];

        let records = self
            .store
            .query(Collection::PremiumUsers, &by_email)
            .await?;
        let ts = to_iso(Utc::now());

        let mut affected_users = BTreeSet::new();
        for found in &records {
            self.store
                .update(
                    Collection::PremiumUsers,
                    &found.id,
                    patch(json!({
                        "active": false,
                        "stripeSubscriptionActive": false,
                        "updatedAt": ts,
                    })),
                )
                .await?;
            if let Some(user_id) = found.data.get("userId").and_then(Value::as_str) {
                affected_users.insert(user_id.to_string());
            }
        }

        for user in self.store.query(Collection::Users, &by_email).await? {
            affected_users.insert(user.id);
        }

        for user_id in &affected_users {
            if let Err(e) = self.try_verify_premium_status(user_id).await {
                warn!(user_id = %user_id, error = %e, "Reconciliation after revoke failed");
            }
        }

        info!(
            records = records.len(),
            users = affected_users.len(),
            "Premium revoked"
        );
        Ok(records.len())
    }

    /// Loads a user record, optionally reconciling the premium flag first.
    ///
    /// Reconciliation failures are logged and the stored record is returned
    /// as-is.
    #[instrument(skip(self))]
    pub async fn get_user_data(&self, user_id: &str, force_refresh: bool) -> AppResult<UserRecord> {
        let doc = self
            .store
            .get(Collection::Users, user_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let user = UserRecord::from_stored(user_id, &doc);

        if !force_refresh {
            return Ok(user);
        }

        let verification = match self.try_verify_premium_status(user_id).await {
            Ok(v) => v,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Error during premium verification");
                return Ok(user);
            }
        };

        if verification.is_premium == user.is_premium {
            return Ok(user);
        }

        let ts = to_iso(verification.last_verified);
        let persisted = self
            .store
            .update(
                Collection::Users,
                user_id,
                patch(json!({
                    "isPremium": verification.is_premium,
                    "lastVerified": ts,
                    "updatedAt": ts,
                })),
            )
            .await;
        if let Err(e) = persisted {
            warn!(user_id = %user_id, error = %e, "Failed to persist refreshed premium flag");
            return Ok(user);
        }

        Ok(UserRecord {
            is_premium: verification.is_premium,
            last_verified: Some(verification.last_verified),
            updated_at: Some(verification.last_verified),
            ..user
        })
    }

    /// Reconciles every user record, reading the collection in pages of
    /// `sweep_page_size`. Individual failures are counted as skipped and do
    /// not stop the sweep.
    #[instrument(skip(self))]
    pub async fn reconcile_all(&self) -> AppResult<ReconcileSummary> {
        let mut summary = ReconcileSummary::default();
        let mut after: Option<String> = None;

        loop {
            let page = self
                .store
                .page(Collection::Users, after.as_deref(), self.sweep_page_size)
                .await?;
            let page_len = page.len();

            for doc in page {
                summary.checked += 1;
                let user = UserRecord::from_stored(&doc.id, &doc.data);

                match self.reconcile(&doc.id, &user).await {
                    Ok(v) => {
                        if v.is_premium {
                            summary.premium += 1;
                        }
                        if v.is_premium != user.is_premium {
                            summary.changed += 1;
                        }
                    }
                    Err(AdvisoryError::EmailMissing) => {
                        debug!(user_id = %doc.id, "Skipping user without email");
                        summary.skipped += 1;
                    }
                    Err(e) => {
                        warn!(user_id = %doc.id, error = %e, "Reconciliation failed");
                        summary.skipped += 1;
                    }
                }
                after = Some(doc.id);
            }

            if page_len < self.sweep_page_size {
                break;
            }
        }

        Ok(summary)
    }

    async fn reconcile(
        &self,
        user_id: &str,
        user: &UserRecord,
    ) -> Result<Verification, AdvisoryError> {
        let email = user
            .email()
            .map(normalize_email)
            .ok_or(AdvisoryError::EmailMissing)?;

        let matches = self
            .store
            .query(
                Collection::PremiumUsers,
                &[
                    Filter::eq_ignore_case("email", &email),
                    Filter::eq("active", true),
                    Filter::eq("stripeSubscriptionActive", true),
                ],
            )
            .await?;
        let is_premium = !matches.is_empty();

        let now = Utc::now();
        let ts = to_iso(now);
        self.store
            .update(
                Collection::Users,
                user_id,
                patch(json!({
                    "isPremium": is_premium,
                    "lastVerified": ts,
                    "stripeSubscriptionActive": is_premium,
                    "updatedAt": ts,
                })),
            )
            .await?;

        debug!(user_id = %user_id, is_premium, "Premium status reconciled");
        Ok(Verification {
            is_premium,
            last_verified: now,
        })
    }
}
