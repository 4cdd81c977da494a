use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp::iso_millis;

/// Billing status for one email, written by grants and billing events.
///
/// Joined to users by normalized `email`, not by identity id; `user_id` is
/// only a back-reference filled in when a signed-in user is granted premium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub stripe_subscription_active: bool,
    #[serde(
        default,
        with = "iso_millis::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "iso_millis::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SubscriptionRecord {
    pub fn granted(normalized_email: &str, user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            email: normalized_email.to_string(),
            user_id: Some(user_id.to_string()),
            active: true,
            stripe_subscription_active: true,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Both flags must be set for the record to confer premium.
    pub fn grants_premium(&self) -> bool {
        self.active && self.stripe_subscription_active
    }
}
