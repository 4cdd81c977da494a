use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};

use super::{field_parsing::parse_field_with_fallback, timestamp::iso_millis};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub dietary_restrictions: Vec<String>,
    pub serving_size: u32,
    pub theme: Theme,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dietary_restrictions: Vec::new(),
            serving_size: 2,
            theme: Theme::Light,
        }
    }
}

/// The `users` document for one identity.
///
/// `is_premium` is a cache of the subscription predicate and may be stale
/// until the next reconciliation. Every field tolerates absence so that
/// documents written by older clients still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(
        default,
        with = "iso_millis::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub premium_since: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium_doc_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_subscription_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_customer_id: Option<String>,
    // Application payload, schema owned by the recipe features.
    #[serde(default)]
    pub saved_recipes: Vec<Value>,
    #[serde(default)]
    pub meal_plans: Vec<Value>,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(
        default,
        with = "iso_millis::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_verified: Option<DateTime<Utc>>,
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

impl UserRecord {
    /// Record written at registration: not premium, default preferences.
    pub fn registered(username: &str, normalized_email: &str, now: DateTime<Utc>) -> Self {
        Self {
            username: username.to_string(),
            email: Some(normalized_email.to_string()),
            is_premium: false,
            premium_since: None,
            premium_doc_id: None,
            stripe_session_id: None,
            stripe_subscription_active: None,
            stripe_customer_id: None,
            saved_recipes: Vec::new(),
            meal_plans: Vec::new(),
            preferences: Preferences::default(),
            last_verified: None,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Decodes a stored `users` document field by field. A field that does
    /// not decode falls back to its default, so a bad payload field never
    /// hides the email or the premium flag.
    pub fn from_stored(id: &str, doc: &Map<String, Value>) -> Self {
        Self {
            username: parse_field_with_fallback(doc, "username", "users", id),
            email: parse_field_with_fallback(doc, "email", "users", id),
            is_premium: parse_field_with_fallback(doc, "isPremium", "users", id),
            premium_since: parse_field_with_fallback(doc, "premiumSince", "users", id),
            premium_doc_id: parse_field_with_fallback(doc, "premiumDocId", "users", id),
            stripe_session_id: parse_field_with_fallback(doc, "stripeSessionId", "users", id),
            stripe_subscription_active: parse_field_with_fallback(
                doc,
                "stripeSubscriptionActive",
                "users",
                id,
            ),
            stripe_customer_id: parse_field_with_fallback(doc, "stripeCustomerId", "users", id),
            saved_recipes: parse_field_with_fallback(doc, "savedRecipes", "users", id),
            meal_plans: parse_field_with_fallback(doc, "mealPlans", "users", id),
            preferences: parse_field_with_fallback(doc, "preferences", "users", id),
            last_verified: parse_field_with_fallback(doc, "lastVerified", "users", id),
            created_at: parse_field_with_fallback(doc, "createdAt", "users", id),
            updated_at: parse_field_with_fallback(doc, "updatedAt", "users", id),
        }
    }

    /// The stored email, or `None` when it is absent or blank.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.trim().is_empty())
    }
}

/// Fields a caller may change through a generic update. The cached premium
/// fields are deliberately absent: only reconciliation and grants write them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_recipes: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_plans: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_customer_id: Option<String>,
}
