//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::{DateTime, TimeZone, Utc};

use crate::domain::entities::{
    subscription_record::SubscriptionRecord, user_record::UserRecord,
};

/// Fixed timestamp so stale values are easy to tell apart from fresh writes.
pub fn test_datetime() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
}

/// Create a test user record with sensible defaults.
pub fn create_test_user(overrides: impl FnOnce(&mut UserRecord)) -> UserRecord {
    let mut user = UserRecord::registered("chef", "chef@example.com", test_datetime());
    overrides(&mut user);
    user
}

/// Create a fully active subscription record for `email`.
pub fn create_test_subscription(
    email: &str,
    overrides: impl FnOnce(&mut SubscriptionRecord),
) -> SubscriptionRecord {
    let mut record = SubscriptionRecord {
        email: email.to_string(),
        user_id: None,
        active: true,
        stripe_subscription_active: true,
        created_at: Some(test_datetime()),
        updated_at: Some(test_datetime()),
    };
    overrides(&mut record);
    record
}
