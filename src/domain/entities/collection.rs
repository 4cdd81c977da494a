use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Document collections this crate reads and writes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "camelCase")]
pub enum Collection {
    /// One [`UserRecord`](super::user_record::UserRecord) per identity id.
    Users,
    /// [`SubscriptionRecord`](super::subscription_record::SubscriptionRecord)s keyed by generated id.
    PremiumUsers,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}
