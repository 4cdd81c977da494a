pub mod collection;
pub mod field_parsing;
pub mod subscription_record;
pub mod timestamp;
pub mod user_record;
