pub mod account;
pub mod premium;
