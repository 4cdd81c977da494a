//! Test utilities for use case tests.
//!
//! This module provides:
//! - In-memory implementations of the document store and identity provider ports
//! - Test data factories for creating valid fixtures

mod factories;
mod identity_mocks;
mod store_mocks;

pub use factories::*;
pub use identity_mocks::*;
pub use store_mocks::*;
