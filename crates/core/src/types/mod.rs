//! Core types for the coupon migrator.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod discount;
pub mod id;
pub mod status;

pub use credential::Credentials;
pub use discount::DiscountType;
pub use id::*;
pub use status::*;
