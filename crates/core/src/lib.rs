//! Coupon Migrator Core - Shared types library.
//!
//! This crate provides the types used by every coupon migrator component:
//! - `server` - HTTP service that talks to the BigCommerce API
//! - `cli` - Command-line wizard that drives the server
//!
//! # Architecture
//!
//! The core crate contains only types and text processing - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, credentials, discount and status enums
//! - [`vendor`] - BigCommerce V2/V3 resource shapes and request payloads
//! - [`coupon`] - The unified [`Coupon`] descriptor and its normalizers
//! - [`result`] - Per-item migration outcomes and error classification
//! - [`import`] / [`export`] - CSV and JSON file formats
//! - [`progress`] - Client-side aggregation of batch results and retry selection

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod coupon;
pub mod export;
pub mod import;
pub mod progress;
pub mod result;
pub mod types;
pub mod vendor;

pub use coupon::{Coupon, CouponInput};
pub use result::{BatchResult, CreatedRecord, DeletedKind, DeletedRecord, ErrorRecord, ItemState};
pub use types::*;
