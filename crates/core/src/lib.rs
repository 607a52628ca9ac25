//! Torp TCG Core - Shared types library.
//!
//! This crate provides common types used across all Torp TCG components:
//! - `storefront` - Headless storefront service (inventory, catalog, checkout)
//! - `integration-tests` - End-to-end tests against a mock document store
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, stock counts, prices,
//!   categories, and the client basket payload

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
