//! Core types for Torp TCG.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod basket;
pub mod category;
pub mod id;
pub mod price;
pub mod stock;

pub use basket::{Basket, BasketEntry};
pub use category::Category;
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use stock::Stock;
