//! Business logic services for storefront.
//!
//! # Services
//!
//! - `stripe` - Stripe Checkout Session client (REST, form-encoded)
//! - `checkout` - Server-side basket validation and line-item building

pub mod checkout;
pub mod stripe;
