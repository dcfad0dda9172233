//! # cart-checkout
//!
//! Turns a cart and a customer form into a hosted payment session.
//!
//! ## Flow
//!
//! ```text
//! CustomerInfo ──▶ validate() ──┐
//!                               ▼
//! Cart ──▶ compute_totals() ──▶ Order ──▶ PaymentRequest ──▶ PaymentGateway
//!                                                                 │
//!                         Redirect { payment_url } ◀──────────────┘
//! ```
//!
//! Money is `rust_decimal::Decimal` throughout. Tax is kept unrounded and the
//! total is rounded to cents once, half away from zero.

pub mod config;
pub mod customer;
pub mod error;
pub mod orchestrator;
pub mod pricing;

#[cfg(test)]
mod test_support;

pub use config::{CheckoutConfig, PricingRules};
pub use customer::{is_valid_email, validate, CustomerField, CustomerInfo, ValidationErrors};
pub use error::{CheckoutError, Result};
pub use orchestrator::{CheckoutOrchestrator, CheckoutPhase, CheckoutStatus, Redirect};
pub use pricing::{compute_totals, Order, OrderTotals};
