//! # cart-payments
//!
//! Typed boundary to the external payment gateway used by course checkout.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐  create_payment  ┌─────────────────┐  redirect  ┌─────────────┐
//! │  Checkout   │─────────────────▶│  Gateway Hosted │───────────▶│  Storefront │
//! │             │                  │  Payment Page   │            │  (return)   │
//! └─────────────┘                  └─────────────────┘            └─────────────┘
//!        ▲                                  │ signed callback
//!        └──────── get_transaction ─────────┘
//! ```
//!
//! Gateway failures never escape as errors from `PaymentGateway`: a failed
//! call yields a `PaymentSession`/`TransactionLookup` with `success: false`
//! and a `FailureKind` telling transport problems apart from gateway ones.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cart_payments::{HttpPaymentGateway, PaymentGateway, PaymentRequest};
//!
//! let gateway = HttpPaymentGateway::from_env()?;
//! let session = gateway.create_payment(&request).await;
//!
//! // Redirect user to: session.redirect_url()
//! ```

mod checkout;
mod error;
mod gateway;
mod transaction;
mod webhook;

pub use checkout::{BillingAddress, PaymentCustomer, PaymentRequest, PaymentSession, ReturnUrls};
pub use error::{FailureKind, PaymentError, Result};
pub use gateway::{GatewayConfig, HttpPaymentGateway, PaymentGateway};
pub use transaction::{PaymentStatus, Transaction, TransactionLookup};
pub use webhook::{CallbackVerifier, PaymentCallback, SIGNATURE_HEADER};
