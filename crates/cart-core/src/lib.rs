//! # cart-core
//!
//! Client-held course cart with durable persistence and bundle offer pricing.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         CartStore                             │
//! │  ┌─────────────┐   ┌──────────────┐   ┌───────────────────┐  │
//! │  │    Cart     │──▶│ CartStorage  │   │ watch::Sender     │  │
//! │  │ (in-memory) │   │ (port)       │   │ (CartSummary)     │  │
//! │  └─────────────┘   └──────────────┘   └───────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The in-memory cart is authoritative for the session. Every mutation is
//! followed by a full write of the cart record through `CartStorage`; write
//! failures are logged and otherwise ignored.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cart_core::{CartStore, FileCartStorage};
//!
//! let mut cart = CartStore::open(FileCartStorage::new(".cart"));
//! cart.add_item(line);
//! println!("{} items, {}", cart.item_count(), cart.total_price());
//! ```

pub mod error;
pub mod model;
pub mod offer;
pub mod storage;
pub mod store;

pub use error::{CartError, Result};
pub use model::{Cart, CartLine, CartLineInput, Course, IncludedCourse, Offer};
pub use offer::{compute_offer_totals, OfferChoice, OfferTotals};
pub use storage::{CartStorage, FileCartStorage, MemoryCartStorage};
pub use store::{CartStore, CartSummary, DEFAULT_CART_KEY};
