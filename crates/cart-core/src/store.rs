//! Cart Store
//!
//! Single source of truth for the cart contents of one client session.
//! Persists the full cart after every mutation and rehydrates on open.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::Result;
use crate::model::{Cart, CartLine, CartLineInput, Course};
use crate::offer::OfferChoice;
use crate::storage::CartStorage;

/// Record key used when none is configured
pub const DEFAULT_CART_KEY: &str = "cart";

/// Derived cart state published to subscribers after every mutation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub item_count: u32,
    pub line_count: usize,
    pub total_price: Decimal,
}

impl CartSummary {
    fn of(cart: &Cart) -> Self {
        Self {
            item_count: cart.item_count(),
            line_count: cart.line_count(),
            total_price: cart.total_price(),
        }
    }
}

/// Owned cart store, injected into whatever needs the cart
pub struct CartStore {
    cart: Cart,
    storage: Box<dyn CartStorage>,
    key: String,
    notifier: watch::Sender<CartSummary>,
}

impl CartStore {
    /// Open the store, rehydrating from the default record key
    pub fn open(storage: impl CartStorage + 'static) -> Self {
        Self::open_with_key(storage, DEFAULT_CART_KEY)
    }

    /// Open the store using a specific record key.
    ///
    /// Never fails: an unreadable or malformed record is discarded and the
    /// cart starts empty.
    pub fn open_with_key(storage: impl CartStorage + 'static, key: impl Into<String>) -> Self {
        let storage: Box<dyn CartStorage> = Box::new(storage);
        let key = key.into();
        let cart = rehydrate(storage.as_ref(), &key);

        tracing::debug!(
            key = %key,
            lines = cart.line_count(),
            items = cart.item_count(),
            "Opened cart store"
        );

        let (notifier, _) = watch::channel(CartSummary::of(&cart));
        Self {
            cart,
            storage,
            key,
            notifier,
        }
    }

    /// Add one unit of a course (appends a new line or bumps the quantity)
    pub fn add_item(&mut self, line: CartLineInput) {
        let course_id = line.course_id.clone();
        let quantity = self.cart.add(line);
        tracing::debug!(course_id = %course_id, quantity, "Added item to cart");
        self.commit();
    }

    /// Add a course according to the user's offer choice
    pub fn add_course(&mut self, course: &Course, choice: OfferChoice) {
        let lines = course.cart_lines(choice);
        tracing::info!(
            course_id = %course.id,
            choice = ?choice,
            lines = lines.len(),
            "Adding course to cart"
        );
        for line in lines {
            self.add_item(line);
        }
    }

    /// Remove a line; absent ids are a no-op
    pub fn remove_item(&mut self, course_id: &str) {
        if self.cart.remove(course_id) {
            tracing::debug!(course_id = %course_id, "Removed item from cart");
        }
        self.commit();
    }

    /// Set an absolute quantity; `<= 0` removes the line
    pub fn update_quantity(&mut self, course_id: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(course_id);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if self.cart.set_quantity(course_id, quantity) {
            tracing::debug!(course_id = %course_id, quantity, "Updated cart quantity");
        }
        self.commit();
    }

    /// Empty the cart
    pub fn clear(&mut self) {
        self.cart.clear();
        tracing::info!("Cleared cart");
        self.commit();
    }

    /// Sum of `unit_discount_price × quantity`
    pub fn total_price(&self) -> Decimal {
        self.cart.total_price()
    }

    /// Sum of quantities
    pub fn item_count(&self) -> u32 {
        self.cart.item_count()
    }

    pub fn is_in_cart(&self, course_id: &str) -> bool {
        self.cart.contains(course_id)
    }

    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    pub fn lines(&self) -> &[CartLine] {
        self.cart.lines()
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Owned copy for readers that must not hold the store
    pub fn snapshot(&self) -> Cart {
        self.cart.clone()
    }

    pub fn summary(&self) -> CartSummary {
        CartSummary::of(&self.cart)
    }

    /// Change notifications; the receiver always sees the latest summary
    pub fn subscribe(&self) -> watch::Receiver<CartSummary> {
        self.notifier.subscribe()
    }

    fn commit(&self) {
        if let Err(e) = self.persist() {
            tracing::warn!(
                code = e.code(),
                error = %e,
                key = %self.key,
                "Failed to persist cart; continuing with in-memory state"
            );
        }
        self.notifier.send_replace(self.summary());
    }

    fn persist(&self) -> Result<()> {
        let record = serde_json::to_string(&self.cart)?;
        self.storage.save(&self.key, &record)
    }
}

fn rehydrate(storage: &dyn CartStorage, key: &str) -> Cart {
    let raw = match storage.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Cart::new(),
        Err(e) => {
            tracing::warn!(code = e.code(), error = %e, key = %key, "Failed to read persisted cart");
            discard(storage, key);
            return Cart::new();
        }
    };

    match serde_json::from_str::<Vec<CartLine>>(&raw) {
        Ok(lines) => Cart::from_lines(lines),
        Err(e) => {
            tracing::warn!(code = "STORAGE_CORRUPT", error = %e, key = %key, "Discarding malformed cart record");
            discard(storage, key);
            Cart::new()
        }
    }
}

fn discard(storage: &dyn CartStorage, key: &str) {
    if let Err(e) = storage.remove(key) {
        tracing::warn!(code = e.code(), error = %e, key = %key, "Failed to discard cart record");
    }
}
