//! Application State

use std::sync::Arc;

use tokio::sync::RwLock;

use cart_checkout::CheckoutOrchestrator;
use cart_core::CartStore;
use cart_payments::CallbackVerifier;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The session's cart; never locked across a gateway call
    pub cart: Arc<RwLock<CartStore>>,

    pub checkout: Arc<CheckoutOrchestrator>,

    /// Callback verifier (optional - None if no secret configured)
    pub callbacks: Option<Arc<CallbackVerifier>>,
}

impl AppState {
    pub fn new(cart: CartStore, checkout: CheckoutOrchestrator, callbacks: Option<CallbackVerifier>) -> Self {
        Self {
            cart: Arc::new(RwLock::new(cart)),
            checkout: Arc::new(checkout),
            callbacks: callbacks.map(Arc::new),
        }
    }
}
