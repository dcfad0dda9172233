//! cart-server HTTP Server
//!
//! Axum-based service exposing one session's course cart and the checkout
//! flow against an external payment gateway.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cart_checkout::{CheckoutConfig, CheckoutOrchestrator};
use cart_core::{CartStore, FileCartStorage};
use cart_payments::{CallbackVerifier, HttpPaymentGateway, PaymentGateway};

use crate::handlers::{
    add_course, add_item, checkout_status, clear_cart, get_cart, health_check, offer_totals, payment_callback,
    payment_return, remove_item, submit_checkout, update_quantity, validate_customer,
};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Payment gateway
    let gateway: Arc<dyn PaymentGateway> = Arc::new(HttpPaymentGateway::from_env()?);
    let checkout = CheckoutOrchestrator::new(gateway, CheckoutConfig::from_env()?);
    tracing::info!(
        return_url = %checkout.config().return_url(),
        callback_url = %checkout.config().callback_url(),
        "✓ Checkout configured"
    );

    let callbacks = CallbackVerifier::from_env();
    if callbacks.is_some() {
        tracing::info!("✓ Payment callbacks enabled");
    } else {
        tracing::warn!("⚠ PAYMENT_CALLBACK_SECRET not set - callbacks will be rejected");
    }

    // Cart storage
    let dir = std::env::var("CART_STORAGE_DIR").unwrap_or_else(|_| ".cart".into());
    let key = std::env::var("CART_STORAGE_KEY").unwrap_or_else(|_| cart_core::DEFAULT_CART_KEY.into());
    let cart = CartStore::open_with_key(FileCartStorage::new(&dir), key);
    tracing::info!(dir = %dir, items = cart.item_count(), "✓ Cart loaded");

    let app = router(AppState::new(cart, checkout, callbacks));

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🛒 cart-server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health_check))
        // Cart
        .route("/api/cart", get(get_cart).delete(clear_cart))
        .route("/api/cart/items", post(add_item))
        .route("/api/cart/items/{course_id}", put(update_quantity).delete(remove_item))
        .route("/api/cart/courses", post(add_course))
        .route("/api/offers/totals", post(offer_totals))
        // Checkout
        .route("/api/checkout/validate", post(validate_customer))
        .route("/api/checkout", post(submit_checkout))
        .route("/api/checkout/status", get(checkout_status))
        // Payment confirmation
        .route("/checkout/return", get(payment_return))
        .route("/api/payments/callback", post(payment_callback))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
