//! Error Types for Checkout

use thiserror::Error;

use cart_payments::PaymentError;

use crate::customer::ValidationErrors;

pub type Result<T> = std::result::Result<T, CheckoutError>;

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("A submission is already in progress")]
    AlreadySubmitting,

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CheckoutError {
    /// Diagnostic code for logs and API responses
    pub fn code(&self) -> &'static str {
        match self {
            CheckoutError::Validation(_) => "VALIDATION_ERROR",
            CheckoutError::EmptyCart => "EMPTY_CART",
            CheckoutError::AlreadySubmitting => "ALREADY_SUBMITTING",
            CheckoutError::Gateway(_) => "GATEWAY_ERROR",
            CheckoutError::Transport(_) => "TRANSPORT_ERROR",
            CheckoutError::Payment(e) => e.code(),
            CheckoutError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Caught before any network call
    pub fn is_preflight(&self) -> bool {
        matches!(self, CheckoutError::Validation(_) | CheckoutError::EmptyCart)
    }

    /// Gateway and transport failures share one message
    pub fn user_message(&self) -> String {
        match self {
            CheckoutError::Validation(_) => "Please correct the highlighted fields.".into(),
            CheckoutError::EmptyCart => "Your cart is empty.".into(),
            CheckoutError::AlreadySubmitting => "Your order is already being submitted.".into(),
            CheckoutError::Gateway(_) | CheckoutError::Transport(_) => {
                "Payment could not be started. Please try again.".into()
            }
            CheckoutError::Payment(e) => e.user_message().into(),
            CheckoutError::Config(_) => "Service configuration error.".into(),
        }
    }
}
