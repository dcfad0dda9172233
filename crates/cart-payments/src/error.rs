//! Payment Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// How a gateway call failed, kept on failed sessions for diagnostics
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeout, DNS, connection refused
    Transport,
    /// Non-2xx response or `success: false`
    Gateway,
    /// Body could not be understood
    MalformedResponse,
    /// Request rejected before sending
    InvalidRequest,
}

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Network failure reaching the gateway
    #[error("Transport error: {0}")]
    Transport(String),

    /// Gateway answered with a failure
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Gateway answered with a body we could not parse
    #[error("Malformed gateway response: {0}")]
    MalformedResponse(String),

    /// Payment request missing required data
    #[error("Invalid payment request: {0}")]
    InvalidRequest(String),

    /// Callback signature verification failed
    #[error("Callback signature invalid: {0}")]
    CallbackSignature(String),

    /// Callback payload parsing failed
    #[error("Callback parse error: {0}")]
    CallbackParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PaymentError {
    /// Diagnostic code for structured logs
    pub fn code(&self) -> &'static str {
        match self {
            PaymentError::Transport(_) => "TRANSPORT_ERROR",
            PaymentError::Gateway(_) => "GATEWAY_ERROR",
            PaymentError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            PaymentError::InvalidRequest(_) => "INVALID_PAYMENT_REQUEST",
            PaymentError::CallbackSignature(_) => "INVALID_SIGNATURE",
            PaymentError::CallbackParse(_) => "CALLBACK_PARSE_ERROR",
            PaymentError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentError::Transport(_) | PaymentError::Gateway(_) | PaymentError::MalformedResponse(_)
        )
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            PaymentError::Transport(_) | PaymentError::Gateway(_) | PaymentError::MalformedResponse(_) => {
                "Payment could not be started. Please try again."
            }
            PaymentError::InvalidRequest(_) => "Some payment details are missing.",
            PaymentError::Config(_) => "Service configuration error.",
            _ => "An error occurred processing your request.",
        }
    }

    pub fn failure_kind(&self) -> FailureKind {
        match self {
            PaymentError::Transport(_) => FailureKind::Transport,
            PaymentError::MalformedResponse(_) | PaymentError::CallbackParse(_) => {
                FailureKind::MalformedResponse
            }
            PaymentError::InvalidRequest(_) | PaymentError::Config(_) => FailureKind::InvalidRequest,
            PaymentError::Gateway(_) | PaymentError::CallbackSignature(_) => FailureKind::Gateway,
        }
    }

    pub(crate) fn transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            PaymentError::Transport("request to payment gateway timed out".into())
        } else {
            PaymentError::Transport(err.to_string())
        }
    }
}
